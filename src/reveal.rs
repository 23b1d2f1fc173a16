//! Reveal engine: the "AI typing" animation, server side.
//!
//! There is no loop and no sleep. A `RevealClock` records when a level started
//! and at what pace it types; the cursor is computed from elapsed wall-clock
//! time whenever somebody asks. That makes the cursor monotonically
//! non-decreasing for free, and the kill-switch simply samples the cursor at
//! request time instead of racing an animation.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub struct RevealClock {
  started_at: Instant,
  interval: Duration,
  total_lines: usize,
}

impl RevealClock {
  /// Start typing `total_lines` lines, one every `interval`.
  /// A zero interval reveals everything immediately.
  pub fn start(total_lines: usize, interval: Duration, now: Instant) -> Self {
    Self { started_at: now, interval, total_lines }
  }

  /// Lines fully revealed at `now`, clamped to the line count.
  pub fn cursor_at(&self, now: Instant) -> usize {
    if self.interval.is_zero() {
      return self.total_lines;
    }
    let elapsed = now.saturating_duration_since(self.started_at);
    let ticks = (elapsed.as_millis() / self.interval.as_millis()) as usize;
    ticks.min(self.total_lines)
  }

  /// True once every line has been typed.
  pub fn complete_at(&self, now: Instant) -> bool {
    self.cursor_at(now) >= self.total_lines
  }

  pub fn total_lines(&self) -> usize {
    self.total_lines
  }
}

/// The first `cursor` whole lines of `code`, newline-joined.
/// This is what the front end renders in the terminal pane.
pub fn revealed_prefix(code: &str, cursor: usize) -> String {
  code
    .lines()
    .take(cursor)
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn clock(lines: usize, interval_ms: u64) -> (RevealClock, Instant) {
    let t0 = Instant::now();
    (RevealClock::start(lines, Duration::from_millis(interval_ms), t0), t0)
  }

  #[test]
  fn cursor_advances_one_line_per_interval() {
    let (c, t0) = clock(5, 100);
    assert_eq!(c.cursor_at(t0), 0);
    assert_eq!(c.cursor_at(t0 + Duration::from_millis(99)), 0);
    assert_eq!(c.cursor_at(t0 + Duration::from_millis(100)), 1);
    assert_eq!(c.cursor_at(t0 + Duration::from_millis(350)), 3);
  }

  #[test]
  fn cursor_never_exceeds_total_lines() {
    let (c, t0) = clock(3, 100);
    assert_eq!(c.cursor_at(t0 + Duration::from_secs(60)), 3);
    assert!(c.complete_at(t0 + Duration::from_millis(300)));
    assert!(!c.complete_at(t0 + Duration::from_millis(299)));
  }

  #[test]
  fn cursor_is_monotonic() {
    let (c, t0) = clock(10, 40);
    let mut last = 0;
    for ms in (0..2000).step_by(17) {
      let cur = c.cursor_at(t0 + Duration::from_millis(ms));
      assert!(cur >= last, "cursor went backwards at {}ms", ms);
      last = cur;
    }
  }

  #[test]
  fn zero_interval_reveals_everything() {
    let t0 = Instant::now();
    let c = RevealClock::start(4, Duration::ZERO, t0);
    assert_eq!(c.cursor_at(t0), 4);
  }

  #[test]
  fn prefix_takes_whole_lines() {
    let code = "line0\nline1\nline2";
    assert_eq!(revealed_prefix(code, 0), "");
    assert_eq!(revealed_prefix(code, 1), "line0");
    assert_eq!(revealed_prefix(code, 2), "line0\nline1");
    assert_eq!(revealed_prefix(code, 3), code);
    // Over-asking is clamped by `take`.
    assert_eq!(revealed_prefix(code, 9), code);
  }
}
