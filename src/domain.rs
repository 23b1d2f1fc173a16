//! Domain models: challenges, player actions, and the judgment function that
//! turns a kill-switch press (or its absence) into a score delta.

use serde::{Deserialize, Serialize};

/// Where did we get the challenge from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeSource {
  LocalBank,   // from user-provided TOML bank
  Seed,  // built-in seeds (fallback when no config is present)
}

/// A code snippet the "AI" types out during one level.
///
/// `reveal_threshold` is the minimum reveal cursor (count of fully revealed
/// lines) at which the malicious content is visible. It is always resolved to
/// a concrete value in `1..=line count` at load time; for benign snippets the
/// judgment ignores it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: String,
  pub title: String,
  pub code: String,
  pub is_threat: bool,
  pub reveal_threshold: usize,
  pub explanation: String,
  pub difficulty: String,   // free-form (e.g., "easy", "booth", "expert")
  pub source: ChallengeSource,
}

impl Challenge {
  /// Number of lines the reveal engine will type for this snippet.
  pub fn line_count(&self) -> usize {
    self.code.lines().count()
  }
}

/// What ended the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAction {
  /// The player pressed the kill-switch at some reveal cursor.
  Stopped,
  /// The reveal ran to completion without a stop.
  RevealCompleted,
}

/// Outcome class for one resolved level.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  CorrectStop,
  TooEarly,
  FalseAlarm,
  Breach,
  HeldFire,
}

impl Outcome {
  /// Points awarded or removed for this outcome.
  pub fn delta(self) -> i32 {
    match self {
      Outcome::CorrectStop => 100,
      Outcome::TooEarly => -25,
      Outcome::FalseAlarm => -50,
      Outcome::Breach => -75,
      Outcome::HeldFire => 75,
    }
  }

  /// Short human-readable label shown next to the delta.
  pub fn label(self) -> &'static str {
    match self {
      Outcome::CorrectStop => "correct stop",
      Outcome::TooEarly => "too early",
      Outcome::FalseAlarm => "false alarm",
      Outcome::Breach => "breach",
      Outcome::HeldFire => "correctly held fire",
    }
  }
}

/// Judge a level. Pure function of the challenge metadata, the reveal cursor
/// sampled when the level ended, and how it ended.
pub fn judge(is_threat: bool, reveal_threshold: usize, cursor: usize, action: PlayerAction) -> Outcome {
  match (is_threat, action) {
    (true, PlayerAction::Stopped) => {
      if cursor >= reveal_threshold { Outcome::CorrectStop } else { Outcome::TooEarly }
    }
    (false, PlayerAction::Stopped) => Outcome::FalseAlarm,
    (true, PlayerAction::RevealCompleted) => Outcome::Breach,
    (false, PlayerAction::RevealCompleted) => Outcome::HeldFire,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn threat_stopped_after_threshold_is_correct_stop() {
    // 3-line snippet, dangerous content visible from cursor 1 onward.
    let out = judge(true, 1, 2, PlayerAction::Stopped);
    assert_eq!(out, Outcome::CorrectStop);
    assert_eq!(out.delta(), 100);
    assert_eq!(out.label(), "correct stop");
  }

  #[test]
  fn threat_stopped_before_threshold_is_too_early() {
    let out = judge(true, 3, 2, PlayerAction::Stopped);
    assert_eq!(out, Outcome::TooEarly);
    assert_eq!(out.delta(), -25);
  }

  #[test]
  fn threat_stopped_exactly_at_threshold_counts() {
    assert_eq!(judge(true, 2, 2, PlayerAction::Stopped), Outcome::CorrectStop);
  }

  #[test]
  fn benign_stopped_is_false_alarm_at_any_cursor() {
    let out = judge(false, 1, 0, PlayerAction::Stopped);
    assert_eq!(out, Outcome::FalseAlarm);
    assert_eq!(out.delta(), -50);
    assert_eq!(judge(false, 1, 7, PlayerAction::Stopped), Outcome::FalseAlarm);
  }

  #[test]
  fn threat_completed_is_breach() {
    let out = judge(true, 1, 3, PlayerAction::RevealCompleted);
    assert_eq!(out, Outcome::Breach);
    assert_eq!(out.delta(), -75);
    assert_eq!(out.label(), "breach");
  }

  #[test]
  fn benign_completed_is_held_fire() {
    let out = judge(false, 0, 4, PlayerAction::RevealCompleted);
    assert_eq!(out, Outcome::HeldFire);
    assert_eq!(out.delta(), 75);
    assert_eq!(out.label(), "correctly held fire");
  }

  #[test]
  fn line_count_matches_code() {
    let c = Challenge {
      id: "x".into(),
      title: "t".into(),
      code: "line0\nline1\nline2".into(),
      is_threat: true,
      reveal_threshold: 1,
      explanation: String::new(),
      difficulty: "booth".into(),
      source: ChallengeSource::Seed,
    };
    assert_eq!(c.line_count(), 3);
  }
}
