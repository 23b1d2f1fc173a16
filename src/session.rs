//! One player's run through the challenge pool.
//!
//! The session is an explicit state machine instead of a bag of globals:
//! every transition is a method that takes the current `Instant`, so the
//! handlers stay thin and the tests drive time by hand. Time-driven
//! transitions (reveal completed, session deadline) are observed in `tick`,
//! which every entry point calls first.

use std::time::{Duration, Instant};

use crate::domain::{judge, Challenge, Outcome, PlayerAction};
use crate::reveal::RevealClock;

/// Everything the UI needs to show about the level that just ended.
#[derive(Clone, Debug)]
pub struct LevelResult {
    pub outcome: Outcome,
    pub delta: i32,
    pub cursor: usize,
    pub title: String,
    pub explanation: String,
}

#[derive(Clone, Debug)]
pub enum Phase {
    /// The reveal clock is running; the kill-switch is armed.
    Playing(RevealClock),
    /// The level has been judged; waiting for the advance action.
    Resolved,
    /// Out of levels or out of time. Triggers the one leaderboard write.
    Finished,
}

pub struct Session {
    pub id: String,
    pub player: String,
    /// Indices into the shared pool, in play order (shuffled at creation).
    order: Vec<usize>,
    pub level: usize,
    pub score: i32,
    pub phase: Phase,
    pub last: Option<LevelResult>,
    pub reveal_interval: Duration,
    time_limit: Duration,
    started_at: Instant,
    /// Idempotency guard for the leaderboard write.
    pub posted: bool,
}

impl Session {
    pub fn new(
        id: String,
        player: String,
        order: Vec<usize>,
        pool: &[Challenge],
        reveal_interval: Duration,
        time_limit: Duration,
        now: Instant,
    ) -> Self {
        let phase = match order.first().and_then(|&i| pool.get(i)) {
            Some(ch) => Phase::Playing(RevealClock::start(ch.line_count(), reveal_interval, now)),
            None => Phase::Finished,
        };
        Self {
            id,
            player,
            order,
            level: 0,
            score: 0,
            phase,
            last: None,
            reveal_interval,
            time_limit,
            started_at: now,
            posted: false,
        }
    }

    pub fn total_levels(&self) -> usize {
        self.order.len()
    }

    pub fn current_challenge<'a>(&self, pool: &'a [Challenge]) -> Option<&'a Challenge> {
        self.order.get(self.level).and_then(|&i| pool.get(i))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.time_limit
            .saturating_sub(now.saturating_duration_since(self.started_at))
    }

    fn expired(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    /// Observe time-driven transitions. Called before every player action and
    /// before every view render.
    ///
    /// - A running reveal that has typed its last line resolves the level as
    ///   `RevealCompleted`.
    /// - A session past its deadline is forced to Finished. A pending level
    ///   whose reveal had completed is still judged; one that was mid-reveal
    ///   is abandoned with no delta.
    pub fn tick(&mut self, pool: &[Challenge], now: Instant) {
        let completed = match &self.phase {
            Phase::Playing(clock) if clock.complete_at(now) => Some(clock.total_lines()),
            _ => None,
        };
        if let Some(lines) = completed {
            self.resolve(pool, lines, PlayerAction::RevealCompleted);
        }
        if self.expired(now) && !self.is_finished() {
            self.phase = Phase::Finished;
        }
    }

    /// The kill-switch. Samples the reveal cursor at `now` and judges the
    /// level. Errors if there is nothing left to stop.
    pub fn stop(&mut self, pool: &[Challenge], now: Instant) -> Result<&LevelResult, String> {
        self.tick(pool, now);
        let cursor = match &self.phase {
            Phase::Playing(clock) => clock.cursor_at(now),
            Phase::Resolved => return Err("level already resolved".into()),
            Phase::Finished => return Err("session is finished".into()),
        };
        self.resolve(pool, cursor, PlayerAction::Stopped);
        self.last
            .as_ref()
            .ok_or_else(|| "challenge missing from pool".to_string())
    }

    /// Move to the next level, or to Finished after the last one.
    pub fn advance(&mut self, pool: &[Challenge], now: Instant) -> Result<(), String> {
        self.tick(pool, now);
        match self.phase {
            Phase::Resolved => {
                self.level += 1;
                self.phase = match self.current_challenge(pool) {
                    Some(ch) => Phase::Playing(RevealClock::start(
                        ch.line_count(),
                        self.reveal_interval,
                        now,
                    )),
                    None => Phase::Finished,
                };
                Ok(())
            }
            Phase::Playing(_) => Err("level still in progress".into()),
            Phase::Finished => Err("session is finished".into()),
        }
    }

    /// Judge the current level and apply its delta. The phase change to
    /// Resolved is what makes the delta single-shot: a resolved level can
    /// never be judged again.
    fn resolve(&mut self, pool: &[Challenge], cursor: usize, action: PlayerAction) {
        let Some(ch) = self.current_challenge(pool) else { return };
        let outcome = judge(ch.is_threat, ch.reveal_threshold, cursor, action);
        self.score += outcome.delta();
        self.last = Some(LevelResult {
            outcome,
            delta: outcome.delta(),
            cursor,
            title: ch.title.clone(),
            explanation: ch.explanation.clone(),
        });
        self.phase = Phase::Resolved;
    }
}
