//! Application state: the challenge pool, live sessions, booth settings, and
//! the leaderboard (remote client + in-memory fallback).
//!
//! This module owns:
//!   - the read-only challenge pool (TOML bank or built-in seeds)
//!   - the session store (one entry per player at the booth)
//!   - runtime settings (reveal pace is admin-tunable)
//!   - the leaderboard policy: remote store when configured, local otherwise
//!
//! The pool is immutable after startup; sessions never see it change.

use std::{collections::HashMap, sync::Arc, time::Duration, time::Instant};
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_game_config_from_env, GameConfig, Settings};
use crate::domain::{Challenge, ChallengeSource};
use crate::leaderboard::{insert_ranked, Board, BoardEntry};
use crate::seeds::seed_challenges;
use crate::session::Session;
use crate::util::normalize_player_name;

// The fallback board only ever needs to answer "top N"; keep it small.
const LOCAL_BOARD_CAP: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<Vec<Challenge>>,
    pub sessions: Arc<RwLock<HashMap<String, Session>>>,
    pub settings: Arc<RwLock<Settings>>,
    pub board: Option<Board>,
    pub local_board: Arc<RwLock<Vec<BoardEntry>>>,
    admin_password: Option<String>,
}

impl AppState {
    /// Build state from env: load config, resolve the challenge pool, init
    /// the board client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg_opt = load_game_config_from_env();
        let settings = cfg_opt
            .as_ref()
            .map(|c| c.settings.clone())
            .unwrap_or_default();

        let pool = build_pool(cfg_opt.as_ref());

        let mut bank = 0usize;
        let mut seed = 0usize;
        for ch in &pool {
            match ch.source {
                ChallengeSource::LocalBank => bank += 1,
                ChallengeSource::Seed => seed += 1,
            }
        }
        info!(target: "killswitch_backend", local_bank = bank, seed = seed, "Startup challenge inventory");

        let board = Board::from_env();
        if let Some(b) = &board {
            info!(target: "leaderboard", base_url = %b.base_url, "Remote leaderboard enabled.");
        } else {
            info!(target: "leaderboard", "Remote leaderboard disabled (no KILLSWITCH_BOARD_URL). Scores stay in memory.");
        }

        let admin_password = settings.admin_password.clone();

        Self {
            pool: Arc::new(pool),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            settings: Arc::new(RwLock::new(settings)),
            board,
            local_board: Arc::new(RwLock::new(Vec::new())),
            admin_password,
        }
    }

    /// Create a session for `name` and return its id. The play order is a
    /// fresh shuffle of the pool, so two players at the booth rarely see the
    /// same sequence.
    #[instrument(level = "info", skip(self))]
    pub async fn create_session(&self, name: &str) -> String {
        let player = normalize_player_name(name);
        let mut order: Vec<usize> = (0..self.pool.len()).collect();
        order.shuffle(&mut rand::thread_rng());

        let (interval_ms, limit_s) = {
            let s = self.settings.read().await;
            (s.reveal_interval_ms, s.session_seconds)
        };
        let id = Uuid::new_v4().to_string();
        let session = Session::new(
            id.clone(),
            player.clone(),
            order,
            &self.pool,
            Duration::from_millis(interval_ms),
            Duration::from_secs(limit_s),
            Instant::now(),
        );
        self.sessions.write().await.insert(id.clone(), session);
        info!(target: "session", %id, %player, levels = self.pool.len(), "Session started");
        id
    }

    /// The reboot action: drop all state for this session.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn remove_session(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(target: "session", %id, "Session rebooted");
        }
        removed
    }

    /// Persist a final score. Remote store first when configured; any board
    /// failure degrades to the in-memory list and reports a notice for the
    /// finale screen.
    #[instrument(level = "info", skip(self), fields(%player, score))]
    pub async fn post_score(&self, player: &str, score: i32) -> Option<String> {
        if let Some(board) = &self.board {
            match board.submit(player, score).await {
                Ok(()) => return None,
                Err(e) => {
                    error!(target: "leaderboard", %player, error = %e, "Remote submit failed; keeping score locally");
                }
            }
        }
        let entry = BoardEntry { player: player.to_string(), score };
        insert_ranked(&mut *self.local_board.write().await, entry, LOCAL_BOARD_CAP);
        if self.board.is_some() {
            Some("Leaderboard service unavailable; score recorded locally.".into())
        } else {
            None
        }
    }

    /// Top rows for the finale screen, with a notice when the remote store
    /// could not be read.
    #[instrument(level = "info", skip(self))]
    pub async fn board_top(&self) -> (Vec<BoardEntry>, Option<String>) {
        let n = self.settings.read().await.board_top_n;
        if let Some(board) = &self.board {
            match board.top(n).await {
                Ok(rows) => return (rows, None),
                Err(e) => {
                    error!(target: "leaderboard", error = %e, "Remote top read failed; serving local rows");
                    let mut rows = self.local_board.read().await.clone();
                    rows.truncate(n);
                    return (rows, Some("Leaderboard service unavailable.".into()));
                }
            }
        }
        let mut rows = self.local_board.read().await.clone();
        rows.truncate(n);
        (rows, None)
    }

    /// Build a state around explicit parts, bypassing env and config files.
    #[cfg(test)]
    pub(crate) fn with_parts(pool: Vec<Challenge>, settings: Settings) -> Self {
        let admin_password = settings.admin_password.clone();
        Self {
            pool: Arc::new(pool),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            settings: Arc::new(RwLock::new(settings)),
            board: None,
            local_board: Arc::new(RwLock::new(Vec::new())),
            admin_password,
        }
    }

    /// Admin gate. A booth with no configured password has no admin panel.
    /// Wrong credentials are denied without detail.
    pub fn check_admin(&self, password: &str) -> bool {
        match &self.admin_password {
            Some(expected) => !expected.is_empty() && expected == password,
            None => false,
        }
    }

    /// Admin tunable: pace of the typing animation for new sessions.
    #[instrument(level = "info", skip(self))]
    pub async fn set_reveal_interval_ms(&self, ms: u64) {
        self.settings.write().await.reveal_interval_ms = ms;
        warn!(target: "killswitch_backend", ms, "Reveal interval changed by admin");
    }

    /// Admin destructive action: wipe the board (remote when configured,
    /// always the local fallback).
    #[instrument(level = "warn", skip(self))]
    pub async fn reset_board(&self) -> Option<String> {
        let mut notice = None;
        if let Some(board) = &self.board {
            if let Err(e) = board.reset().await {
                error!(target: "leaderboard", error = %e, "Remote reset failed");
                notice = Some("Remote leaderboard reset failed.".into());
            }
        }
        self.local_board.write().await.clear();
        notice
    }
}

/// Resolve the TOML bank into the runtime pool. Pure over its input so the
/// conversion rules are testable without touching the environment.
///
/// `threat_line` is a 0-based index; the threshold is the cursor at which
/// that line is fully revealed, so the conversion is `+1`, clamped to
/// `1..=lines`. Entries with no code are skipped. An empty or absent bank
/// falls back to the built-in seeds.
pub(crate) fn build_pool(cfg_opt: Option<&GameConfig>) -> Vec<Challenge> {
    let mut pool: Vec<Challenge> = Vec::new();
    if let Some(cfg) = cfg_opt {
        for cc in &cfg.challenges {
            let id = cc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            let lines = cc.code.lines().count();
            if lines == 0 {
                error!(target: "killswitch_backend", %id, "Skipping bank item: empty code.");
                continue;
            }
            let threshold = cc
                .threat_line
                .map(|i| i + 1)
                .unwrap_or(lines)
                .clamp(1, lines);
            pool.push(Challenge {
                id,
                title: cc.title.clone(),
                code: cc.code.clone(),
                is_threat: cc.is_threat,
                reveal_threshold: threshold,
                explanation: cc.explanation.clone(),
                difficulty: cc.difficulty.clone().unwrap_or_else(|| "booth".into()),
                source: ChallengeSource::LocalBank,
            });
        }
    }

    // No usable bank: fall back to the built-in seeds.
    if pool.is_empty() {
        pool = seed_challenges();
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_state() -> AppState {
        let settings = Settings {
            admin_password: Some("mellon".into()),
            ..Settings::default()
        };
        AppState::with_parts(seed_challenges(), settings)
    }

    fn bank(toml_src: &str) -> GameConfig {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn threat_line_converts_to_threshold() {
        let cfg = bank(
            r#"
            [[challenges]]
            title = "t"
            code = "a\nb\nc"
            is_threat = true
            threat_line = 1
            "#,
        );
        let pool = build_pool(Some(&cfg));
        assert_eq!(pool.len(), 1);
        // Line index 1 is fully revealed once the cursor reaches 2.
        assert_eq!(pool[0].reveal_threshold, 2);
        assert_eq!(pool[0].source, ChallengeSource::LocalBank);
    }

    #[test]
    fn omitted_threat_line_defaults_to_line_count() {
        let cfg = bank(
            r#"
            [[challenges]]
            title = "t"
            code = "a\nb\nc\nd"
            is_threat = true
            "#,
        );
        let pool = build_pool(Some(&cfg));
        assert_eq!(pool[0].reveal_threshold, 4);
    }

    #[test]
    fn out_of_range_threat_line_is_clamped() {
        let cfg = bank(
            r#"
            [[challenges]]
            title = "t"
            code = "a\nb"
            is_threat = true
            threat_line = 99
            "#,
        );
        let pool = build_pool(Some(&cfg));
        assert_eq!(pool[0].reveal_threshold, 2);
    }

    #[test]
    fn empty_code_entry_is_skipped() {
        let cfg = bank(
            r#"
            [[challenges]]
            title = "broken"
            is_threat = true

            [[challenges]]
            title = "ok"
            code = "a\nb"
            "#,
        );
        let pool = build_pool(Some(&cfg));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].title, "ok");
    }

    #[test]
    fn empty_bank_falls_back_to_seeds() {
        let cfg = bank(
            r#"
            [[challenges]]
            title = "broken"
            is_threat = true
            "#,
        );
        // The only entry is skipped, so the seeds take over.
        let pool = build_pool(Some(&cfg));
        assert!(pool.iter().all(|c| c.source == ChallengeSource::Seed));
        assert_eq!(pool.len(), seed_challenges().len());

        let pool = build_pool(None);
        assert_eq!(pool.len(), seed_challenges().len());
    }

    #[tokio::test]
    async fn create_and_remove_session() {
        let state = bare_state();
        let id = state.create_session("  Leia ").await;
        {
            let sessions = state.sessions.read().await;
            let s = sessions.get(&id).unwrap();
            assert_eq!(s.player, "Leia");
            assert_eq!(s.total_levels(), 3);
        }
        assert!(state.remove_session(&id).await);
        assert!(!state.remove_session(&id).await);
    }

    #[tokio::test]
    async fn local_board_serves_top_without_remote() {
        let state = bare_state();
        assert!(state.post_score("Han", 175).await.is_none());
        assert!(state.post_score("Lando", 25).await.is_none());
        let (rows, notice) = state.board_top().await;
        assert!(notice.is_none());
        assert_eq!(rows[0].player, "Han");
        assert_eq!(rows[1].player, "Lando");
    }

    #[tokio::test]
    async fn admin_gate_denies_wrong_or_missing_password() {
        let mut state = bare_state();
        assert!(state.check_admin("mellon"));
        assert!(!state.check_admin("friend"));
        state.admin_password = None;
        assert!(!state.check_admin("mellon"));
    }

    #[tokio::test]
    async fn reveal_interval_applies_to_new_sessions() {
        let state = bare_state();
        state.set_reveal_interval_ms(50).await;
        let id = state.create_session("Rey").await;
        let sessions = state.sessions.read().await;
        let s = sessions.get(&id).unwrap();
        assert_eq!(s.reveal_interval, Duration::from_millis(50));
    }
}
