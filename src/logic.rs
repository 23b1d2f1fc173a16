//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting sessions and building the per-request session view
//!   - The kill-switch, advance, and reboot actions
//!   - The one-shot leaderboard write when a session finishes
//!   - Admin actions (pace tuning, board reset)

use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::protocol::{to_view, SessionView};
use crate::reveal::revealed_prefix;
use crate::session::{Phase, Session};
use crate::state::AppState;

const ADMIN_DENIED: &str = "admin access denied";

/// Snapshot a session into its public view at `now`.
///
/// Playing levels expose only the revealed prefix; resolved levels show the
/// whole snippet so the explanation makes sense; finished sessions show no
/// code at all.
fn build_view(s: &Session, state: &AppState, now: Instant, board_notice: Option<String>) -> SessionView {
  let remaining = s.remaining(now).as_secs();
  match (&s.phase, s.current_challenge(&state.pool)) {
    (Phase::Playing(clock), Some(ch)) => {
      let cursor = clock.cursor_at(now);
      to_view(
        s,
        &ch.title,
        revealed_prefix(&ch.code, cursor),
        cursor,
        ch.line_count(),
        remaining,
        board_notice,
      )
    }
    (Phase::Resolved, Some(ch)) => to_view(
      s,
      &ch.title,
      ch.code.clone(),
      s.last.as_ref().map(|r| r.cursor).unwrap_or(0),
      ch.line_count(),
      remaining,
      board_notice,
    ),
    _ => to_view(s, "", String::new(), 0, 0, remaining, board_notice),
  }
}

/// Login: create a session and return its first view.
#[instrument(level = "info", skip(state))]
pub async fn start_session(state: &AppState, name: &str) -> (String, SessionView) {
  let id = state.create_session(name).await;
  let now = Instant::now();
  let sessions = state.sessions.read().await;
  // Just inserted under the same id.
  let view = sessions
    .get(&id)
    .map(|s| build_view(s, state, now, None))
    .unwrap_or_else(|| unreachable_view(&id));
  (id, view)
}

// create_session inserted the entry before releasing the write lock, so the
// read above cannot miss. This keeps the API total anyway.
fn unreachable_view(id: &str) -> SessionView {
  warn!(target: "session", %id, "session vanished between insert and first view");
  SessionView {
    session_id: id.to_string(),
    player: String::new(),
    level: 1,
    total_levels: 0,
    score: 0,
    phase: crate::protocol::PhaseOut::Finished,
    title: String::new(),
    revealed: String::new(),
    cursor: 0,
    total_lines: 0,
    remaining_seconds: 0,
    remaining_display: crate::util::fmt_mmss(0),
    last: None,
    board_notice: None,
  }
}

/// Claim the one leaderboard write for a freshly finished session. The
/// `posted` flag flips under the session lock, so whichever path observes the
/// finish first (the final advance or a view poll) performs the write and
/// every later observer skips it.
fn claim_finale_post(s: &mut Session) -> Option<(String, i32)> {
  if s.is_finished() && !s.posted {
    s.posted = true;
    Some((s.player.clone(), s.score))
  } else {
    None
  }
}

/// Perform a claimed write after the session lock is released.
async fn post_claimed(
  state: &AppState,
  session_id: &str,
  claimed: Option<(String, i32)>,
  view: &mut SessionView,
) {
  if let Some((player, score)) = claimed {
    info!(target: "session", %session_id, %player, score, "Session finished; posting score");
    view.board_notice = state.post_score(&player, score).await;
  }
}

/// Poll the session. This is where time-driven transitions are observed and
/// where a freshly finished session performs its single leaderboard write.
#[instrument(level = "debug", skip(state), fields(%session_id))]
pub async fn session_view(state: &AppState, session_id: &str) -> Result<SessionView, String> {
  let now = Instant::now();
  let (mut view, claimed) = {
    let mut sessions = state.sessions.write().await;
    let s = sessions
      .get_mut(session_id)
      .ok_or_else(|| format!("Unknown sessionId: {}", session_id))?;
    s.tick(&state.pool, now);
    let claimed = claim_finale_post(s);
    (build_view(s, state, now, None), claimed)
  };

  post_claimed(state, session_id, claimed, &mut view).await;
  Ok(view)
}

/// The kill-switch action.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn do_stop(state: &AppState, session_id: &str) -> Result<SessionView, String> {
  let now = Instant::now();
  let mut sessions = state.sessions.write().await;
  let s = sessions
    .get_mut(session_id)
    .ok_or_else(|| format!("Unknown sessionId: {}", session_id))?;
  let (outcome, delta, cursor) = {
    let res = s.stop(&state.pool, now)?;
    (res.outcome, res.delta, res.cursor)
  };
  info!(
    target: "session",
    %session_id,
    outcome = outcome.label(),
    delta,
    cursor,
    score = s.score,
    "Kill-switch resolved level"
  );
  Ok(build_view(s, state, now, None))
}

/// Move to the next level (or the finale). Advancing past the last level is
/// one of the two places a session can finish, so the leaderboard claim
/// happens here too rather than waiting for the next poll.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn do_advance(state: &AppState, session_id: &str) -> Result<SessionView, String> {
  let now = Instant::now();
  let (mut view, claimed) = {
    let mut sessions = state.sessions.write().await;
    let s = sessions
      .get_mut(session_id)
      .ok_or_else(|| format!("Unknown sessionId: {}", session_id))?;
    s.advance(&state.pool, now)?;
    info!(target: "session", %session_id, level = s.level + 1, "Advanced level");
    let claimed = claim_finale_post(s);
    (build_view(s, state, now, None), claimed)
  };

  post_claimed(state, session_id, claimed, &mut view).await;
  Ok(view)
}

/// Reboot: discard the session entirely.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn do_reboot(state: &AppState, session_id: &str) -> Result<(), String> {
  if state.remove_session(session_id).await {
    Ok(())
  } else {
    Err(format!("Unknown sessionId: {}", session_id))
  }
}

/// Admin: live-tune the typing pace for new sessions.
#[instrument(level = "info", skip(state, password))]
pub async fn admin_set_pace(state: &AppState, password: &str, ms: u64) -> Result<String, String> {
  if !state.check_admin(password) {
    return Err(ADMIN_DENIED.into());
  }
  state.set_reveal_interval_ms(ms).await;
  Ok(format!("Reveal interval set to {} ms", ms))
}

/// Admin: wipe the leaderboard.
#[instrument(level = "info", skip(state, password))]
pub async fn admin_reset_board(state: &AppState, password: &str) -> Result<String, String> {
  if !state.check_admin(password) {
    return Err(ADMIN_DENIED.into());
  }
  match state.reset_board().await {
    Some(notice) => Ok(notice),
    None => Ok("Leaderboard reset.".into()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::protocol::PhaseOut;

  fn quick_state(reveal_interval_ms: u64, session_seconds: u64) -> AppState {
    // No env/config involvement: build the state by hand around the seeds.
    let settings = crate::config::Settings {
      reveal_interval_ms,
      session_seconds,
      board_top_n: 5,
      admin_password: Some("mellon".into()),
    };
    AppState::with_parts(crate::seeds::seed_challenges(), settings)
  }

  #[tokio::test]
  async fn start_then_view_shows_playing_level() {
    let state = quick_state(500, 300);
    let (id, view) = start_session(&state, "Leia").await;
    assert_eq!(view.phase, PhaseOut::Playing);
    assert_eq!(view.level, 1);
    assert_eq!(view.score, 0);
    assert!(view.cursor <= view.total_lines);

    let again = session_view(&state, &id).await.unwrap();
    assert_eq!(again.player, "Leia");
  }

  #[tokio::test]
  async fn stop_resolves_and_second_stop_errors() {
    // Zero interval: everything is revealed immediately, so the first level
    // auto-resolves as unstopped on the first view.
    let state = quick_state(0, 300);
    let (id, _) = start_session(&state, "Han").await;
    let view = session_view(&state, &id).await.unwrap();
    assert_eq!(view.phase, PhaseOut::Resolved);
    assert!(view.last.is_some());

    let err = do_stop(&state, &id).await.unwrap_err();
    assert!(err.contains("already resolved"));
  }

  #[tokio::test]
  async fn finale_posts_score_exactly_once() {
    let state = quick_state(0, 300);
    let (id, _) = start_session(&state, "Rey").await;

    // Play through: each view auto-resolves (zero interval), then advance.
    for _ in 0..state.pool.len() {
      session_view(&state, &id).await.unwrap();
      do_advance(&state, &id).await.unwrap();
    }
    let finale = session_view(&state, &id).await.unwrap();
    assert_eq!(finale.phase, PhaseOut::Finished);

    // Render the finale a few more times; still one board row.
    session_view(&state, &id).await.unwrap();
    session_view(&state, &id).await.unwrap();
    let (rows, _) = state.board_top().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].player, "Rey");
  }

  #[tokio::test]
  async fn final_advance_posts_score_without_a_poll() {
    let state = quick_state(0, 300);
    let (id, _) = start_session(&state, "Poe").await;

    let mut finale = None;
    for _ in 0..state.pool.len() {
      session_view(&state, &id).await.unwrap();
      finale = Some(do_advance(&state, &id).await.unwrap());
    }

    // The last advance itself lands on the finale and writes the score; no
    // view poll has happened since.
    assert_eq!(finale.unwrap().phase, PhaseOut::Finished);
    let (rows, _) = state.board_top().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].player, "Poe");

    // A later finale render sees `posted` and does not double-write.
    session_view(&state, &id).await.unwrap();
    let (rows, _) = state.board_top().await;
    assert_eq!(rows.len(), 1);
  }

  #[tokio::test]
  async fn reboot_clears_the_session() {
    let state = quick_state(500, 300);
    let (id, _) = start_session(&state, "Finn").await;
    do_reboot(&state, &id).await.unwrap();
    assert!(session_view(&state, &id).await.is_err());

    // A fresh start begins at level 1 with score 0.
    let (_, view) = start_session(&state, "Finn").await;
    assert_eq!(view.level, 1);
    assert_eq!(view.score, 0);
  }

  #[tokio::test]
  async fn admin_actions_require_the_password() {
    let state = quick_state(500, 300);
    assert!(admin_set_pace(&state, "wrong", 100).await.is_err());
    assert!(admin_set_pace(&state, "mellon", 100).await.is_ok());
    assert_eq!(state.settings.read().await.reveal_interval_ms, 100);

    assert!(admin_reset_board(&state, "wrong").await.is_err());
    assert!(admin_reset_board(&state, "mellon").await.is_ok());
  }
}
