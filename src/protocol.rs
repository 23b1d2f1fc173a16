//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::Outcome;
use crate::leaderboard::BoardEntry;
use crate::session::{LevelResult, Phase, Session};
use crate::util::fmt_mmss;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    /// Login: collects the display name and starts a session.
    Start {
        name: String,
    },
    /// Poll the current reveal/score/timer state.
    View {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    /// The kill-switch.
    Stop {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Advance {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    /// Clear all session state back to the login screen.
    Reboot {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Leaderboard,
    AdminSetPace {
        password: String,
        #[serde(rename = "revealIntervalMs")]
        reveal_interval_ms: u64,
    },
    AdminResetBoard {
        password: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Started {
        #[serde(rename = "sessionId")]
        session_id: String,
        view: SessionView,
    },
    Session {
        view: SessionView,
    },
    Leaderboard {
        entries: Vec<BoardEntry>,
        notice: Option<String>,
    },
    AdminOk {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Coarse phase exposed to the front end.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOut {
    Playing,
    Resolved,
    Finished,
}

/// Result of the level that just ended.
#[derive(Debug, Clone, Serialize)]
pub struct LevelResultOut {
    pub outcome: Outcome,
    pub label: String,
    pub delta: i32,
    pub cursor: usize,
    pub title: String,
    pub explanation: String,
}

/// DTO used by both WS and HTTP: everything the page renders.
/// Only the revealed prefix of the code ever leaves the server, so the page
/// cannot peek ahead of the typing animation.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub player: String,
    /// 1-based for display ("SECTOR 2 / 3").
    pub level: usize,
    pub total_levels: usize,
    pub score: i32,
    pub phase: PhaseOut,
    pub title: String,
    pub revealed: String,
    pub cursor: usize,
    pub total_lines: usize,
    pub remaining_seconds: u64,
    pub remaining_display: String,
    pub last: Option<LevelResultOut>,
    /// Set on the finale when the leaderboard write degraded.
    pub board_notice: Option<String>,
}

fn to_result_out(r: &LevelResult) -> LevelResultOut {
    LevelResultOut {
        outcome: r.outcome,
        label: r.outcome.label().to_string(),
        delta: r.delta,
        cursor: r.cursor,
        title: r.title.clone(),
        explanation: r.explanation.clone(),
    }
}

/// Build the public view of a session. `title`/`revealed`/`cursor` describe
/// the current level and are empty once the session is finished.
pub fn to_view(
    s: &Session,
    title: &str,
    revealed: String,
    cursor: usize,
    total_lines: usize,
    remaining_seconds: u64,
    board_notice: Option<String>,
) -> SessionView {
    let phase = match s.phase {
        Phase::Playing(_) => PhaseOut::Playing,
        Phase::Resolved => PhaseOut::Resolved,
        Phase::Finished => PhaseOut::Finished,
    };
    SessionView {
        session_id: s.id.clone(),
        player: s.player.clone(),
        level: (s.level + 1).min(s.total_levels().max(1)),
        total_levels: s.total_levels(),
        score: s.score,
        phase,
        title: title.to_string(),
        revealed,
        cursor,
        total_lines,
        remaining_seconds,
        remaining_display: fmt_mmss(remaining_seconds),
        last: s.last.as_ref().map(to_result_out),
        board_notice,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartIn {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Serialize)]
pub struct LeaderboardOut {
    pub entries: Vec<BoardEntry>,
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminPaceIn {
    pub password: String,
    #[serde(rename = "revealIntervalMs")]
    pub reveal_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct AdminResetIn {
    pub password: String,
}

#[derive(Serialize)]
pub struct StartOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub view: SessionView,
}

#[derive(Serialize)]
pub struct AdminOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct OkOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
