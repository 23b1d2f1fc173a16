//! Client for the external leaderboard row store.
//!
//! The store is a plain HTTP service with three operations: append a score,
//! read the top N, and (admin only) wipe everything. Calls are instrumented
//! and log latencies and row counts, never tokens.
//!
//! Failure handling is deliberate: transport errors get exactly one retry,
//! HTTP error statuses do not (the store saw the request; retrying an append
//! could double-post). Every failure is a `BoardError` kind, not a swallowed
//! string.

use std::fmt;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{instrument, info, warn};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardEntry {
  pub player: String,
  pub score: i32,
}

/// What went wrong talking to the store.
#[derive(Debug)]
pub enum BoardError {
  /// Could not reach the store at all (DNS, refused, timeout).
  Transport(String),
  /// The store answered with a non-success status.
  Status(u16, String),
  /// The store answered, but not with the JSON we expect.
  Decode(String),
}

impl fmt::Display for BoardError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BoardError::Transport(e) => write!(f, "board unreachable: {}", e),
      BoardError::Status(code, body) => write!(f, "board HTTP {}: {}", code, body),
      BoardError::Decode(e) => write!(f, "board sent invalid payload: {}", e),
    }
  }
}

impl std::error::Error for BoardError {}

#[derive(Clone)]
pub struct Board {
  client: reqwest::Client,
  pub base_url: String,
  token: Option<String>,
}

impl Board {
  /// Construct the client if KILLSWITCH_BOARD_URL is set; otherwise None and
  /// the app falls back to its in-memory board.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("KILLSWITCH_BOARD_URL").ok()?;
    let token = std::env::var("KILLSWITCH_BOARD_TOKEN").ok();

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(5))
      .build()
      .ok()?;

    Some(Self { client, base_url: base_url.trim_end_matches('/').to_string(), token })
  }

  fn request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    let req = req
      .header(USER_AGENT, "killswitch-backend/0.1")
      .header(CONTENT_TYPE, "application/json");
    match &self.token {
      Some(t) => req.header(AUTHORIZATION, format!("Bearer {}", t)),
      None => req,
    }
  }

  /// Append one (player, score) row. Called exactly once per finished
  /// session; the caller holds the idempotency flag.
  #[instrument(level = "info", skip(self), fields(%player, score))]
  pub async fn submit(&self, player: &str, score: i32) -> Result<(), BoardError> {
    let url = format!("{}/scores", self.base_url);
    let row = BoardEntry { player: player.to_string(), score };

    let first = self.post_row(&url, &row).await;
    match first {
      Err(BoardError::Transport(e)) => {
        warn!(target: "leaderboard", error = %e, "submit failed, retrying once");
        self.post_row(&url, &row).await
      }
      other => other,
    }
  }

  async fn post_row(&self, url: &str, row: &BoardEntry) -> Result<(), BoardError> {
    let res = self
      .request(self.client.post(url))
      .json(row)
      .send()
      .await
      .map_err(|e| BoardError::Transport(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      return Err(BoardError::Status(status, body));
    }
    info!(target: "leaderboard", player = %row.player, score = row.score, "score appended");
    Ok(())
  }

  /// Read the top `n` rows, sorted by score descending.
  #[instrument(level = "info", skip(self))]
  pub async fn top(&self, n: usize) -> Result<Vec<BoardEntry>, BoardError> {
    let url = format!("{}/scores/top?n={}", self.base_url, n);

    let first = self.get_top(&url).await;
    let mut rows = match first {
      Err(BoardError::Transport(e)) => {
        warn!(target: "leaderboard", error = %e, "top read failed, retrying once");
        self.get_top(&url).await?
      }
      other => other?,
    };

    // The store is supposed to sort, but interleaved writers make its order
    // only eventually consistent. Sort locally so the finale is stable.
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows.truncate(n);
    info!(target: "leaderboard", rows = rows.len(), "top rows read");
    Ok(rows)
  }

  async fn get_top(&self, url: &str) -> Result<Vec<BoardEntry>, BoardError> {
    let res = self
      .request(self.client.get(url))
      .send()
      .await
      .map_err(|e| BoardError::Transport(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      return Err(BoardError::Status(status, body));
    }
    res
      .json::<Vec<BoardEntry>>()
      .await
      .map_err(|e| BoardError::Decode(e.to_string()))
  }

  /// Destructive wipe, reachable only through the admin panel.
  #[instrument(level = "warn", skip(self))]
  pub async fn reset(&self) -> Result<(), BoardError> {
    let url = format!("{}/scores", self.base_url);
    let res = self
      .request(self.client.delete(&url))
      .send()
      .await
      .map_err(|e| BoardError::Transport(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      return Err(BoardError::Status(status, body));
    }
    warn!(target: "leaderboard", "leaderboard wiped by admin");
    Ok(())
  }
}

/// Keep a local top list in score-descending order, bounded to `cap` rows.
/// Used for the in-memory fallback board.
pub fn insert_ranked(rows: &mut Vec<BoardEntry>, entry: BoardEntry, cap: usize) {
  let pos = rows
    .iter()
    .position(|r| r.score < entry.score)
    .unwrap_or(rows.len());
  rows.insert(pos, entry);
  rows.truncate(cap);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_ranked_keeps_descending_order() {
    let mut rows = vec![];
    insert_ranked(&mut rows, BoardEntry { player: "a".into(), score: 100 }, 5);
    insert_ranked(&mut rows, BoardEntry { player: "b".into(), score: 250 }, 5);
    insert_ranked(&mut rows, BoardEntry { player: "c".into(), score: -75 }, 5);
    insert_ranked(&mut rows, BoardEntry { player: "d".into(), score: 100 }, 5);
    let scores: Vec<i32> = rows.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![250, 100, 100, -75]);
  }

  #[test]
  fn insert_ranked_respects_cap() {
    let mut rows = vec![];
    for i in 0..10 {
      insert_ranked(&mut rows, BoardEntry { player: format!("p{}", i), score: i }, 3);
    }
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].score, 9);
    assert_eq!(rows[2].score, 7);
  }

  #[test]
  fn board_error_display_names_the_kind() {
    let e = BoardError::Status(503, "maintenance".into());
    assert!(e.to_string().contains("503"));
    let e = BoardError::Transport("connection refused".into());
    assert!(e.to_string().contains("unreachable"));
  }
}
