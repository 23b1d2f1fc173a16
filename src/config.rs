//! Loading game configuration (settings + optional challenge bank) from TOML.
//!
//! See `GameConfig` and `Settings` for the expected schema.

use serde::Deserialize;
use tracing::{info, error};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GameConfig {
  #[serde(default)]
  pub settings: Settings,
  #[serde(default)]
  pub challenges: Vec<ChallengeCfg>,
}

/// Challenge entry accepted in TOML configuration.
/// `threat_line` is the 0-based index of the dangerous line; omit it for
/// benign snippets or when the threat only becomes clear at the very end.
#[derive(Clone, Debug, Deserialize)]
pub struct ChallengeCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub code: String,
  #[serde(default)] pub is_threat: bool,
  #[serde(default)] pub threat_line: Option<usize>,
  #[serde(default)] pub explanation: String,
  #[serde(default)] pub difficulty: Option<String>,
}

/// Booth tunables. Every field has a default so a config file can set only
/// what it cares about.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
  /// Milliseconds between typed lines. Admin-tunable at runtime.
  #[serde(default = "default_reveal_interval_ms")]
  pub reveal_interval_ms: u64,
  /// Hard wall-clock limit for a whole session.
  #[serde(default = "default_session_seconds")]
  pub session_seconds: u64,
  /// How many leaderboard rows the finale screen shows.
  #[serde(default = "default_board_top_n")]
  pub board_top_n: usize,
  /// Gate for the admin panel. No password means no admin access at all.
  #[serde(default)]
  pub admin_password: Option<String>,
}

fn default_reveal_interval_ms() -> u64 { 500 }
fn default_session_seconds() -> u64 { 300 }
fn default_board_top_n() -> usize { 5 }

impl Default for Settings {
  fn default() -> Self {
    Self {
      reveal_interval_ms: default_reveal_interval_ms(),
      session_seconds: default_session_seconds(),
      board_top_n: default_board_top_n(),
      admin_password: None,
    }
  }
}

/// Attempt to load `GameConfig` from KILLSWITCH_CONFIG_PATH. On any parsing/IO
/// error, returns None and the caller falls back to defaults + seed pool.
pub fn load_game_config_from_env() -> Option<GameConfig> {
  let path = std::env::var("KILLSWITCH_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<GameConfig>(&s) {
      Ok(cfg) => {
        info!(target: "killswitch_backend", %path, "Loaded game config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "killswitch_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "killswitch_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_full_config() {
    let toml_src = r#"
      [settings]
      reveal_interval_ms = 250
      session_seconds = 120
      admin_password = "mellon"

      [[challenges]]
      title = "PHASE 1"
      code = "import sys\nimport evil_pkg"
      is_threat = true
      threat_line = 1
      explanation = "typosquat"
      difficulty = "easy"
    "#;
    let cfg: GameConfig = toml::from_str(toml_src).unwrap();
    assert_eq!(cfg.settings.reveal_interval_ms, 250);
    assert_eq!(cfg.settings.session_seconds, 120);
    assert_eq!(cfg.settings.board_top_n, 5); // defaulted
    assert_eq!(cfg.settings.admin_password.as_deref(), Some("mellon"));
    assert_eq!(cfg.challenges.len(), 1);
    assert_eq!(cfg.challenges[0].threat_line, Some(1));
    assert!(cfg.challenges[0].is_threat);
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg: GameConfig = toml::from_str("").unwrap();
    assert_eq!(cfg.settings.reveal_interval_ms, 500);
    assert_eq!(cfg.settings.session_seconds, 300);
    assert!(cfg.settings.admin_password.is_none());
    assert!(cfg.challenges.is_empty());
  }

  #[test]
  fn garbage_fails_to_parse() {
    assert!(toml::from_str::<GameConfig>("settings = 3").is_err());
  }
}
