//! Small utility helpers used across modules.

/// Clean a player display name for the leaderboard: trim, collapse inner
/// whitespace, cap the length. Empty input becomes "ANON".
pub fn normalize_player_name(raw: &str) -> String {
  const MAX_LEN: usize = 24;
  let cleaned: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
  if cleaned.is_empty() {
    return "ANON".into();
  }
  cleaned.chars().take(MAX_LEN).collect()
}

/// Render seconds as "m:ss" for the session countdown.
pub fn fmt_mmss(total_seconds: u64) -> String {
  format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
#[allow(dead_code)]
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_is_trimmed_and_collapsed() {
    assert_eq!(normalize_player_name("  Obi   Wan  "), "Obi Wan");
    assert_eq!(normalize_player_name(""), "ANON");
    assert_eq!(normalize_player_name("   "), "ANON");
  }

  #[test]
  fn name_is_capped() {
    let long = "x".repeat(100);
    assert_eq!(normalize_player_name(&long).chars().count(), 24);
  }

  #[test]
  fn mmss_formats() {
    assert_eq!(fmt_mmss(0), "0:00");
    assert_eq!(fmt_mmss(65), "1:05");
    assert_eq!(fmt_mmss(600), "10:00");
  }
}
