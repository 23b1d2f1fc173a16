//! Built-in challenge pool. Guarantees the booth keeps running even when no
//! TOML bank is configured or the config file is broken.

use crate::domain::{Challenge, ChallengeSource};

/// Minimal set of built-in challenges: two real threats and one trap where
/// the right move is to hold fire.
pub fn seed_challenges() -> Vec<Challenge> {
  vec![
    Challenge {
      id: "seed-assembly-line".into(),
      title: "PHASE 1: DROID ASSEMBLY LINE".into(),
      code: "def assemble_droid(unit_id):\n    import sys\n    import droid_control_v2\n    # ALERT: Unauthorized Uplink Detected\n    import imperial_uplink_secure\n    droid_control_v2.init(unit_id)\n    print('Droid online...')".into(),
      is_threat: true,
      // The typosquatted import lands on line index 4.
      reveal_threshold: 5,
      explanation: "'imperial_uplink_secure' is a malicious typosquat designed to hijack droid units.".into(),
      difficulty: "booth".into(),
      source: ChallengeSource::Seed,
    },
    Challenge {
      id: "seed-shield-calibration".into(),
      title: "PHASE 2: SHIELD GENERATOR CALIBRATION".into(),
      code: "def adjust_shields(power_level):\n    if power_level > 9000:\n        # WARNING: Code injection detected\n        if request.headers.get('Sith-Token'):\n            return os.system('/bin/sh')\n    return True".into(),
      is_threat: true,
      reveal_threshold: 5,
      explanation: "A remote-code-execution backdoor was slipped into the shield calibration path.".into(),
      difficulty: "booth".into(),
      source: ChallengeSource::Seed,
    },
    Challenge {
      id: "seed-forest-scan".into(),
      title: "PHASE 3: ENDOR FOREST SCAN".into(),
      code: "import deprecated_starship_lib  # CVE-2024-9999\n\ndef scan_forest_moon():\n    # Vulnerability is UNREACHABLE\n    print('No Ewoks detected.')\n    return None".into(),
      is_threat: false,
      reveal_threshold: 6,
      explanation: "FALSE ALARM: the library is vulnerable but not reachable. Halting production here costs you.".into(),
      difficulty: "booth".into(),
      source: ChallengeSource::Seed,
    },
  ]
}
