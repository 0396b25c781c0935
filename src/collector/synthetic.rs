//! Synthetic typing streams for demos and tests.

use crate::collector::types::{KeyEvent, BACKSPACE};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Shape of a generated typing stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingProfile {
    /// Constant interval between every key
    Steady,
    /// Runs of fast keys separated by short breaks
    Bursty,
    /// Slow typing broken by long pauses
    Hesitant,
    /// Steady typing with frequent deletion runs
    Revising,
}

impl std::str::FromStr for TypingProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "steady" => Ok(TypingProfile::Steady),
            "bursty" => Ok(TypingProfile::Bursty),
            "hesitant" => Ok(TypingProfile::Hesitant),
            "revising" => Ok(TypingProfile::Revising),
            other => Err(format!("unknown typing profile: {other}")),
        }
    }
}

const SAMPLE_TEXT: &[u8] = b"the quiet morning light settles over the page ";

/// Generate `keys` events following `profile`, starting at `start`.
///
/// `interval_ms` is the base inter-key interval; profiles derive their
/// gaps from it.
pub fn generate(
    profile: TypingProfile,
    keys: usize,
    interval_ms: i64,
    start: DateTime<Utc>,
) -> Vec<KeyEvent> {
    let mut events = Vec::with_capacity(keys);
    let mut at = start;

    for i in 0..keys {
        if i > 0 {
            at += Duration::milliseconds(gap_ms(profile, i, interval_ms));
        }
        events.push(KeyEvent::new(key_for(profile, i), at));
    }

    events
}

fn gap_ms(profile: TypingProfile, index: usize, interval_ms: i64) -> i64 {
    match profile {
        TypingProfile::Steady | TypingProfile::Revising => interval_ms,
        TypingProfile::Bursty => {
            if index % 6 == 0 {
                interval_ms * 6
            } else {
                interval_ms
            }
        }
        TypingProfile::Hesitant => {
            if index % 2 == 0 {
                interval_ms * 25
            } else {
                interval_ms * 3
            }
        }
    }
}

fn key_for(profile: TypingProfile, index: usize) -> String {
    // Three deletions after every ten characters.
    if profile == TypingProfile::Revising && index % 13 >= 10 {
        return BACKSPACE.to_string();
    }
    let byte = SAMPLE_TEXT[index % SAMPLE_TEXT.len()];
    if byte == b' ' {
        " ".to_string()
    } else {
        (byte as char).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_profile_is_periodic() {
        let start = Utc::now();
        let events = generate(TypingProfile::Steady, 5, 100, start);
        assert_eq!(events.len(), 5);
        assert_eq!(events[4].timestamp - start, Duration::milliseconds(400));
    }

    #[test]
    fn test_revising_profile_contains_backspaces() {
        let events = generate(TypingProfile::Revising, 26, 120, Utc::now());
        let deletions = events.iter().filter(|e| e.kind().is_backspace()).count();
        assert_eq!(deletions, 6);
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("Bursty".parse::<TypingProfile>(), Ok(TypingProfile::Bursty));
        assert!("frantic".parse::<TypingProfile>().is_err());
    }
}
