//! Key event types fed into the engine.
//!
//! Only the distinction the metrics need is kept: whether a key deletes
//! text. Character content is dropped at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name the host uses for the deletion key.
pub const BACKSPACE: &str = "Backspace";

/// Classification of a pressed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Deletes the previous character
    Backspace,
    /// Any other key
    Other,
}

impl KeyKind {
    /// Classify a key name as reported by the host.
    pub fn classify(key: &str) -> Self {
        if key == BACKSPACE {
            KeyKind::Backspace
        } else {
            KeyKind::Other
        }
    }

    pub fn is_backspace(self) -> bool {
        self == KeyKind::Backspace
    }
}

/// A single key press with the time it occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key name reported by the host (e.g. "a", "Backspace")
    pub key: String,
    /// Timestamp when the key was pressed
    pub timestamp: DateTime<Utc>,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            timestamp,
        }
    }

    /// Create an event stamped with the current time.
    pub fn now(key: impl Into<String>) -> Self {
        Self::new(key, Utc::now())
    }

    pub fn kind(&self) -> KeyKind {
        KeyKind::classify(&self.key)
    }
}
