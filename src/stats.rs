//! Session counters.
//!
//! Tracks how much input a live tracker has processed and how many
//! signatures it delivered, without retaining any of the data itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one tracking run, safe to read from other threads.
#[derive(Debug)]
pub struct SessionStats {
    /// Key events ingested
    keystrokes: AtomicU64,
    /// Backspaces among them
    backspaces: AtomicU64,
    /// Aggregation cycles run
    cycles: AtomicU64,
    /// Signatures accepted by the sink
    signatures_delivered: AtomicU64,
    /// Signatures the sink failed to accept
    sink_failures: AtomicU64,
    /// Tracking start time
    started_at: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            keystrokes: AtomicU64::new(0),
            backspaces: AtomicU64::new(0),
            cycles: AtomicU64::new(0),
            signatures_delivered: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_keystroke(&self, is_backspace: bool) {
        self.keystrokes.fetch_add(1, Ordering::Relaxed);
        if is_backspace {
            self.backspaces.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self, delivered: bool) {
        if delivered {
            self.signatures_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.sink_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get the current counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            keystrokes: self.keystrokes.load(Ordering::Relaxed),
            backspaces: self.backspaces.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
            signatures_delivered: self.signatures_delivered.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            started_at: self.started_at,
            duration_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub keystrokes: u64,
    pub backspaces: u64,
    pub cycles: u64,
    pub signatures_delivered: u64,
    pub sink_failures: u64,
    pub started_at: DateTime<Utc>,
    pub duration_secs: u64,
}

impl StatsSnapshot {
    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "Tracking Statistics:\n\
             - Keystrokes processed: {}\n\
             - Backspaces: {}\n\
             - Aggregation cycles: {}\n\
             - Signatures delivered: {}\n\
             - Delivery failures: {}\n\
             - Duration: {} seconds",
            self.keystrokes,
            self.backspaces,
            self.cycles,
            self.signatures_delivered,
            self.sink_failures,
            self.duration_secs
        )
    }
}

/// Thread-safe shared counters.
pub type SharedSessionStats = Arc<SessionStats>;
