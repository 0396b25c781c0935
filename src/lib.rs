//! Journal Biometrics - keystroke-timing signal engine for a journaling app.
//!
//! The engine ingests key presses from a writer, keeps bounded histories of
//! keystroke timing, and on a fixed cadence derives three continuous
//! metrics (flow, cognitive load, confidence) plus a set of behavioral
//! pattern flags.
//!
//! # Guarantees
//!
//! - **No key content**: only whether a key deletes text is kept
//! - **Bounded memory**: every buffer has a fixed capacity with FIFO eviction
//! - **No persistence**: session state is discarded on deactivation
//! - **Deterministic**: identical input and seed give identical signatures
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Journal Biometrics                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌──────────────────────┐  │
//! │  │ Key events │──▶│  Ingestor  │──▶│  Sliding buffers     │  │
//! │  └────────────┘   └────────────┘   └──────────────────────┘  │
//! │                                              │                │
//! │        every 2s (scheduler / replay)         ▼                │
//! │  ┌────────────┐   ┌────────────┐   ┌──────────────────────┐  │
//! │  │    Sink    │◀──│ Signature  │◀──│ Metrics + patterns   │  │
//! │  └────────────┘   └────────────┘   └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use journal_biometrics::SignalEngine;
//!
//! let mut engine = SignalEngine::default();
//! engine.activate("writer-42");
//!
//! let start = Utc::now();
//! for i in 0..30 {
//!     engine.on_key_event("a", start + Duration::milliseconds(i * 100));
//! }
//!
//! let signature = engine.aggregate(start + Duration::seconds(3)).unwrap();
//! assert!(signature.patterns.rhythmic_typing);
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod replay;
pub mod scheduler;
pub mod sink;
pub mod stats;

// Re-export key types at crate root for convenience
pub use collector::{read_key_events, KeyEvent, KeyKind, TypingProfile};
pub use config::{ConfigError, EngineConfig};
pub use crate::core::{BehavioralSignature, PatternFlags};
pub use engine::{SignalEngine, TrackingSession};
pub use error::EngineError;
pub use replay::{replay_to_vec, Replayer};
pub use scheduler::{spawn_tracker, CancellationToken, TrackerHandle};
pub use sink::{ChannelSink, JsonLinesSink, SignatureSink};
pub use stats::{SessionStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
