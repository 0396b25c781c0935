//! Error types for the signal engine

use crate::config::ConfigError;
use thiserror::Error;

/// Errors raised at the edges of the engine.
///
/// Metric derivation itself never fails; these cover configuration,
/// event input and signature delivery.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid key event on line {line}: {message}")]
    InvalidEvent { line: usize, message: String },

    #[error("Signature sink is closed")]
    SinkClosed,

    #[error("Tracker has stopped")]
    TrackerStopped,
}
