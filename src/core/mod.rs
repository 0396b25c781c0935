//! Core signal processing.
//!
//! This module contains:
//! - Bounded buffers owned by a tracking session
//! - Keystroke ingestion into those buffers
//! - Flow, cognitive load and confidence calculators
//! - Pattern classification
//! - Signature assembly for export

pub mod buffers;
pub mod ingest;
pub mod metrics;
pub mod patterns;
pub mod signature;

// Re-export commonly used types
pub use buffers::{PauseSample, RevisionEvent, RevisionKind, SignalBuffers, SlidingWindow};
pub use ingest::EventIngestor;
pub use metrics::{
    cognitive_load_score, confidence_score, flow_score, normalized_variance, ConfidenceComponents,
    FlowComponents, FlowPeakTracker, LoadComponents, ScoreHistory,
};
pub use patterns::{detect_patterns, PatternFlags};
pub use signature::{BehavioralSignature, CognitiveLoad, Confidence, FlowState, SignatureBuilder};
