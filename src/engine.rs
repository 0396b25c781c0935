//! The signal engine and its tracking session.
//!
//! A [`SignalEngine`] owns at most one [`TrackingSession`]. The session
//! exclusively owns its buffers, counters and score histories; activation
//! always starts from empty state and deactivation discards it.

use crate::collector::types::KeyKind;
use crate::config::EngineConfig;
use crate::core::buffers::SignalBuffers;
use crate::core::ingest::EventIngestor;
use crate::core::metrics::{
    cognitive_load_score, confidence_score, flow_score, FlowPeakTracker, ScoreHistory,
};
use crate::core::patterns::detect_patterns;
use crate::core::signature::{BehavioralSignature, CycleHistory, SignatureBuilder};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// State of one active tracking session.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    builder: SignatureBuilder,
    buffers: SignalBuffers,
    ingestor: EventIngestor,
    flow_history: ScoreHistory,
    load_history: ScoreHistory,
    confidence_history: ScoreHistory,
    flow_peaks: FlowPeakTracker,
    cycles: u64,
}

impl TrackingSession {
    fn new(config: &EngineConfig, session_id: Uuid, user_id: String) -> Self {
        let buffers = &config.buffers;
        Self {
            builder: SignatureBuilder::new(session_id, user_id),
            buffers: SignalBuffers::new(buffers.raw_capacity, buffers.revision_capacity),
            ingestor: EventIngestor::new(config),
            flow_history: ScoreHistory::new(buffers.history_capacity),
            load_history: ScoreHistory::new(buffers.history_capacity),
            confidence_history: ScoreHistory::new(buffers.history_capacity),
            flow_peaks: FlowPeakTracker::default(),
            cycles: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.builder.session_id()
    }

    pub fn user_id(&self) -> &str {
        self.builder.user_id()
    }

    pub fn buffers(&self) -> &SignalBuffers {
        &self.buffers
    }

    /// Number of aggregation cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one derive-and-assemble cycle at `now`.
    ///
    /// Calculators run in a fixed order: flow, cognitive load, confidence,
    /// then pattern detection.
    fn aggregate(&mut self, config: &EngineConfig, now: DateTime<Utc>) -> BehavioralSignature {
        let flow = flow_score(&self.buffers, config);
        self.flow_history.record(flow.score);
        self.flow_peaks
            .update(flow.score, config.flow.peak_threshold, now);

        let load = cognitive_load_score(&self.buffers, config, now);
        self.load_history.record(load.score);

        let confidence = confidence_score(&self.buffers, config);
        self.confidence_history.record(confidence.score);

        let patterns = detect_patterns(&self.buffers, config, flow.score, load.score);

        self.cycles += 1;
        let history = CycleHistory {
            flow_average: self.flow_history.average(),
            load_average: self.load_history.average(),
            confidence_average: self.confidence_history.average(),
            peak_duration_ms: self.flow_peaks.peak_duration_ms(),
            last_peak: self.flow_peaks.last_peak(),
        };

        self.builder.build(
            self.cycles,
            now,
            &self.buffers,
            &flow,
            &load,
            &confidence,
            patterns,
            &history,
        )
    }
}

/// Keystroke signal engine.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: EngineConfig,
    session: Option<TrackingSession>,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start tracking for `user_id` with a fresh session identifier.
    pub fn activate(&mut self, user_id: impl Into<String>) -> Uuid {
        let session_id = Uuid::new_v4();
        self.activate_with_session_id(user_id, session_id);
        session_id
    }

    /// Start tracking with a caller-chosen session identifier.
    ///
    /// Any active session is discarded first.
    pub fn activate_with_session_id(&mut self, user_id: impl Into<String>, session_id: Uuid) {
        if let Some(previous) = self.session.take() {
            tracing::debug!(
                session = %previous.session_id(),
                "replacing active tracking session"
            );
        }

        let user_id = user_id.into();
        tracing::debug!(session = %session_id, user = %user_id, "tracking activated");
        self.session = Some(TrackingSession::new(&self.config, session_id, user_id));
    }

    /// Stop tracking and discard the session state.
    ///
    /// Returns the discarded session, if one was active.
    pub fn deactivate(&mut self) -> Option<TrackingSession> {
        let session = self.session.take();
        if let Some(ref s) = session {
            tracing::debug!(
                session = %s.session_id(),
                cycles = s.cycles(),
                keystrokes = s.buffers().total_keystrokes,
                "tracking deactivated"
            );
        }
        session
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&TrackingSession> {
        self.session.as_ref()
    }

    /// Feed one key press. Ignored while tracking is inactive.
    pub fn on_key_event(&mut self, key: &str, now: DateTime<Utc>) {
        if let Some(session) = self.session.as_mut() {
            session
                .ingestor
                .ingest(&mut session.buffers, KeyKind::classify(key), now);
        }
    }

    /// Run one aggregation cycle at `now`, or `None` while inactive.
    pub fn aggregate(&mut self, now: DateTime<Utc>) -> Option<BehavioralSignature> {
        let config = &self.config;
        let session = self.session.as_mut()?;
        let signature = session.aggregate(config, now);

        tracing::debug!(
            sequence = signature.sequence,
            flow = signature.flow_state.current,
            load = signature.cognitive_load.current,
            confidence = signature.confidence.current,
            patterns = ?signature.patterns.active(),
            "aggregation cycle"
        );

        Some(signature)
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
