//! Behavioral signature snapshots.
//!
//! One immutable [`BehavioralSignature`] is assembled per aggregation cycle
//! and handed to the host. Field names serialize in camelCase to match the
//! host's session records.

use crate::core::buffers::SignalBuffers;
use crate::core::metrics::{ConfidenceComponents, FlowComponents, LoadComponents};
use crate::core::patterns::PatternFlags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flow state block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowState {
    /// Score of this cycle
    pub current: f64,
    /// Mean of the recent score history
    pub average: f64,
    /// Longest sustained peak in milliseconds
    pub peak_duration: f64,
    /// Last cycle that scored above the peak threshold
    pub last_peak: Option<DateTime<Utc>>,
    pub consistency: f64,
    pub sustainability: f64,
    pub momentum: f64,
}

/// Cognitive load block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveLoad {
    pub current: f64,
    pub average: f64,
    /// Backspaces over total keystrokes
    pub backspace_frequency: f64,
    /// Labels of recorded deletion runs, oldest first
    pub revision_patterns: Vec<String>,
    pub pause_frequency: f64,
    pub rhythm_variance: f64,
}

/// Confidence block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confidence {
    pub current: f64,
    pub average: f64,
    /// Short hesitation pauses in the pause buffer
    pub word_choice_hesitation: u32,
    /// Sentence-level restructurings among recent revisions
    pub sentence_restructuring: u32,
}

/// The unit of output: buffers, scores and patterns of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralSignature {
    /// Tracking session identifier
    pub id: Uuid,
    pub user_id: String,
    /// Cycle number within the session, starting at 1
    pub sequence: u64,
    /// Aggregation instant
    pub emitted_at: DateTime<Utc>,
    pub pause_patterns: Vec<f64>,
    pub keystroke_rhythm: Vec<f64>,
    pub typing_pressure: Vec<f64>,
    pub flow_state: FlowState,
    pub cognitive_load: CognitiveLoad,
    pub confidence: Confidence,
    pub patterns: PatternFlags,
    pub keystroke_count: u64,
    pub backspace_count: u64,
}

/// Averages and peak data kept by the session for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleHistory {
    pub flow_average: f64,
    pub load_average: f64,
    pub confidence_average: f64,
    pub peak_duration_ms: f64,
    pub last_peak: Option<DateTime<Utc>>,
}

/// Assembles signatures for one tracking session.
#[derive(Debug, Clone)]
pub struct SignatureBuilder {
    session_id: Uuid,
    user_id: String,
}

impl SignatureBuilder {
    pub fn new(session_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            session_id,
            user_id: user_id.into(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Build a snapshot from the current buffers and this cycle's results.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        sequence: u64,
        emitted_at: DateTime<Utc>,
        buffers: &SignalBuffers,
        flow: &FlowComponents,
        load: &LoadComponents,
        confidence: &ConfidenceComponents,
        patterns: PatternFlags,
        history: &CycleHistory,
    ) -> BehavioralSignature {
        BehavioralSignature {
            id: self.session_id,
            user_id: self.user_id.clone(),
            sequence,
            emitted_at,
            pause_patterns: buffers.pauses.iter().map(|p| p.duration_ms).collect(),
            keystroke_rhythm: buffers.rhythm.to_vec(),
            typing_pressure: buffers.pressure.to_vec(),
            flow_state: FlowState {
                current: flow.score,
                average: history.flow_average,
                peak_duration: history.peak_duration_ms,
                last_peak: history.last_peak,
                consistency: flow.consistency,
                sustainability: flow.sustainability,
                momentum: flow.momentum,
            },
            cognitive_load: CognitiveLoad {
                current: load.score,
                average: history.load_average,
                backspace_frequency: buffers.backspace_frequency(),
                revision_patterns: buffers
                    .revisions
                    .iter()
                    .map(|r| r.kind.label().to_string())
                    .collect(),
                pause_frequency: load.pause_frequency,
                rhythm_variance: load.rhythm_variance,
            },
            confidence: Confidence {
                current: confidence.score,
                average: history.confidence_average,
                word_choice_hesitation: confidence.short_pauses,
                sentence_restructuring: confidence.sentence_restructuring,
            },
            patterns,
            keystroke_count: buffers.total_keystrokes,
            backspace_count: buffers.backspace_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffers::{PauseSample, RevisionEvent, RevisionKind};

    #[test]
    fn test_build_copies_buffers_and_scores() {
        let now = Utc::now();
        let mut buffers = SignalBuffers::new(100, 100);
        buffers.rhythm.push(120.0);
        buffers.pressure.push(0.5);
        buffers.pauses.push(PauseSample {
            at: now,
            duration_ms: 450.0,
        });
        buffers.revisions.push(RevisionEvent {
            at: now,
            kind: RevisionKind::WordRevision,
            length: 3,
        });
        buffers.total_keystrokes = 4;
        buffers.backspace_count = 1;

        let builder = SignatureBuilder::new(Uuid::nil(), "writer-1");
        let flow = FlowComponents {
            score: 0.6,
            ..Default::default()
        };
        let signature = builder.build(
            3,
            now,
            &buffers,
            &flow,
            &LoadComponents::default(),
            &ConfidenceComponents::default(),
            PatternFlags::default(),
            &CycleHistory::default(),
        );

        assert_eq!(signature.sequence, 3);
        assert_eq!(signature.user_id, "writer-1");
        assert_eq!(signature.pause_patterns, vec![450.0]);
        assert_eq!(signature.flow_state.current, 0.6);
        assert_eq!(signature.cognitive_load.backspace_frequency, 0.25);
        assert_eq!(signature.cognitive_load.revision_patterns, vec!["word_revision"]);
    }

    #[test]
    fn test_signature_serializes_camel_case() {
        let builder = SignatureBuilder::new(Uuid::nil(), "writer-1");
        let signature = builder.build(
            1,
            Utc::now(),
            &SignalBuffers::new(10, 10),
            &FlowComponents::default(),
            &LoadComponents::default(),
            &ConfidenceComponents::default(),
            PatternFlags::default(),
            &CycleHistory::default(),
        );

        let json = serde_json::to_value(&signature).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json["flowState"].get("peakDuration").is_some());
        assert!(json["cognitiveLoad"].get("revisionPatterns").is_some());
        assert!(json["confidence"].get("wordChoiceHesitation").is_some());
        assert_eq!(json["patterns"]["burstTyping"], false);
    }
}
