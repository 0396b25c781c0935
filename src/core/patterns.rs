//! Behavioral pattern classification.
//!
//! Each flag is an independent predicate evaluated fresh every cycle from
//! the current buffers and the scores computed in the same cycle.

use crate::config::EngineConfig;
use crate::core::buffers::SignalBuffers;
use crate::core::metrics::normalized_variance;
use serde::{Deserialize, Serialize};

/// Boolean classifications for one aggregation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternFlags {
    /// Runs of fast keystrokes separated by slower gaps
    pub burst_typing: bool,
    /// Evenly paced keystrokes
    pub rhythmic_typing: bool,
    /// Recent pauses dominated by long gaps
    pub hesitation_phase: bool,
    /// Rhythmic, unhesitating typing with a high flow score
    pub flow_state: bool,
    /// High load together with frequent deletions
    pub cognitive_overload: bool,
}

impl PatternFlags {
    /// Names of the flags that are set, in declaration order.
    pub fn active(&self) -> Vec<&'static str> {
        [
            ("burst_typing", self.burst_typing),
            ("rhythmic_typing", self.rhythmic_typing),
            ("hesitation_phase", self.hesitation_phase),
            ("flow_state", self.flow_state),
            ("cognitive_overload", self.cognitive_overload),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// Classify the current buffers given this cycle's flow and load scores.
pub fn detect_patterns(
    buffers: &SignalBuffers,
    config: &EngineConfig,
    flow_score: f64,
    load_score: f64,
) -> PatternFlags {
    let patterns = &config.patterns;

    let rhythm: Vec<f64> = buffers
        .rhythm
        .recent(patterns.rhythm_samples)
        .copied()
        .collect();
    let enough_rhythm = rhythm.len() >= patterns.min_rhythm_samples && !rhythm.is_empty();

    let burst_typing = enough_rhythm && {
        let fast = rhythm
            .iter()
            .filter(|&&i| i < config.thresholds.burst_ms)
            .count();
        // A burst needs at least one slower gap to end it.
        fast as f64 / rhythm.len() as f64 > patterns.burst_share && fast < rhythm.len()
    };

    let rhythmic_typing = enough_rhythm
        && normalized_variance(&buffers.recent_intervals(patterns.rhythm_samples))
            .is_some_and(|v| v < patterns.rhythmic_variance);

    let pauses: Vec<f64> = buffers
        .pauses
        .recent(patterns.pause_samples)
        .map(|p| p.duration_ms)
        .collect();
    let hesitation_phase = !pauses.is_empty() && {
        let long = pauses
            .iter()
            .filter(|&&d| d > config.thresholds.hesitation_pause_ms)
            .count();
        long as f64 / pauses.len() as f64 > patterns.hesitation_share
    };

    let flow_state = rhythmic_typing && !hesitation_phase && flow_score > patterns.flow_score;
    let cognitive_overload = load_score > patterns.overload_load
        && buffers.backspace_frequency() > patterns.overload_backspace;

    PatternFlags {
        burst_typing,
        rhythmic_typing,
        hesitation_phase,
        flow_state,
        cognitive_overload,
    }
}
