//! Metric calculators.
//!
//! Flow, cognitive load and confidence are pure functions over a borrowed
//! [`SignalBuffers`]. The only state they feed is the bounded score history
//! each metric keeps for its running average. All scores are in [0, 1].

use crate::config::EngineConfig;
use crate::core::buffers::{SignalBuffers, SlidingWindow};
use crate::core::buffers::{millis_between, RevisionKind};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Variance of `values` divided by their squared mean.
///
/// Returns `None` for an empty slice or a non-positive mean, where the
/// ratio carries no meaning.
pub fn normalized_variance(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let avg = values.mean();
    if !avg.is_finite() || avg <= 0.0 {
        return None;
    }

    let variance = values.population_variance();
    Some(variance / (avg * avg))
}

/// Flow score and the terms it was built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowComponents {
    pub consistency: f64,
    pub sustainability: f64,
    pub momentum: f64,
    pub score: f64,
}

/// Score sustained, consistent, accelerating typing.
pub fn flow_score(buffers: &SignalBuffers, config: &EngineConfig) -> FlowComponents {
    let flow = &config.flow;
    if buffers.timestamps.len() < flow.min_timestamps {
        return FlowComponents::default();
    }

    let intervals = buffers.recent_intervals(flow.sample_size);
    if intervals.is_empty() {
        return FlowComponents::default();
    }

    let consistency = normalized_variance(&intervals)
        .map(|v| (1.0 - v).max(0.0))
        .unwrap_or(0.0);

    let long_pauses = intervals
        .iter()
        .filter(|&&i| i > config.thresholds.sustain_pause_ms)
        .count();
    let sustainability = (1.0 - long_pauses as f64 / intervals.len() as f64).max(0.0);

    let (first, second) = intervals.split_at(intervals.len() / 2);
    let momentum = if first.is_empty() || second.is_empty() {
        0.0
    } else {
        let first_avg = first.mean();
        let second_avg = second.mean();
        if first_avg > 0.0 {
            ((first_avg - second_avg) / first_avg).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };

    let score = flow.consistency_weight * consistency
        + flow.sustainability_weight * sustainability
        + flow.momentum_weight * momentum;

    FlowComponents {
        consistency,
        sustainability,
        momentum,
        score: clamp_unit(score),
    }
}

/// Cognitive load score and the terms it was built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadComponents {
    pub backspace_ratio: f64,
    pub pause_frequency: f64,
    pub rhythm_variance: f64,
    pub score: f64,
}

/// Score revision pressure and thinking pauses over the trailing window ending at `now`.
pub fn cognitive_load_score(
    buffers: &SignalBuffers,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> LoadComponents {
    let load = &config.load;
    let thresholds = &config.thresholds;
    let window = Duration::microseconds((thresholds.cognitive_window_ms * 1000.0) as i64);
    let window_start = now
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let in_window = |t: DateTime<Utc>| t >= window_start && t <= now;

    let backspace_ratio = buffers.backspace_frequency();

    let recent_keystrokes = buffers.timestamps.iter().filter(|&&t| in_window(t)).count();
    let thinking_pauses = buffers
        .pauses
        .iter()
        .filter(|p| in_window(p.at) && p.duration_ms > thresholds.thinking_pause_ms)
        .count();
    let pause_frequency = (thinking_pauses as f64 / recent_keystrokes.max(1) as f64).min(1.0);

    let rhythm: Vec<f64> = buffers
        .rhythm
        .recent(load.rhythm_sample_size)
        .copied()
        .collect();
    let rhythm_variance = if rhythm.len() < load.min_rhythm_samples {
        0.0
    } else {
        normalized_variance(&rhythm).map(|v| v.min(1.0)).unwrap_or(0.0)
    };

    let score = load.backspace_weight * backspace_ratio
        + load.pause_weight * pause_frequency
        + load.rhythm_weight * rhythm_variance;

    LoadComponents {
        backspace_ratio,
        pause_frequency,
        rhythm_variance,
        score: clamp_unit(score),
    }
}

/// Confidence score and the counts it was built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceComponents {
    /// Pauses between the short-pause bound and the thinking-pause threshold
    pub short_pauses: u32,
    /// Revisions among the most recent revision window
    pub recent_revisions: u32,
    /// Sentence-level restructurings among those revisions
    pub sentence_restructuring: u32,
    pub hesitation_score: f64,
    pub revision_score: f64,
    pub score: f64,
}

/// Score confidence as the absence of short hesitations and revisions.
pub fn confidence_score(buffers: &SignalBuffers, config: &EngineConfig) -> ConfidenceComponents {
    let conf = &config.confidence;
    let thresholds = &config.thresholds;

    let short_pauses = buffers
        .pauses
        .iter()
        .filter(|p| {
            p.duration_ms > thresholds.short_pause_min_ms
                && p.duration_ms < thresholds.thinking_pause_ms
        })
        .count() as u32;

    let mut recent_revisions = 0u32;
    let mut sentence_restructuring = 0u32;
    for revision in buffers.revisions.recent(conf.revision_window) {
        recent_revisions += 1;
        if revision.kind == RevisionKind::SentenceRestructuring {
            sentence_restructuring += 1;
        }
    }

    let hesitation_score = (short_pauses as f64 / conf.hesitation_saturation).min(1.0);
    let revision_score = (recent_revisions as f64 / conf.revision_saturation).min(1.0);
    let score = 1.0 - conf.hesitation_weight * hesitation_score - conf.revision_weight * revision_score;

    ConfidenceComponents {
        short_pauses,
        recent_revisions,
        sentence_restructuring,
        hesitation_score,
        revision_score,
        score: clamp_unit(score),
    }
}

/// Bounded history of one metric's scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreHistory {
    scores: SlidingWindow<f64>,
}

impl ScoreHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            scores: SlidingWindow::new(capacity),
        }
    }

    pub fn record(&mut self, score: f64) {
        self.scores.push(score);
    }

    /// Mean of the recorded scores (0 when empty).
    pub fn average(&self) -> f64 {
        if self.scores.is_empty() {
            0.0
        } else {
            self.scores.iter().mean()
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Tracks streaks of cycles whose flow score exceeds the peak threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowPeakTracker {
    streak_start: Option<DateTime<Utc>>,
    peak_duration_ms: f64,
    last_peak: Option<DateTime<Utc>>,
}

impl FlowPeakTracker {
    pub fn update(&mut self, score: f64, threshold: f64, now: DateTime<Utc>) {
        if score > threshold {
            let start = *self.streak_start.get_or_insert(now);
            self.peak_duration_ms = self.peak_duration_ms.max(millis_between(start, now));
            self.last_peak = Some(now);
        } else {
            self.streak_start = None;
        }
    }

    /// Longest streak so far, first to last qualifying cycle, in milliseconds.
    pub fn peak_duration_ms(&self) -> f64 {
        self.peak_duration_ms
    }

    pub fn last_peak(&self) -> Option<DateTime<Utc>> {
        self.last_peak
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
