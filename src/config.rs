//! Configuration for the signal engine.
//!
//! Every constant the engine uses is exposed here so hosts can tune the
//! thresholds without recompiling. Defaults reproduce the reference tracker.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Longest accepted aggregation period.
pub const MAX_AGGREGATION_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Largest accepted timing threshold (one day).
pub const MAX_THRESHOLD_MS: f64 = 86_400_000.0;

/// Main configuration for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacities of the bounded buffers
    pub buffers: BufferConfig,

    /// Period between two aggregation cycles
    #[serde(with = "duration_ms")]
    pub aggregation_period: Duration,

    /// Pause and window thresholds
    pub thresholds: ThresholdConfig,

    /// Flow score parameters
    pub flow: FlowConfig,

    /// Cognitive load score parameters
    pub load: LoadConfig,

    /// Confidence score parameters
    pub confidence: ConfidenceConfig,

    /// Pattern classification thresholds
    pub patterns: PatternConfig,

    /// Placeholder typing-pressure signal
    pub pressure: PressureConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffers: BufferConfig::default(),
            aggregation_period: Duration::from_millis(2000),
            thresholds: ThresholdConfig::default(),
            flow: FlowConfig::default(),
            load: LoadConfig::default(),
            confidence: ConfidenceConfig::default(),
            patterns: PatternConfig::default(),
            pressure: PressureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Capacity of the timestamp, pause, rhythm and pressure buffers
    pub raw_capacity: usize,
    /// Capacity of each calculator's score history
    pub history_capacity: usize,
    /// Capacity of the revision event log
    pub revision_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            raw_capacity: 100,
            history_capacity: 50,
            revision_capacity: 100,
        }
    }
}

/// Timing thresholds, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Minimum gap recorded as a pause
    pub pause_ms: f64,
    /// Gap that breaks flow sustainability
    pub sustain_pause_ms: f64,
    /// Pause long enough to count as hesitation
    pub hesitation_pause_ms: f64,
    /// Pause counted towards cognitive load
    pub thinking_pause_ms: f64,
    /// Lower bound (exclusive) of a short hesitation pause
    pub short_pause_min_ms: f64,
    /// Trailing window for cognitive load
    pub cognitive_window_ms: f64,
    /// Intervals below this are burst keystrokes
    pub burst_ms: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            pause_ms: 100.0,
            sustain_pause_ms: 3000.0,
            hesitation_pause_ms: 2000.0,
            thinking_pause_ms: 1000.0,
            short_pause_min_ms: 200.0,
            cognitive_window_ms: 30_000.0,
            burst_ms: 150.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Timestamps required before a flow score is produced
    pub min_timestamps: usize,
    /// Number of trailing timestamps analysed
    pub sample_size: usize,
    pub consistency_weight: f64,
    pub sustainability_weight: f64,
    pub momentum_weight: f64,
    /// Score above which a cycle counts towards a flow peak
    pub peak_threshold: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            min_timestamps: 10,
            sample_size: 20,
            consistency_weight: 0.4,
            sustainability_weight: 0.4,
            momentum_weight: 0.2,
            peak_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Number of trailing rhythm samples analysed
    pub rhythm_sample_size: usize,
    /// Rhythm samples required before variance contributes
    pub min_rhythm_samples: usize,
    pub backspace_weight: f64,
    pub pause_weight: f64,
    pub rhythm_weight: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            rhythm_sample_size: 20,
            min_rhythm_samples: 6,
            backspace_weight: 0.4,
            pause_weight: 0.4,
            rhythm_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Number of most recent revisions considered
    pub revision_window: usize,
    /// Short pause count at which hesitation saturates
    pub hesitation_saturation: f64,
    /// Revision count at which the revision score saturates
    pub revision_saturation: f64,
    pub hesitation_weight: f64,
    pub revision_weight: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            revision_window: 10,
            hesitation_saturation: 20.0,
            revision_saturation: 5.0,
            hesitation_weight: 0.6,
            revision_weight: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Number of trailing rhythm samples inspected
    pub rhythm_samples: usize,
    /// Number of trailing pauses inspected
    pub pause_samples: usize,
    /// Rhythm samples required for burst/rhythmic classification
    pub min_rhythm_samples: usize,
    /// Share of fast intervals above which typing is bursty
    pub burst_share: f64,
    /// Normalized variance below which typing is rhythmic
    pub rhythmic_variance: f64,
    /// Share of long pauses above which the writer hesitates
    pub hesitation_share: f64,
    /// Flow score above which the flow pattern may fire
    pub flow_score: f64,
    /// Load score above which overload may fire
    pub overload_load: f64,
    /// Backspace frequency above which overload may fire
    pub overload_backspace: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            rhythm_samples: 20,
            pause_samples: 10,
            min_rhythm_samples: 10,
            burst_share: 0.7,
            rhythmic_variance: 0.3,
            hesitation_share: 0.3,
            flow_score: 0.7,
            overload_load: 0.7,
            overload_backspace: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureConfig {
    pub min: f64,
    pub max: f64,
    /// Seed for the sampler; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            min: 0.3,
            max: 0.7,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("journal-biometrics")
            .join("config.json")
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.buffers;
        if b.raw_capacity == 0 || b.history_capacity == 0 || b.revision_capacity == 0 {
            return Err(ConfigError::Invalid("buffer capacities must be non-zero".into()));
        }
        if self.aggregation_period.is_zero() || self.aggregation_period > MAX_AGGREGATION_PERIOD {
            return Err(ConfigError::Invalid(format!(
                "aggregation period must be between 1 ms and {} ms",
                MAX_AGGREGATION_PERIOD.as_millis()
            )));
        }

        let sample_counts = [
            ("flow.min_timestamps", self.flow.min_timestamps),
            ("load.rhythm_sample_size", self.load.rhythm_sample_size),
            ("load.min_rhythm_samples", self.load.min_rhythm_samples),
            ("confidence.revision_window", self.confidence.revision_window),
            ("patterns.rhythm_samples", self.patterns.rhythm_samples),
            ("patterns.pause_samples", self.patterns.pause_samples),
            ("patterns.min_rhythm_samples", self.patterns.min_rhythm_samples),
        ];
        if let Some((name, _)) = sample_counts.iter().find(|(_, n)| *n == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
        }
        if self.flow.sample_size < 2 {
            return Err(ConfigError::Invalid("flow.sample_size must be at least 2".into()));
        }

        let t = &self.thresholds;
        let thresholds = [
            ("pause_ms", t.pause_ms),
            ("sustain_pause_ms", t.sustain_pause_ms),
            ("hesitation_pause_ms", t.hesitation_pause_ms),
            ("thinking_pause_ms", t.thinking_pause_ms),
            ("short_pause_min_ms", t.short_pause_min_ms),
            ("cognitive_window_ms", t.cognitive_window_ms),
            ("burst_ms", t.burst_ms),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value <= 0.0 || value > MAX_THRESHOLD_MS {
                return Err(ConfigError::Invalid(format!(
                    "thresholds.{name} = {value} must be in (0, {MAX_THRESHOLD_MS}] ms"
                )));
            }
        }
        if t.short_pause_min_ms >= t.thinking_pause_ms {
            return Err(ConfigError::Invalid(
                "thresholds.short_pause_min_ms must be below thinking_pause_ms".into(),
            ));
        }

        let weights = [
            self.flow.consistency_weight,
            self.flow.sustainability_weight,
            self.flow.momentum_weight,
            self.load.backspace_weight,
            self.load.pause_weight,
            self.load.rhythm_weight,
            self.confidence.hesitation_weight,
            self.confidence.revision_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid("weights must be finite and non-negative".into()));
        }
        let saturations = [
            self.confidence.hesitation_saturation,
            self.confidence.revision_saturation,
        ];
        if saturations.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(ConfigError::Invalid("saturation points must be positive".into()));
        }

        let pc = &self.patterns;
        let shares = [
            ("flow.peak_threshold", self.flow.peak_threshold),
            ("patterns.burst_share", pc.burst_share),
            ("patterns.hesitation_share", pc.hesitation_share),
            ("patterns.flow_score", pc.flow_score),
            ("patterns.overload_load", pc.overload_load),
            ("patterns.overload_backspace", pc.overload_backspace),
        ];
        // NaN fails `contains`, so this also rejects non-finite values.
        if let Some((name, value)) = shares.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            return Err(ConfigError::Invalid(format!("{name} = {value} must lie within [0, 1]")));
        }
        if !pc.rhythmic_variance.is_finite() || pc.rhythmic_variance < 0.0 {
            return Err(ConfigError::Invalid(
                "patterns.rhythmic_variance must be finite and non-negative".into(),
            ));
        }

        let p = &self.pressure;
        if !(0.0..=1.0).contains(&p.min) || !(0.0..=1.0).contains(&p.max) || p.min > p.max {
            return Err(ConfigError::Invalid(format!(
                "pressure range [{}, {}] must lie within [0, 1]",
                p.min, p.max
            )));
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.aggregation_period, Duration::from_millis(2000));
        assert_eq!(config.buffers.raw_capacity, 100);
        assert_eq!(config.buffers.history_capacity, 50);
        assert_eq!(config.thresholds.pause_ms, 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"aggregation_period": 500, "thresholds": {"burst_ms": 120}}"#)
                .unwrap();
        assert_eq!(config.aggregation_period, Duration::from_millis(500));
        assert_eq!(config.thresholds.burst_ms, 120.0);
        assert_eq!(config.thresholds.pause_ms, 100.0);
        assert_eq!(config.flow.sample_size, 20);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.buffers.raw_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EngineConfig::default();
        config.aggregation_period = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.load.pause_weight = -0.1;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.pressure.min = 0.8;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.thresholds.pause_ms = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.thresholds.burst_ms = -1.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.thresholds.cognitive_window_ms = 1e20;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.thresholds.short_pause_min_ms = 1000.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.patterns.burst_share = -5.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.patterns.hesitation_share = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.patterns.overload_backspace = 1.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.patterns.pause_samples = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.confidence.revision_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_aggregation_period() {
        let mut config = EngineConfig::default();
        config.aggregation_period = MAX_AGGREGATION_PERIOD;
        assert!(config.validate().is_ok());

        config.aggregation_period = Duration::from_millis(u64::MAX);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_rejects_invalid_thresholds() {
        let path = std::env::temp_dir().join("journal-biometrics-invalid-config-test.json");
        std::fs::write(&path, r#"{"thresholds": {"cognitive_window_ms": 1e20}}"#).unwrap();

        assert!(matches!(
            EngineConfig::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("journal-biometrics-config-test.json");
        std::fs::write(&path, r#"{"pressure": {"seed": 7}}"#).unwrap();

        let config = EngineConfig::load_from(&path).unwrap();
        assert_eq!(config.pressure.seed, Some(7));
        assert_eq!(config.pressure.min, 0.3);

        std::fs::remove_file(&path).ok();
    }
}
