//! Keystroke ingestion.
//!
//! Each key press updates the raw buffers synchronously: the timestamp is
//! recorded, the gap since the previous key is classified as a pause when it
//! is long enough, and the rhythm and pressure buffers advance.

use crate::collector::types::KeyKind;
use crate::config::{EngineConfig, PressureConfig};
use crate::core::buffers::{millis_between, PauseSample, RevisionEvent, RevisionKind, SignalBuffers};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-session keystroke ingestor.
#[derive(Debug, Clone)]
pub struct EventIngestor {
    /// Minimum gap (ms) recorded as a pause
    pause_threshold_ms: f64,
    pressure_min: f64,
    pressure_max: f64,
    rng: StdRng,
    last_keystroke: Option<DateTime<Utc>>,
    /// Length of the deletion run in progress
    backspace_run: u32,
}

impl EventIngestor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            pause_threshold_ms: config.thresholds.pause_ms,
            pressure_min: config.pressure.min,
            pressure_max: config.pressure.max,
            rng: pressure_rng(&config.pressure),
            last_keystroke: None,
            backspace_run: 0,
        }
    }

    /// Record one key press at `now`.
    pub fn ingest(&mut self, buffers: &mut SignalBuffers, kind: KeyKind, now: DateTime<Utc>) {
        buffers.timestamps.push(now);

        if let Some(last) = self.last_keystroke {
            let gap = millis_between(last, now);
            if gap > self.pause_threshold_ms {
                buffers.pauses.push(PauseSample {
                    at: now,
                    duration_ms: gap,
                });
            }
        }

        if kind.is_backspace() {
            buffers.backspace_count += 1;
            self.backspace_run += 1;
        } else if self.backspace_run > 0 {
            buffers.revisions.push(RevisionEvent {
                at: now,
                kind: RevisionKind::from_run_length(self.backspace_run),
                length: self.backspace_run,
            });
            self.backspace_run = 0;
        }
        buffers.total_keystrokes += 1;

        if buffers.timestamps.len() >= 2 {
            let mut latest = buffers.timestamps.iter().rev();
            if let (Some(current), Some(previous)) = (latest.next(), latest.next()) {
                buffers.rhythm.push(millis_between(*previous, *current));
            }
        }

        buffers.pressure.push(self.sample_pressure());
        self.last_keystroke = Some(now);

        tracing::trace!(?kind, total = buffers.total_keystrokes, "keystroke ingested");
    }

    /// Time of the most recent keystroke.
    pub fn last_keystroke(&self) -> Option<DateTime<Utc>> {
        self.last_keystroke
    }

    fn sample_pressure(&mut self) -> f64 {
        if self.pressure_max > self.pressure_min {
            self.rng.gen_range(self.pressure_min..=self.pressure_max)
        } else {
            self.pressure_min
        }
    }
}

fn pressure_rng(config: &PressureConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
