//! Replay of recorded key events on a virtual clock.
//!
//! Instead of waiting on wall-clock ticks, the replayer derives cycle
//! instants from the events themselves: the session is activated at the
//! first event and a cycle runs at every `activation + k * period` the
//! stream crosses. Output depends only on the input and the configuration,
//! which makes recorded sessions reproducible.

use crate::collector::types::KeyEvent;
use crate::config::ConfigError;
use crate::core::signature::BehavioralSignature;
use crate::engine::SignalEngine;
use crate::error::EngineError;
use crate::sink::SignatureSink;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Drives a [`SignalEngine`] through a recorded event stream.
pub struct Replayer<S> {
    engine: SignalEngine,
    sink: S,
    period: Duration,
}

impl<S: SignatureSink> Replayer<S> {
    /// Fails when the engine's configuration does not validate.
    pub fn new(engine: SignalEngine, sink: S) -> Result<Self, EngineError> {
        engine.config().validate()?;
        let period = Duration::from_std(engine.config().aggregation_period).map_err(|_| {
            ConfigError::Invalid("aggregation period exceeds the replay clock range".into())
        })?;
        Ok(Self {
            engine,
            sink,
            period,
        })
    }

    /// Replay `events` as one tracking session.
    ///
    /// Cycles fire at each period boundary reached by an event, before that
    /// event is ingested, and once more one period after the last event.
    /// Returns the number of signatures delivered.
    pub fn run(
        &mut self,
        user_id: &str,
        session_id: Uuid,
        events: &[KeyEvent],
    ) -> Result<usize, EngineError> {
        let Some(first) = events.first() else {
            return Ok(0);
        };

        let activated_at = first.timestamp;
        self.engine.activate_with_session_id(user_id, session_id);

        let mut next_tick = activated_at + self.period;
        let mut delivered = 0;
        let mut last_seen = activated_at;

        for event in events {
            while next_tick <= event.timestamp {
                delivered += self.cycle(next_tick)?;
                next_tick += self.period;
            }
            self.engine.on_key_event(&event.key, event.timestamp);
            last_seen = last_seen.max(event.timestamp);
        }

        let end = last_seen + self.period;
        while next_tick <= end {
            delivered += self.cycle(next_tick)?;
            next_tick += self.period;
        }

        self.engine.deactivate();
        tracing::debug!(events = events.len(), delivered, "replay finished");
        Ok(delivered)
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn cycle(&mut self, at: DateTime<Utc>) -> Result<usize, EngineError> {
        match self.engine.aggregate(at) {
            Some(signature) => {
                self.sink.deliver(signature)?;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

/// Replay `events` and collect every signature in order.
pub fn replay_to_vec(
    engine: SignalEngine,
    user_id: &str,
    session_id: Uuid,
    events: &[KeyEvent],
) -> Result<Vec<BehavioralSignature>, EngineError> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut replayer = Replayer::new(engine, crate::sink::ChannelSink::new(tx))?;
    replayer.run(user_id, session_id, events)?;
    drop(replayer);
    Ok(rx.try_iter().collect())
}
