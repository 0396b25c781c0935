//! Live aggregation scheduling.
//!
//! [`spawn_tracker`] moves a [`SignalEngine`] into a single tokio task.
//! Key events arrive over a channel and a fixed-period interval triggers
//! aggregation cycles; both are handled by the same task, so buffers are
//! never read while an event is half-ingested. Cancellation is checked
//! before anything else on every wakeup, and no cycle runs after it. A due
//! tick is served before queued events so a busy feed cannot delay it.

use crate::collector::types::KeyEvent;
use crate::engine::SignalEngine;
use crate::error::EngineError;
use crate::sink::SignatureSink;
use crate::stats::{SessionStats, SharedSessionStats, StatsSnapshot};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

/// Cooperative cancellation signal shared between a tracker and its owners.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Handle to a running tracker task.
pub struct TrackerHandle {
    events: mpsc::UnboundedSender<KeyEvent>,
    cancel: CancellationToken,
    stats: SharedSessionStats,
    session_id: Uuid,
    task: JoinHandle<SignalEngine>,
}

impl TrackerHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Forward a key press stamped with the current time.
    pub fn key_event(&self, key: &str) -> Result<(), EngineError> {
        self.send(KeyEvent::now(key))
    }

    /// Forward a key event as-is.
    pub fn send(&self, event: KeyEvent) -> Result<(), EngineError> {
        self.events
            .send(event)
            .map_err(|_| EngineError::TrackerStopped)
    }

    /// A sender that can feed the tracker from another thread.
    pub fn sender(&self) -> mpsc::UnboundedSender<KeyEvent> {
        self.events.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the tracker and wait for its task to finish.
    pub async fn stop(self) -> StatsSnapshot {
        self.cancel.cancel();
        self.wait().await
    }

    /// Wait for the tracker to end through its cancellation token.
    pub async fn wait(self) -> StatsSnapshot {
        let TrackerHandle {
            events,
            stats,
            task,
            ..
        } = self;
        // Dropping our sender lets the task end once every other sender is gone too.
        drop(events);

        if let Err(e) = task.await {
            tracing::error!("tracker task failed: {e}");
        }
        stats.snapshot()
    }
}

/// Activate `engine` for `user_id` and run it on the current tokio runtime.
///
/// Every `aggregation_period` the engine runs one cycle and the resulting
/// signature goes to `sink`. Must be called from within a tokio runtime.
/// Fails when the engine's configuration does not validate.
pub fn spawn_tracker<S: SignatureSink>(
    mut engine: SignalEngine,
    user_id: impl Into<String>,
    sink: S,
) -> Result<TrackerHandle, EngineError> {
    engine.config().validate()?;
    let session_id = engine.activate(user_id);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let stats: SharedSessionStats = Arc::new(SessionStats::new());

    let task = tokio::spawn(run_tracker(
        engine,
        events_rx,
        sink,
        cancel.clone(),
        stats.clone(),
    ));

    Ok(TrackerHandle {
        events: events_tx,
        cancel,
        stats,
        session_id,
        task,
    })
}

async fn run_tracker<S: SignatureSink>(
    mut engine: SignalEngine,
    mut events: mpsc::UnboundedReceiver<KeyEvent>,
    mut sink: S,
    cancel: CancellationToken,
    stats: SharedSessionStats,
) -> SignalEngine {
    let period = engine.config().aggregation_period;
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            _ = ticker.tick() => {
                if cancel.is_cancelled() {
                    break;
                }
                if let Some(signature) = engine.aggregate(Utc::now()) {
                    stats.record_cycle();
                    match sink.deliver(signature) {
                        Ok(()) => stats.record_delivery(true),
                        Err(e) => {
                            stats.record_delivery(false);
                            tracing::warn!("failed to deliver signature: {e}");
                        }
                    }
                }
            }

            event = events.recv() => match event {
                Some(event) => {
                    stats.record_keystroke(event.kind().is_backspace());
                    engine.on_key_event(&event.key, event.timestamp);
                }
                None => {
                    tracing::debug!("all key event senders dropped");
                    break;
                }
            },
        }
    }

    engine.deactivate();
    engine
}
