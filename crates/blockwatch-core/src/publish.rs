//! Bounded hand-off from the state store to a display.
//!
//! Changes go into a [`tokio::sync::mpsc`] queue drained by a spawned task
//! that calls a [`ChangeSink`] in queue order. Ingestion waits for queue
//! space at most `send_timeout`; a change that cannot be queued in time is
//! dropped with a diagnostic rather than retried, so a stalled display
//! cannot stall the layout model.
//!
//! Ordering: changes are queued in the order the store produced them and
//! delivered in queue order, so per-entity order is preserved.

use std::sync::Arc;
use std::time::Duration;

use blockwatch_types::StateChange;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PublisherConfig;
use crate::diagnostics::Diagnostics;
use crate::error::PublishError;

/// Receives committed changes, one at a time, in order.
///
/// Implementations render or forward the change. They run on the
/// publisher task, never on the ingestion path.
pub trait ChangeSink: Send + 'static {
    /// Handle one change.
    fn deliver(&mut self, change: &StateChange);
}

/// A sink that logs each change. Used when no display is attached.
#[derive(Debug, Default)]
pub struct LogSink;

impl ChangeSink for LogSink {
    fn deliver(&mut self, change: &StateChange) {
        info!(
            entity_kind = ?change.entity_kind,
            entity_id = change.entity_id,
            new_value = ?change.new_value,
            "layout state changed"
        );
    }
}

/// What happened to a change handed to [`ChangePublisher::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Queued for the sink.
    Queued,
    /// Dropped: the queue stayed full past the timeout, or was closed.
    Dropped,
}

/// Producer side of the hand-off, plus the drain task it owns.
#[derive(Debug)]
pub struct ChangePublisher {
    tx: mpsc::Sender<StateChange>,
    send_timeout: Duration,
    diagnostics: Arc<Diagnostics>,
    task: JoinHandle<u64>,
}

impl ChangePublisher {
    /// Spawn the drain task for `sink` on the current tokio runtime.
    pub fn spawn<S: ChangeSink>(
        sink: S,
        config: &PublisherConfig,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let task = tokio::spawn(drain(rx, sink, Arc::clone(&diagnostics)));
        debug!(
            queue_capacity = config.queue_capacity,
            send_timeout_ms = config.send_timeout_ms,
            "change publisher started"
        );
        Self {
            tx,
            send_timeout: config.send_timeout(),
            diagnostics,
            task,
        }
    }

    /// Queue a change for the sink.
    pub async fn publish(&self, change: StateChange) -> PublishOutcome {
        match self.tx.send_timeout(change, self.send_timeout).await {
            Ok(()) => PublishOutcome::Queued,
            Err(SendTimeoutError::Timeout(change)) => {
                self.diagnostics.record_publish_dropped();
                warn!(
                    entity_kind = ?change.entity_kind,
                    entity_id = change.entity_id,
                    timeout_ms = self.send_timeout.as_millis(),
                    "display queue full, change dropped"
                );
                PublishOutcome::Dropped
            }
            Err(SendTimeoutError::Closed(change)) => {
                self.diagnostics.record_publish_dropped();
                warn!(
                    entity_kind = ?change.entity_kind,
                    entity_id = change.entity_id,
                    "display queue closed, change dropped"
                );
                PublishOutcome::Dropped
            }
        }
    }

    /// Close the queue and wait until every queued change is delivered.
    ///
    /// Returns how many changes the sink received over the publisher's
    /// lifetime.
    pub async fn finish(self) -> Result<u64, PublishError> {
        let Self { tx, task, .. } = self;
        drop(tx);
        let delivered = task
            .await
            .map_err(|e| PublishError::Task(e.to_string()))?;
        debug!(delivered, "change publisher drained");
        Ok(delivered)
    }
}

async fn drain<S: ChangeSink>(
    mut rx: mpsc::Receiver<StateChange>,
    mut sink: S,
    diagnostics: Arc<Diagnostics>,
) -> u64 {
    let mut delivered: u64 = 0;
    while let Some(change) = rx.recv().await {
        sink.deliver(&change);
        diagnostics.record_published();
        delivered = delivered.saturating_add(1);
    }
    delivered
}
