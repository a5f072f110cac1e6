//! The per-line reconciliation pipeline.
//!
//! [`Reconciler::process_line`] runs one raw line through parse, apply,
//! publish, and diagnostics. Decoding finishes before the store is touched,
//! so a rejected line never leaves a partial update behind.

use std::sync::Arc;

use blockwatch_types::StateChange;
use tracing::{debug, trace, warn};

use crate::classify::ParseMode;
use crate::decode::{parse_line, Event};
use crate::diagnostics::Diagnostics;
use crate::error::{LineError, PublishError};
use crate::publish::{ChangePublisher, PublishOutcome};
use crate::store::StateStore;

/// What processing one line did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// An entity changed and the change was handed to the publisher.
    Changed {
        /// The committed change.
        change: StateChange,
        /// Whether the display queue accepted it.
        publish: PublishOutcome,
    },
    /// The event was valid but the entity already held that value.
    Unchanged,
    /// The line was dropped before reaching the store.
    Rejected(LineError),
}

/// Owns the pieces of the pipeline that outlive a single line.
#[derive(Debug)]
pub struct Reconciler {
    mode: ParseMode,
    store: Arc<StateStore>,
    publisher: ChangePublisher,
    diagnostics: Arc<Diagnostics>,
}

impl Reconciler {
    /// Assemble a reconciler around a shared store and a running publisher.
    pub const fn new(
        mode: ParseMode,
        store: Arc<StateStore>,
        publisher: ChangePublisher,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            mode,
            store,
            publisher,
            diagnostics,
        }
    }

    /// The store this reconciler writes to.
    pub const fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// The counters this reconciler records into.
    pub const fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Run one raw line through the pipeline.
    pub async fn process_line(&self, line: &str) -> LineOutcome {
        self.diagnostics.record_line();

        let event = match parse_line(line, self.mode) {
            Ok(Event::Unrecognized { raw_line }) => {
                debug!(line = %raw_line, "unclassified line dropped");
                return self.reject(LineError::UnclassifiedLine);
            }
            Ok(event) => event,
            Err(error) => {
                warn!(line, error = %error, "status line dropped");
                return self.reject(error);
            }
        };

        self.diagnostics.record_applied();
        let Some(change) = self.store.apply(&event) else {
            trace!(?event, "state already current");
            return LineOutcome::Unchanged;
        };

        debug!(
            entity_kind = ?change.entity_kind,
            entity_id = change.entity_id,
            new_value = ?change.new_value,
            "layout state committed"
        );
        let publish = self.publisher.publish(change.clone()).await;
        LineOutcome::Changed { change, publish }
    }

    fn reject(&self, error: LineError) -> LineOutcome {
        self.diagnostics.record_rejected(&error);
        LineOutcome::Rejected(error)
    }

    /// Stop accepting lines and flush every committed change to the sink.
    ///
    /// Returns how many changes the sink received.
    pub async fn finish(self) -> Result<u64, PublishError> {
        self.publisher.finish().await
    }
}
