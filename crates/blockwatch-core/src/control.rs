//! Cooperative stop signal for the ingestion loop.
//!
//! [`IngestControl`] is wrapped in [`Arc`](std::sync::Arc) and shared
//! between the ingestion loop and whatever asks it to stop (a Ctrl-C
//! handler, a supervisor, a test). The flag is an atomic so the loop can
//! check it without locking; the [`Notify`] wakes a loop that is parked
//! waiting for the next line.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Shared stop state.
#[derive(Debug, Default)]
pub struct IngestControl {
    stop_requested: AtomicBool,
    stop_notify: Notify,
}

impl IngestControl {
    /// Create a control with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the ingestion loop to stop. Idempotent.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    ///
    /// Returns immediately if one already has been.
    pub async fn stopped(&self) {
        loop {
            // Register before checking so a request between the check and
            // the await is not missed.
            let notified = self.stop_notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }
}
