//! Shared application state for the Observer API server.
//!
//! [`AppState`] pairs the authoritative [`StateStore`] and the ingestion
//! [`Diagnostics`] with a broadcast channel that fans published changes
//! out to every connected `WebSocket` client.

use std::sync::Arc;

use blockwatch_core::{ChangeSink, Diagnostics, StateStore};
use blockwatch_types::StateChange;
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the broadcast channel for state changes.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message. It can re-sync from `GET /api/layout`.
pub const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Broadcast sender for published changes.
    pub tx: broadcast::Sender<StateChange>,
    /// The layout model, shared with the ingestion path.
    pub store: Arc<StateStore>,
    /// Ingestion counters, shared with the ingestion path.
    pub diagnostics: Arc<Diagnostics>,
}

impl AppState {
    /// Create application state over an existing store and counters.
    pub fn new(store: Arc<StateStore>, diagnostics: Arc<Diagnostics>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            store,
            diagnostics,
        }
    }

    /// Subscribe to the change broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.tx.subscribe()
    }

    /// Publish a change to all connected clients.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if no clients are connected (this is not an error).
    pub fn broadcast(&self, change: &StateChange) -> usize {
        // send returns Err only when there are zero receivers,
        // which is normal when no WebSocket clients are connected.
        self.tx.send(change.clone()).unwrap_or(0)
    }

    /// A publisher sink that feeds this state's broadcast channel.
    pub fn sink(self: &Arc<Self>) -> BroadcastSink {
        BroadcastSink {
            state: Arc::clone(self),
        }
    }
}

/// [`ChangeSink`] that forwards each change to `WebSocket` clients.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    state: Arc<AppState>,
}

impl ChangeSink for BroadcastSink {
    fn deliver(&mut self, change: &StateChange) {
        let receivers = self.state.broadcast(change);
        trace!(
            entity_kind = ?change.entity_kind,
            entity_id = change.entity_id,
            receivers,
            "change broadcast sent"
        );
    }
}
