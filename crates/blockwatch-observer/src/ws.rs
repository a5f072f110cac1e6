//! `WebSocket` handler for real-time layout streaming.
//!
//! Clients connect to `GET /ws/changes` and receive JSON
//! [`StreamFrame`]s: a full [`Snapshot`](StreamFrame::Snapshot) on connect,
//! then one [`Change`](StreamFrame::Change) per published state change.
//!
//! A display keeps only the latest value per entity, so a skipped change
//! could leave it wrong indefinitely. When a client falls behind the
//! broadcast buffer, the backlog is discarded and a fresh snapshot is sent
//! in its place. Changes already queued behind the snapshot may repeat
//! values it contains; replaying them converges on the same state.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use blockwatch_types::{StateChange, StreamFrame};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming the layout.
///
/// # Route
///
/// `GET /ws/changes`
pub async fn ws_changes(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Per-client view of the change broadcast.
///
/// Subscribes before the first snapshot is taken, so no change can fall
/// between the two.
#[derive(Debug)]
pub struct ChangeFeed {
    state: Arc<AppState>,
    rx: broadcast::Receiver<StateChange>,
    needs_snapshot: bool,
}

impl ChangeFeed {
    /// Subscribe a new client.
    pub fn subscribe(state: Arc<AppState>) -> Self {
        let rx = state.subscribe();
        Self {
            state,
            rx,
            needs_snapshot: true,
        }
    }

    /// The next frame for this client, or `None` once the broadcast closes.
    ///
    /// Cancel-safe: nothing is taken from the channel after the only await.
    pub async fn next_frame(&mut self) -> Option<StreamFrame> {
        if self.needs_snapshot {
            self.needs_snapshot = false;
            return Some(self.snapshot());
        }

        match self.rx.recv().await {
            Ok(change) => Some(StreamFrame::Change(change)),
            Err(RecvError::Lagged(skipped)) => {
                let discarded = self.discard_backlog();
                debug!(skipped, discarded, "WebSocket client lagged, resending layout");
                Some(self.snapshot())
            }
            Err(RecvError::Closed) => None,
        }
    }

    fn snapshot(&self) -> StreamFrame {
        StreamFrame::Snapshot(self.state.store.snapshot())
    }

    /// Drop every change still buffered for this client.
    fn discard_backlog(&mut self) -> u64 {
        let mut discarded: u64 = 0;
        loop {
            match self.rx.try_recv() {
                Ok(_) => discarded = discarded.saturating_add(1),
                Err(TryRecvError::Lagged(n)) => discarded = discarded.saturating_add(n),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return discarded,
            }
        }
    }
}

/// Forward frames to the client until either side goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut feed = ChangeFeed::subscribe(state);

    loop {
        tokio::select! {
            frame = feed.next_frame() => {
                let Some(frame) = frame else {
                    debug!("Broadcast channel closed, shutting down WebSocket");
                    return;
                };
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize stream frame: {e}");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!("WebSocket client disconnected (send failed)");
                    return;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use blockwatch_core::{Diagnostics, Event, StateStore};
    use blockwatch_types::{BlockId, OccupancyState};

    use super::*;
    use crate::state::BROADCAST_CAPACITY;

    fn state_with_block() -> Arc<AppState> {
        let store = Arc::new(StateStore::default());
        store.apply(&Event::BlockState {
            block_id: BlockId::new(4),
            state: OccupancyState::Running,
        });
        Arc::new(AppState::new(store, Arc::new(Diagnostics::new())))
    }

    fn snapshot_blocks(frame: Option<StreamFrame>) -> Vec<(BlockId, OccupancyState)> {
        match frame {
            Some(StreamFrame::Snapshot(snapshot)) => snapshot.blocks.into_iter().collect(),
            other => panic!("expected a snapshot frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_frame_is_the_current_layout() {
        let state = state_with_block();
        let mut feed = ChangeFeed::subscribe(Arc::clone(&state));
        assert_eq!(
            snapshot_blocks(feed.next_frame().await),
            vec![(BlockId::new(4), OccupancyState::Running)]
        );

        let change = StateChange::block(BlockId::new(4), OccupancyState::Standing);
        state.broadcast(&change);
        assert_eq!(feed.next_frame().await, Some(StreamFrame::Change(change)));
    }

    #[tokio::test]
    async fn lagging_client_gets_a_fresh_snapshot() {
        let state = state_with_block();
        let mut feed = ChangeFeed::subscribe(Arc::clone(&state));
        feed.next_frame().await;

        // Overrun the client's buffer. Block 9 only ever changes once, so
        // without a resync the client would never learn about it.
        state.store.apply(&Event::BlockState {
            block_id: BlockId::new(9),
            state: OccupancyState::Standing,
        });
        state.broadcast(&StateChange::block(BlockId::new(9), OccupancyState::Standing));
        for _ in 0..BROADCAST_CAPACITY {
            state.broadcast(&StateChange::block(BlockId::new(4), OccupancyState::Running));
        }

        assert_eq!(
            snapshot_blocks(feed.next_frame().await),
            vec![
                (BlockId::new(4), OccupancyState::Running),
                (BlockId::new(9), OccupancyState::Standing),
            ]
        );

        // The backlog was discarded; the next frame is the next live change.
        let next = StateChange::block(BlockId::new(4), OccupancyState::Off);
        state.broadcast(&next);
        assert_eq!(feed.next_frame().await, Some(StreamFrame::Change(next)));
    }

    #[tokio::test]
    async fn closed_broadcast_ends_the_feed() {
        let (tx, rx) = broadcast::channel(1);
        drop(tx);
        let mut feed = ChangeFeed {
            state: state_with_block(),
            rx,
            needs_snapshot: false,
        };
        assert_eq!(feed.next_frame().await, None);
    }
}
