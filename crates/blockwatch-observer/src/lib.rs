//! Observer API server for Blockwatch.
//!
//! This crate is the read side of the layout model. It serves:
//!
//! - **`WebSocket` endpoint** (`/ws/changes`) streaming a layout snapshot
//!   followed by every published [`StateChange`] via
//!   [`tokio::sync::broadcast`]
//! - **REST endpoints** for querying the current blocks, tracks, and
//!   ingestion diagnostics
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Handlers read straight from the shared
//! [`StateStore`](blockwatch_core::StateStore), whose per-table guards are
//! only ever held for a map copy, so queries never stall ingestion. Change
//! streaming goes through [`BroadcastSink`], the [`ChangeSink`] the bridge
//! hands to its publisher.
//!
//! [`StateChange`]: blockwatch_types::StateChange
//! [`BroadcastSink`]: state::BroadcastSink
//! [`ChangeSink`]: blockwatch_core::ChangeSink

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use startup::{spawn_observer, ObserverHandle};
pub use state::{AppState, BroadcastSink};
pub use ws::ChangeFeed;
