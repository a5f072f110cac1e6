//! Observer server startup helper for embedding in the bridge.
//!
//! Provides [`spawn_observer`] which launches the Observer HTTP +
//! `WebSocket` server on a background Tokio task, so the API runs
//! concurrently with the ingestion loop.
//!
//! # Usage
//!
//! ```rust,ignore
//! use blockwatch_observer::{spawn_observer, AppState, ServerConfig};
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::new(store, diagnostics));
//! let observer = spawn_observer(&ServerConfig::default(), state, Arc::clone(&control)).await?;
//! // ... ingestion runs ...
//! observer.handle.await?;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use blockwatch_core::IngestControl;
use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// A running Observer server.
#[derive(Debug)]
pub struct ObserverHandle {
    /// Address the listener actually bound, useful with port `0`.
    pub local_addr: SocketAddr,
    /// The background serving task. Completes after the stop signal.
    pub handle: JoinHandle<()>,
}

/// Spawn the Observer HTTP server on a background Tokio task.
///
/// The listener is bound before this returns, so an address conflict is
/// reported to the caller instead of surfacing later in a log line. The
/// server shuts down gracefully once `control` has a stop requested.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the server cannot bind to the
/// requested address.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
    control: Arc<IngestControl>,
) -> Result<ObserverHandle, ServerError> {
    let listener = server::bind(config).await?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("local address unavailable: {e}")))?;

    let shutdown = async move { control.stopped().await };
    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
        tracing::info!("Observer server stopped");
    });

    tracing::info!(%local_addr, "Observer server spawned on background task");

    Ok(ObserverHandle { local_addr, handle })
}
