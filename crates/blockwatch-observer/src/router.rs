//! Axum router construction for the Observer API.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// CORS allows any origin so a panel served from elsewhere on the layout
/// network can query the bridge.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/changes", get(ws::ws_changes))
        .route("/api/layout", get(handlers::get_layout))
        .route("/api/blocks", get(handlers::list_blocks))
        .route("/api/blocks/{id}", get(handlers::get_block))
        .route("/api/tracks", get(handlers::list_tracks))
        .route("/api/tracks/{id}", get(handlers::get_track))
        .route("/api/diagnostics", get(handlers::get_diagnostics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
