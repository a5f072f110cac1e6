//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read from the shared [`StateStore`](blockwatch_core::StateStore)
//! via [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/layout` | Both tables at once |
//! | `GET` | `/api/blocks` | All reported blocks |
//! | `GET` | `/api/blocks/:id` | One block |
//! | `GET` | `/api/tracks` | All reported tracks |
//! | `GET` | `/api/tracks/:id` | One track |
//! | `GET` | `/api/diagnostics` | Ingestion counters |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use blockwatch_types::{BlockId, OccupancyState, TrackId};
use serde::Serialize;

use crate::error::ObserverError;
use crate::state::AppState;

/// One block as returned by `GET /api/blocks/:id`.
#[derive(Debug, Serialize)]
pub struct BlockView {
    /// Block number.
    pub id: BlockId,
    /// Current occupancy.
    pub state: OccupancyState,
}

/// One track as returned by `GET /api/tracks/:id`.
#[derive(Debug, Serialize)]
pub struct TrackView {
    /// Track entity number.
    pub id: TrackId,
    /// Last reported direction.
    pub direction: String,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with live counts and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.store.snapshot();
    let occupied = snapshot
        .blocks
        .values()
        .filter(|block| block.is_occupied())
        .count();
    let block_count = snapshot.blocks.len();
    let track_count = snapshot.tracks.len();
    let lines = state.diagnostics.lines_received();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Blockwatch Observer</title>
    <style>
        body {{ background: #0d1117; color: #c9d1d9; font-family: monospace; padding: 2rem; }}
        h1 {{ color: #58a6ff; }}
        a {{ color: #58a6ff; }}
        li::before {{ content: "GET "; color: #7ee787; }}
        ul {{ list-style: none; padding: 0; }}
    </style>
</head>
<body>
    <h1>Blockwatch Observer</h1>
    <p>Blocks reported: {block_count} ({occupied} occupied)</p>
    <p>Tracks reported: {track_count}</p>
    <p>Lines received: {lines}</p>
    <ul>
        <li><a href="/api/layout">/api/layout</a></li>
        <li><a href="/api/blocks">/api/blocks</a></li>
        <li><a href="/api/tracks">/api/tracks</a></li>
        <li><a href="/api/diagnostics">/api/diagnostics</a></li>
        <li>/ws/changes (WebSocket)</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Return both tables.
pub async fn get_layout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.snapshot())
}

/// Return every reported block keyed by number.
pub async fn list_blocks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.blocks())
}

/// Return a single block.
///
/// Blocks that have never been reported are 404 rather than a default
/// `Off`, so a display can tell a quiet block from a misnumbered one.
pub async fn get_block(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = BlockId::new(parse_id(&id_str)?);
    let occupancy = state
        .store
        .known_block(id)
        .ok_or_else(|| ObserverError::NotFound(format!("block {id}")))?;
    Ok(Json(BlockView {
        id,
        state: occupancy,
    }))
}

/// Return every reported track keyed by entity number.
pub async fn list_tracks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.tracks())
}

/// Return a single track entity.
pub async fn get_track(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = TrackId::new(parse_id(&id_str)?);
    let direction = state
        .store
        .track_direction(id)
        .ok_or_else(|| ObserverError::NotFound(format!("track {id}")))?;
    Ok(Json(TrackView { id, direction }))
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Return the ingestion counters.
pub async fn get_diagnostics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.diagnostics.report())
}

fn parse_id(raw: &str) -> Result<u32, ObserverError> {
    raw.parse()
        .map_err(|e| ObserverError::InvalidId(format!("{raw:?}: {e}")))
}
