//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use blockwatch_core::{Diagnostics, Event, IngestControl, StateStore, TrackMapping};
use blockwatch_observer::router::build_router;
use blockwatch_observer::state::AppState;
use blockwatch_observer::{spawn_observer, ServerConfig};
use blockwatch_types::{BlockId, OccupancyState, TrackId};
use serde_json::Value;
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    let store = Arc::new(StateStore::new(TrackMapping::TwoTrack));
    let diagnostics = Arc::new(Diagnostics::new());

    store.apply(&Event::BlockState {
        block_id: BlockId::new(7),
        state: OccupancyState::Standing,
    });
    store.apply(&Event::BlockState {
        block_id: BlockId::new(3),
        state: OccupancyState::Off,
    });
    store.apply(&Event::TrainStatus {
        track_id: TrackId::new(1),
        direction: String::from("FORWARD"),
    });
    diagnostics.record_line();
    diagnostics.record_line();

    Arc::new(AppState::new(store, diagnostics))
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Vec<u8>) {
    let app = build_router(state);
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(state, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn index_returns_html() {
    let (status, body) = get(make_test_state(), "/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Blockwatch Observer"));
    assert!(html.contains("Blocks reported: 2 (1 occupied)"));
    assert!(html.contains("Lines received: 2"));
}

#[tokio::test]
async fn layout_returns_both_tables() {
    let (status, json) = get_json(make_test_state(), "/api/layout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["blocks"]["7"], "Standing");
    assert_eq!(json["blocks"]["3"], "Off");
    assert_eq!(json["tracks"]["1"], "FORWARD");
}

#[tokio::test]
async fn list_blocks_includes_off_reports() {
    let (status, json) = get_json(make_test_state(), "/api/blocks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn get_block_found() {
    let (status, json) = get_json(make_test_state(), "/api/blocks/7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 7);
    assert_eq!(json["state"], "Standing");
}

#[tokio::test]
async fn get_block_never_reported_is_404() {
    let (status, json) = get_json(make_test_state(), "/api/blocks/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn get_block_bad_id_is_400() {
    let (status, json) = get_json(make_test_state(), "/api/blocks/seven").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn tracks_endpoints() {
    let state = make_test_state();
    let (status, json) = get_json(Arc::clone(&state), "/api/tracks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["1"], "FORWARD");

    let (status, json) = get_json(Arc::clone(&state), "/api/tracks/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["direction"], "FORWARD");

    let (status, _) = get_json(state, "/api/tracks/2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn diagnostics_reports_counters() {
    let (status, json) = get_json(make_test_state(), "/api/diagnostics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lines_received"], 2);
    assert_eq!(json["publishes_dropped"], 0);
    assert!(json["started_at"].is_string());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, _) = get(make_test_state(), "/api/trains").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn spawned_observer_stops_on_request() {
    let control = Arc::new(IngestControl::new());
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    };
    let observer = spawn_observer(&config, make_test_state(), Arc::clone(&control))
        .await
        .unwrap();
    assert_ne!(observer.local_addr.port(), 0);

    control.request_stop();
    tokio::time::timeout(Duration::from_secs(5), observer.handle)
        .await
        .unwrap()
        .unwrap();
}
