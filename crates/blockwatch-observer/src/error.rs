//! Error types for the Observer API layer.
//!
//! [`ObserverError`] converts into an Axum HTTP response with a JSON body
//! via its [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested entity has never been reported.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path segment is not a valid entity number.
    #[error("invalid id: {0}")]
    InvalidId(String),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
