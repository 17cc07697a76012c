//! Standalone HTTP gateway for the Atelier studio.
//!
//! Serves a status probe and the shared error envelope: every failure,
//! whether an unmatched route or a handler error, renders as
//! `{"status": "error", "message": ...}` JSON.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

/// Error type handlers return; rendering it produces the shared envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    stack: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            stack: capture_stack(),
        }
    }

    /// Errors that carry no better status code render as 500.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("[Gateway] {} ({})", self.message, self.status);
        let body = ErrorBody {
            status: "error",
            message: self.message,
            stack: self.stack,
        };
        (self.status, Json(body)).into_response()
    }
}

// Stack traces never leave a release build.
fn capture_stack() -> Option<String> {
    cfg!(debug_assertions).then(|| std::backtrace::Backtrace::force_capture().to_string())
}

/// Builds the gateway router: the status probe plus the catch-all 404.
pub fn router() -> Router {
    Router::new()
        .route("/v1/status", get(status))
        .fallback(fallback)
}

async fn status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Catch-all for routes nothing else claims.
async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "message": "Not Found" })),
    )
}
