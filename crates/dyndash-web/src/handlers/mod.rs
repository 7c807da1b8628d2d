//! HTTP handlers for the dashboard API.
//!
//! Handlers return `Result<Json<_>, ApiError>`; failures render as a
//! structured `{ ok: false, message }` body with a status matching the
//! error kind.

pub mod records;
pub mod session;
pub mod settings;
pub mod system;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dyndash_core::Error;
use serde_json::json;

/// Error wrapper giving core errors an HTTP shape
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            // Caller can fix these: missing credentials or bad input
            Error::Unconfigured | Error::Config(_) => StatusCode::BAD_REQUEST,
            // Upstream trouble: provider API or IP probing
            Error::Provider { .. } | Error::Http(_) | Error::Resolve(_) => StatusCode::BAD_GATEWAY,
            // State may be inconsistent; fatal to this request
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(json!({ "ok": false, "message": self.0.to_string() })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;
