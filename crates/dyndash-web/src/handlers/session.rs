//! Login and logout.

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::SharedState;
use crate::auth::{clear_cookie_value, session_cookie_value, session_token, verify_password};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

pub async fn login(
    Extension(state): Extension<SharedState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let expected = state.config.read().await.admin_password.clone();

    if !verify_password(&expected, &req.password) {
        warn!("rejected login attempt");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "message": "wrong password" })),
        )
            .into_response();
    }

    let token = state.sessions.create();
    info!("admin logged in");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie_value(&token))],
        Json(json!({ "ok": true })),
    )
        .into_response()
}

pub async fn logout(
    Extension(state): Extension<SharedState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token);
    }

    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_cookie_value())],
        Json(json!({ "ok": true })),
    )
}
