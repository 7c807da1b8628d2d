//! Session-cookie authentication for the dashboard.
//!
//! Single-admin model: a correct password buys a random bearer token,
//! stored server-side and carried in a cookie. Tokens live until logout or
//! process restart.

use axum::{
    Extension,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand_core::{OsRng, RngCore};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, RwLock};
use subtle::ConstantTimeEq;

use crate::SharedState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "dyndash_session";

/// In-memory set of valid session tokens
#[derive(Clone, Default)]
pub struct SessionStore {
    tokens: Arc<RwLock<HashSet<String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new session token and remember it
    pub fn create(&self) -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);
        self.tokens.write().unwrap().insert(token.clone());
        token
    }

    /// Forget a session token
    pub fn revoke(&self, token: &str) {
        self.tokens.write().unwrap().remove(token);
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.tokens.read().unwrap().contains(token)
    }
}

/// Constant-time password comparison; length mismatches compare unequal.
pub fn verify_password(expected: &str, given: &str) -> bool {
    expected.as_bytes().ct_eq(given.as_bytes()).into()
}

/// Pull the session token out of the Cookie header(s)
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for pair in value.split(';') {
            if let Some(token) = pair.trim().strip_prefix(SESSION_COOKIE) {
                if let Some(token) = token.strip_prefix('=') {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

/// The `Set-Cookie` value establishing a session
pub fn session_cookie_value(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// The `Set-Cookie` value clearing the session
pub fn clear_cookie_value() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Axum extractor that rejects requests without a valid session.
pub struct Authenticated;

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> {
        Box::pin(async move {
            let Extension(app_state): Extension<SharedState> =
                Extension::from_request_parts(parts, state)
                    .await
                    .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "missing state"))?;

            let token = session_token(&parts.headers)
                .ok_or((StatusCode::UNAUTHORIZED, "not logged in"))?;

            if !app_state.sessions.is_valid(&token) {
                return Err((StatusCode::UNAUTHORIZED, "session expired"));
            }

            Ok(Authenticated)
        })
    }
}
