//! Settings: provider credentials, check interval, admin password.
//!
//! Saving settings rebuilds the provider client through the shared handle,
//! so the reconciler picks up new credentials on its next pass without a
//! restart. The check interval itself is read at startup; changing it takes
//! effect after the daemon restarts.

use axum::{Extension, Json};
use dyndash_core::Error;
use dyndash_provider_alidns::AlidnsClient;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::ApiResult;
use crate::SharedState;
use crate::auth::{Authenticated, verify_password};

#[derive(Serialize)]
pub struct SettingsView {
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub check_interval: u64,
    pub listen_addr: String,
}

/// GET /api/settings
pub async fn get_settings(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
) -> Json<SettingsView> {
    let config = state.config.read().await;
    Json(SettingsView {
        access_key_id: config.access_key_id.clone(),
        access_key_secret: config.access_key_secret.clone(),
        check_interval: config.check_interval,
        listen_addr: config.listen_addr.clone(),
    })
}

#[derive(Deserialize)]
pub struct SettingsUpdate {
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub check_interval: Option<u64>,

    // Password change is optional; all three fields travel together
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

impl SettingsUpdate {
    fn wants_password_change(&self) -> bool {
        [
            &self.current_password,
            &self.new_password,
            &self.confirm_password,
        ]
        .iter()
        .any(|field| field.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// PUT /api/settings
pub async fn put_settings(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
    Json(mut update): Json<SettingsUpdate>,
) -> ApiResult<Value> {
    let mut config = state.config.write().await;

    if let Some(id) = update.access_key_id.take() {
        config.access_key_id = Some(id).filter(|s| !s.is_empty());
    }
    if let Some(secret) = update.access_key_secret.take() {
        config.access_key_secret = Some(secret).filter(|s| !s.is_empty());
    }

    if let Some(interval) = update.check_interval {
        if interval == 0 {
            return Err(Error::config("check_interval must be > 0").into());
        }
        if interval != config.check_interval {
            info!(
                "check_interval changed to {}s (takes effect after restart)",
                interval
            );
        }
        config.check_interval = interval;
    }

    let mut password_changed = false;
    if update.wants_password_change() {
        let current = update.current_password.as_deref().unwrap_or("");
        let new = update.new_password.as_deref().unwrap_or("");
        let confirm = update.confirm_password.as_deref().unwrap_or("");

        if !verify_password(&config.admin_password, current) {
            return Err(Error::config("current password is incorrect").into());
        }
        if new.is_empty() {
            return Err(Error::config("new password cannot be empty").into());
        }
        if new != confirm {
            return Err(Error::config("new password and confirmation do not match").into());
        }

        config.admin_password = new.to_string();
        password_changed = true;
        info!("admin password updated");
    }

    // Swap the provider client to match the new credentials
    match config.credentials() {
        Some((id, secret)) => {
            let client = AlidnsClient::new(id, secret)?;
            state.provider.replace(Some(Arc::new(client)));
        }
        None => state.provider.replace(None),
    }

    // Persisting the settings file is fatal to this request on failure
    config.save(&state.config_path).await?;
    info!("settings saved");

    Ok(Json(json!({ "ok": true, "password_changed": password_changed })))
}
