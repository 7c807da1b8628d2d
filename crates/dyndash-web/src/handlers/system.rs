//! System endpoints: IP probing, interface listing, manual reconciliation
//! and the log view.

use axum::{Extension, Json};
use chrono::Local;
use dyndash_core::Error;
use dyndash_core::config::LOG_FILE_PREFIX;
use dyndash_core::traits::IpMode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

use super::ApiResult;
use crate::SharedState;
use crate::auth::Authenticated;

#[derive(Deserialize)]
pub struct ProbeRequest {
    pub interface: String,
    pub ip_mode: IpMode,
}

/// POST /api/probe-ip
///
/// Runs the same resolution the reconciler would, so users can verify an
/// interface/mode pair before binding a record to it.
pub async fn probe_ip(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
    Json(req): Json<ProbeRequest>,
) -> ApiResult<Value> {
    let ip = state.resolver.resolve(&req.interface, req.ip_mode).await?;
    Ok(Json(json!({ "ok": true, "ip": ip })))
}

/// GET /api/interfaces
pub async fn interfaces(_auth: Authenticated) -> ApiResult<Value> {
    let interfaces = dyndash_ip::list_interfaces()?;
    Ok(Json(json!({ "ok": true, "interfaces": interfaces })))
}

/// POST /api/reconcile
///
/// Manual refresh: run one full pass immediately and report the counts.
pub async fn reconcile(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
) -> ApiResult<Value> {
    let summary = state.reconciler.reconcile_once().await?;
    Ok(Json(json!({ "ok": true, "summary": summary })))
}

/// Today's log file, falling back to the newest rotated one
fn current_log_file(log_dir: &std::path::Path) -> Option<PathBuf> {
    let today = log_dir.join(format!(
        "{}.{}",
        LOG_FILE_PREFIX,
        Local::now().format("%Y-%m-%d")
    ));
    if today.exists() {
        return Some(today);
    }

    // Daily file names sort chronologically, so max() is the newest
    std::fs::read_dir(log_dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
        })
        .max()
}

/// GET /api/logs
pub async fn logs(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
) -> Result<String, super::ApiError> {
    let Some(path) = current_log_file(&state.log_dir) else {
        return Ok(String::new());
    };

    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| Error::store(format!("failed to read log file {}: {}", path.display(), e)).into())
}
