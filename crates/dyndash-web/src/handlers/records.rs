//! Record listing and CRUD, including the per-record DDNS binding toggle.
//!
//! Every record view carries an explicit `Managed | Unmanaged` DDNS tag
//! derived from the binding store, so the UI never has to interpret the
//! absence of a lookup as a flag.

use axum::extract::{Path, Query};
use axum::{Extension, Json};
use chrono::{DateTime, Local};
use dyndash_core::traits::{Binding, IpMode, ProviderRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::net::Ipv4Addr;
use tracing::{info, warn};

use super::{ApiError, ApiResult};
use crate::SharedState;
use crate::auth::Authenticated;

/// Timestamp rendering used across the dashboard
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// DDNS management state attached to each record view
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DdnsView {
    Managed {
        interface: String,
        ip_mode: IpMode,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_ip: Option<Ipv4Addr>,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_update: Option<String>,
    },
    Unmanaged,
}

impl From<Option<Binding>> for DdnsView {
    fn from(binding: Option<Binding>) -> Self {
        match binding {
            Some(b) => DdnsView::Managed {
                interface: b.interface,
                ip_mode: b.ip_mode,
                last_ip: b.last_ip,
                last_update: b
                    .update_time
                    .map(|t| t.with_timezone(&Local).format(TIME_FORMAT).to_string()),
            },
            None => DdnsView::Unmanaged,
        }
    }
}

/// One DNS record as shown in the table
#[derive(Debug, Serialize)]
pub struct RecordView {
    pub id: String,
    pub rr: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    pub ddns: DdnsView,
}

fn format_timestamp_ms(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format(TIME_FORMAT).to_string())
}

async fn record_view(state: &SharedState, record: ProviderRecord) -> Result<RecordView, ApiError> {
    let binding = state.bindings.get(&record.id).await?;
    Ok(RecordView {
        ddns: binding.into(),
        id: record.id,
        rr: record.rr,
        record_type: record.record_type,
        value: record.value,
        update_time: record.update_timestamp_ms.and_then(format_timestamp_ms),
    })
}

/// GET /api/domains
///
/// A provider failure degrades to an empty list (logged); the UI shows the
/// same empty state either way.
pub async fn domains(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
) -> Json<Value> {
    let configured = state.provider.is_configured();

    let domains = match state.provider.get() {
        Ok(provider) => match provider.list_domains().await {
            Ok(domains) => domains,
            Err(e) => {
                warn!("failed to list domains: {}", e);
                Vec::new()
            }
        },
        Err(_) => Vec::new(),
    };

    Json(json!({ "ok": true, "configured": configured, "domains": domains }))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub domain: String,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

/// GET /api/records?domain=...&page=...&page_size=...
pub async fn list(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value> {
    let provider = state.provider.get()?;
    let page = provider
        .list_records(&query.domain, query.page, query.page_size)
        .await?;

    let mut records = Vec::with_capacity(page.records.len());
    for record in page.records {
        records.push(record_view(&state, record).await?);
    }

    let total_pages = page.total_count.div_ceil(query.page_size.max(1));

    Ok(Json(json!({
        "ok": true,
        "records": records,
        "total_count": page.total_count,
        "total_pages": total_pages,
        "page": query.page,
        "page_size": query.page_size,
    })))
}

/// DDNS parameters accepted when creating or toggling a binding
#[derive(Debug, Deserialize)]
pub struct DdnsParams {
    pub interface: String,
    pub ip_mode: IpMode,
}

#[derive(Deserialize)]
pub struct AddRecordRequest {
    pub domain: String,
    pub rr: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    /// When present, the new record is put under DDNS management
    #[serde(default)]
    pub ddns: Option<DdnsParams>,
}

fn default_ttl() -> u32 {
    600
}

/// POST /api/records
pub async fn add(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
    Json(req): Json<AddRecordRequest>,
) -> ApiResult<Value> {
    let provider = state.provider.get()?;
    let record_id = provider
        .add_record(&req.domain, &req.rr, &req.record_type, &req.value, req.ttl)
        .await?;

    info!("added record {} ({}.{})", record_id, req.rr, req.domain);

    if let Some(ddns) = req.ddns {
        let binding = Binding::new(&req.domain, &req.rr, &ddns.interface, ddns.ip_mode);
        state.bindings.upsert(&record_id, &binding).await?;
        info!(
            "enabled DDNS for {} via {} ({})",
            record_id,
            binding.interface,
            binding.ip_mode.label()
        );
    }

    Ok(Json(json!({ "ok": true, "record_id": record_id })))
}

/// DELETE /api/records/{id}
///
/// Deleting the provider record cascades to its binding.
pub async fn remove(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
    Path(record_id): Path<String>,
) -> ApiResult<Value> {
    let provider = state.provider.get()?;
    provider.delete_record(&record_id).await?;
    info!("deleted record {}", record_id);

    state.bindings.remove(&record_id).await?;

    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct DdnsUpsertRequest {
    pub domain: String,
    pub rr: String,
    pub interface: String,
    pub ip_mode: IpMode,
}

/// PUT /api/records/{id}/ddns
pub async fn ddns_enable(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
    Path(record_id): Path<String>,
    Json(req): Json<DdnsUpsertRequest>,
) -> ApiResult<Value> {
    // Re-binding keeps the last confirmed IP: it still names the value the
    // DNS record actually holds, whatever interface it came from.
    let mut binding = Binding::new(&req.domain, &req.rr, &req.interface, req.ip_mode);
    if let Some(existing) = state.bindings.get(&record_id).await? {
        binding.last_ip = existing.last_ip;
        binding.update_time = existing.update_time;
    }

    state.bindings.upsert(&record_id, &binding).await?;
    info!(
        "DDNS enabled for {} via {} ({})",
        record_id,
        req.interface,
        req.ip_mode.label()
    );

    Ok(Json(json!({ "ok": true })))
}

/// DELETE /api/records/{id}/ddns
pub async fn ddns_disable(
    _auth: Authenticated,
    Extension(state): Extension<SharedState>,
    Path(record_id): Path<String>,
) -> ApiResult<Value> {
    state.bindings.remove(&record_id).await?;
    info!("DDNS disabled for {}", record_id);

    Ok(Json(json!({ "ok": true })))
}
