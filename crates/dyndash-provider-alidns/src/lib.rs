// # Alibaba Cloud DNS Provider
//
// DnsProvider implementation over the alidns RPC API.
//
// The adapter is deliberately thin: one API call per trait method, full
// error propagation to the caller, no retry logic and no caching. Whether
// an update is needed at all is decided by the reconciler, never here.
// Credentials are fixed at construction; a credential change builds a new
// client.
//
// ## API Reference
//
// - Endpoint: https://alidns.aliyuncs.com/ (RPC style, version 2015-01-09)
// - Actions: DescribeDomains, DescribeDomainRecords, AddDomainRecord,
//   UpdateDomainRecord, DeleteDomainRecord
// - Every response carries a RequestId; error responses carry Code/Message

mod sign;

use async_trait::async_trait;
use chrono::Utc;
use dyndash_core::traits::{DnsProvider, ProviderRecord, RecordPage};
use dyndash_core::{Error, Result};
use rand_core::{OsRng, RngCore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// alidns API endpoint
const ALIDNS_ENDPOINT: &str = "https://alidns.aliyuncs.com/";

/// alidns API version
const API_VERSION: &str = "2015-01-09";

/// Timeout for provider API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Alibaba Cloud DNS client
pub struct AlidnsClient {
    /// Access key id (public half of the credential)
    access_key_id: String,

    /// Access key secret; never logged
    access_key_secret: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the access key secret
impl std::fmt::Debug for AlidnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlidnsClient")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .finish()
    }
}

impl AlidnsClient {
    /// Create a new alidns client
    ///
    /// Fails fast on empty credentials; callers keep an unconfigured
    /// [`dyndash_core::SharedProvider`] instead of a half-built client.
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let access_key_secret = access_key_secret.into();

        if access_key_id.is_empty() || access_key_secret.is_empty() {
            return Err(Error::config("alidns credentials cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            access_key_id,
            access_key_secret,
            client,
        })
    }

    /// Common parameters every RPC call carries
    fn base_params(&self, action: &str) -> BTreeMap<String, String> {
        let mut nonce_bytes = [0u8; 16];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce: String = nonce_bytes.iter().map(|b| format!("{:02x}", b)).collect();

        let mut params = BTreeMap::new();
        params.insert("Action".to_string(), action.to_string());
        params.insert("Format".to_string(), "JSON".to_string());
        params.insert("Version".to_string(), API_VERSION.to_string());
        params.insert("AccessKeyId".to_string(), self.access_key_id.clone());
        params.insert("SignatureMethod".to_string(), "HMAC-SHA1".to_string());
        params.insert("SignatureVersion".to_string(), "1.0".to_string());
        params.insert("SignatureNonce".to_string(), nonce);
        params.insert(
            "Timestamp".to_string(),
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        params
    }

    /// Sign and execute one RPC call, returning the parsed JSON body
    async fn call(&self, action: &str, extra: &[(&str, String)]) -> Result<Value> {
        let mut params = self.base_params(action);
        for (key, value) in extra {
            params.insert((*key).to_string(), value.clone());
        }

        let signature = sign::sign("GET", &params, &self.access_key_secret);
        params.insert("Signature".to_string(), signature);

        let query: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        tracing::debug!("alidns {} request", action);
        let response = self
            .client
            .get(ALIDNS_ENDPOINT)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::provider("alidns", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::provider("alidns", format!("failed to parse response: {}", e)))?;

        if !status.is_success() {
            // Error payloads carry Code and Message alongside the RequestId
            let code = body["Code"].as_str().unwrap_or("Unknown");
            let message = body["Message"].as_str().unwrap_or("no error message");
            return Err(Error::provider(
                "alidns",
                format!("{} failed: {} ({}, HTTP {})", action, message, code, status),
            ));
        }

        Ok(body)
    }
}

/// Parse one record object from a DescribeDomainRecords response
fn parse_record(value: &Value) -> Result<ProviderRecord> {
    let field = |name: &str| -> Result<String> {
        value[name]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                Error::provider("alidns", format!("invalid response format: record.{} missing", name))
            })
    };

    Ok(ProviderRecord {
        id: field("RecordId")?,
        rr: field("RR")?,
        record_type: field("Type")?,
        value: field("Value")?,
        update_timestamp_ms: value["UpdateTimestamp"].as_i64(),
    })
}

/// Parse a full DescribeDomainRecords body into a page
fn parse_record_page(body: &Value) -> Result<RecordPage> {
    let records = body["DomainRecords"]["Record"]
        .as_array()
        .ok_or_else(|| {
            Error::provider(
                "alidns",
                "invalid response format: DomainRecords.Record is not an array",
            )
        })?
        .iter()
        .map(parse_record)
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordPage {
        records,
        total_count: body["TotalCount"].as_u64().unwrap_or(0),
    })
}

/// Every mutating call answers with a RequestId; treat its absence as failure
fn expect_request_id(action: &str, body: &Value) -> Result<()> {
    match body["RequestId"].as_str() {
        Some(id) if !id.is_empty() => Ok(()),
        _ => Err(Error::provider(
            "alidns",
            format!("{} returned no RequestId", action),
        )),
    }
}

#[async_trait]
impl DnsProvider for AlidnsClient {
    async fn list_domains(&self) -> Result<Vec<String>> {
        let body = self
            .call("DescribeDomains", &[("PageSize", "100".to_string())])
            .await?;

        let domains = body["Domains"]["Domain"]
            .as_array()
            .ok_or_else(|| {
                Error::provider(
                    "alidns",
                    "invalid response format: Domains.Domain is not an array",
                )
            })?
            .iter()
            .filter_map(|d| d["DomainName"].as_str().map(|s| s.to_string()))
            .collect();

        Ok(domains)
    }

    async fn list_records(&self, domain: &str, page: u64, page_size: u64) -> Result<RecordPage> {
        let body = self
            .call(
                "DescribeDomainRecords",
                &[
                    ("DomainName", domain.to_string()),
                    ("PageNumber", page.to_string()),
                    ("PageSize", page_size.to_string()),
                ],
            )
            .await?;

        parse_record_page(&body)
    }

    async fn add_record(
        &self,
        domain: &str,
        rr: &str,
        record_type: &str,
        value: &str,
        ttl: u32,
    ) -> Result<String> {
        let body = self
            .call(
                "AddDomainRecord",
                &[
                    ("DomainName", domain.to_string()),
                    ("RR", rr.to_string()),
                    ("Type", record_type.to_string()),
                    ("Value", value.to_string()),
                    ("TTL", ttl.to_string()),
                ],
            )
            .await?;

        body["RecordId"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::provider("alidns", "AddDomainRecord returned no RecordId"))
    }

    async fn update_record(
        &self,
        record_id: &str,
        rr: &str,
        record_type: &str,
        value: &str,
    ) -> Result<()> {
        let body = self
            .call(
                "UpdateDomainRecord",
                &[
                    ("RecordId", record_id.to_string()),
                    ("RR", rr.to_string()),
                    ("Type", record_type.to_string()),
                    ("Value", value.to_string()),
                ],
            )
            .await?;

        expect_request_id("UpdateDomainRecord", &body)
    }

    async fn delete_record(&self, record_id: &str) -> Result<()> {
        let body = self
            .call(
                "DeleteDomainRecord",
                &[("RecordId", record_id.to_string())],
            )
            .await?;

        expect_request_id("DeleteDomainRecord", &body)
    }

    fn provider_name(&self) -> &'static str {
        "alidns"
    }
}
