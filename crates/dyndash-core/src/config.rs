//! Application configuration
//!
//! The dashboard keeps its settings in a single JSON file (`config.json` by
//! default) that the settings page writes back to. Missing fields fall back
//! to defaults, so a partially filled or absent file still yields a usable
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// File name prefix for the daily-rotated log files.
///
/// The appender writes `<prefix>.<YYYY-MM-DD>`; the log view in the web
/// layer reads the same names back.
pub const LOG_FILE_PREFIX: &str = "dyndash.log";

/// Default fallback probe endpoints for public egress IP detection.
///
/// Tried in order; the first response containing a parseable IPv4 literal
/// wins.
pub const DEFAULT_PROBE_URLS: &[&str] = &[
    "https://myip.ipip.net",
    "https://ddns.oray.com/checkip",
    "https://4.ipw.cn",
];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Password for the dashboard login
    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Alibaba Cloud access key id; `None` means the provider is unconfigured
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Alibaba Cloud access key secret
    #[serde(default)]
    pub access_key_secret: Option<String>,

    /// Reconciliation interval in seconds
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Directory for the daily-rotated log files
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Endpoints probed for the public egress IP, in order
    #[serde(default = "default_probe_urls")]
    pub probe_urls: Vec<String>,
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file is not an error: the defaults are returned, matching
    /// the first-run experience where no settings have been saved yet.
    pub async fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            crate::Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            crate::Error::config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Persist the configuration as pretty-printed JSON.
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await.map_err(|e| {
            crate::Error::config(format!("failed to write {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.check_interval == 0 {
            return Err(crate::Error::config("check_interval must be > 0"));
        }
        if self.admin_password.is_empty() {
            return Err(crate::Error::config("admin_password cannot be empty"));
        }
        if self.probe_urls.is_empty() {
            return Err(crate::Error::config("probe_urls cannot be empty"));
        }
        Ok(())
    }

    /// Both halves of the provider credentials, when present and non-empty.
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.access_key_id, &self.access_key_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.clone(), secret.clone()))
            }
            _ => None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_password: default_admin_password(),
            access_key_id: None,
            access_key_secret: None,
            check_interval: default_check_interval(),
            listen_addr: default_listen_addr(),
            log_dir: default_log_dir(),
            probe_urls: default_probe_urls(),
        }
    }
}

fn default_admin_password() -> String {
    "123456".to_string()
}

fn default_check_interval() -> u64 {
    600
}

fn default_listen_addr() -> String {
    "0.0.0.0:11151".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_probe_urls() -> Vec<String> {
    DEFAULT_PROBE_URLS.iter().map(|s| s.to_string()).collect()
}
