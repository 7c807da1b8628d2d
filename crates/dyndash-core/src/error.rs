//! Error types for the dyndash system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dyndash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dyndash system
#[derive(Error, Debug)]
pub enum Error {
    /// DNS provider credentials are absent; no network call was attempted
    #[error("DNS provider credentials are not configured")]
    Unconfigured,

    /// IP resolution errors (interface lookup or egress probing)
    #[error("IP resolution failed: {0}")]
    Resolve(String),

    /// Binding store errors
    #[error("binding store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client errors (from provider APIs or IP probes)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider-specific error
    #[error("provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IP resolution error
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve(msg.into())
    }

    /// Create a binding store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
