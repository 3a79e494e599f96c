//! Adapter construction errors and HTTP error mapping

use pq_sync::{NotifyError, StoreError};
use serde::Deserialize;

/// Failures while building an adapter
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Missing or invalid setting
    #[error("invalid adapter configuration: {0}")]
    Config(String),

    /// HTTP client could not be built
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    /// Credential discovery failed
    #[error("failed to initialize google auth: {0}")]
    Auth(String),
}

impl AdapterError {
    /// Create config error
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Google and Resend both wrap errors as `{"error": {"message": ...}}` or
/// `{"message": ...}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Best-effort message from an error response body
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.and_then(|e| e.message).or(b.message))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Map a transport failure to the store port
pub(crate) fn store_transport(e: &reqwest::Error) -> StoreError {
    if e.is_decode() {
        StoreError::Malformed(e.to_string())
    } else {
        StoreError::Unavailable(e.to_string())
    }
}

/// Map a transport failure to the notification port
pub(crate) fn notify_transport(e: &reqwest::Error) -> NotifyError {
    NotifyError::Transport(e.to_string())
}
