//! Adapter configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Sheets API base URL
pub const DEFAULT_SHEETS_BASE: &str = "https://sheets.googleapis.com";

/// Default Resend API base URL
pub const DEFAULT_RESEND_BASE: &str = "https://api.resend.com";

/// OAuth scope for read/write spreadsheet access
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

fn default_timeout_secs() -> u64 {
    30
}

fn default_sheets_base() -> String {
    DEFAULT_SHEETS_BASE.to_string()
}

fn default_resend_base() -> String {
    DEFAULT_RESEND_BASE.to_string()
}

/// Google Sheets connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet id from the sheet URL
    pub spreadsheet_id: String,
    /// Static bearer token; when absent, ambient service-account
    /// credentials are used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Service account key JSON, used when no static token is set
    #[serde(default, skip_serializing)]
    pub service_account_json: Option<String>,
    /// API base URL
    #[serde(default = "default_sheets_base")]
    pub api_base: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SheetsConfig {
    /// Config for `spreadsheet_id` with defaults
    #[must_use]
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            access_token: None,
            service_account_json: None,
            api_base: default_sheets_base(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// With a static bearer token
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// With service account key JSON
    #[must_use]
    pub fn with_service_account_json(mut self, json: impl Into<String>) -> Self {
        self.service_account_json = Some(json.into());
        self
    }

    /// With API base URL
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// With timeout
    #[inline]
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Timeout as a duration
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field(
                "service_account_json",
                &self.service_account_json.as_ref().map(|_| "<redacted>"),
            )
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Resend e-mail settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendConfig {
    /// API key
    pub api_key: String,
    /// Sender address
    pub from: String,
    /// Admin recipient
    pub to: String,
    /// API base URL
    #[serde(default = "default_resend_base")]
    pub api_base: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ResendConfig {
    /// Config with defaults for base URL and timeout
    #[must_use]
    pub fn new(api_key: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
            api_base: default_resend_base(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// With API base URL
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Timeout as a duration
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
