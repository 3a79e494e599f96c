//! Application configuration
//!
//! An optional TOML file, overlaid by environment variables. Every field has
//! a default so an empty environment yields a local-only desk.

use crate::logging::LogFormat;
use anyhow::Context;
use pq_sheets::{ResendConfig, SheetsConfig};
use pq_sync::{DeskConfig, TabNames};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default sender for notifications
pub const DEFAULT_EMAIL_FROM: &str = "PQ Desk <no-reply@localhost>";

/// Everything the binary needs to build a desk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the snapshot and settings files
    pub data_dir: PathBuf,
    /// Base URL linked from notifications
    pub admin_url: String,
    /// Remote tab titles
    pub tabs: TabNames,
    /// Spreadsheet id; the remote is disabled without it
    pub sheet_id: Option<String>,
    /// Static Sheets bearer token
    pub sheets_access_token: Option<String>,
    /// Service account key JSON
    pub service_account_json: Option<String>,
    /// Resend API key; notifications are disabled without it
    pub resend_api_key: Option<String>,
    /// Notification sender
    pub email_from: String,
    /// Notification recipient
    pub notify_email: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        let desk = DeskConfig::default();
        Self {
            data_dir: PathBuf::from("."),
            admin_url: desk.admin_url,
            tabs: desk.tabs,
            sheet_id: None,
            sheets_access_token: None,
            service_account_json: None,
            resend_api_key: None,
            email_from: DEFAULT_EMAIL_FROM.to_string(),
            notify_email: None,
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load `path` if given, then apply the process environment.
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed, or an environment value
    /// is invalid.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML file
    ///
    /// # Errors
    /// Fails if the file cannot be read or is not valid TOML for this shape.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Overlay non-blank variables from `lookup`
    ///
    /// # Errors
    /// Fails on an unknown `PQ_LOG_FORMAT`.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PQ_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("BACKEND_URL") {
            self.admin_url = v;
        }
        if let Some(v) = get("GOOGLE_ACTIVE_SHEET") {
            self.tabs.active = v;
        }
        if let Some(v) = get("GOOGLE_ARCHIVED_SHEET") {
            self.tabs.archived = v;
        }
        if let Some(v) = get("GOOGLE_SETTINGS_SHEET") {
            self.tabs.settings = v;
        }
        if let Some(v) = get("GOOGLE_SHEET_ID") {
            self.sheet_id = Some(v);
        }
        if let Some(v) = get("GOOGLE_SHEETS_ACCESS_TOKEN") {
            self.sheets_access_token = Some(v);
        }
        if let Some(v) = get("GOOGLE_SERVICE_ACCOUNT") {
            self.service_account_json = Some(v);
        }
        if let Some(v) = get("RESEND_API_KEY") {
            self.resend_api_key = Some(v);
        }
        if let Some(v) = get("EMAIL_FROM") {
            self.email_from = v;
        }
        if let Some(v) = get("NOTIFY_EMAIL") {
            self.notify_email = Some(v);
        }
        if let Some(v) = get("PQ_LOG_FORMAT") {
            self.log_format = v.parse().map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }

    /// Desk configuration rooted at `data_dir`
    #[must_use]
    pub fn desk_config(&self) -> DeskConfig {
        DeskConfig::in_dir(&self.data_dir)
            .with_tabs(self.tabs.clone())
            .with_admin_url(&self.admin_url)
    }

    /// Sheets configuration, if a spreadsheet is configured
    #[must_use]
    pub fn sheets_config(&self) -> Option<SheetsConfig> {
        let mut config = SheetsConfig::new(self.sheet_id.as_deref()?);
        if let Some(token) = &self.sheets_access_token {
            config = config.with_access_token(token);
        }
        if let Some(json) = &self.service_account_json {
            config = config.with_service_account_json(json);
        }
        Some(config)
    }

    /// Resend configuration, if key and recipient are both set
    #[must_use]
    pub fn resend_config(&self) -> Option<ResendConfig> {
        Some(ResendConfig::new(
            self.resend_api_key.as_deref()?,
            &self.email_from,
            self.notify_email.as_deref()?,
        ))
    }
}
