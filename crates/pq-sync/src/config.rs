//! Desk configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default admin panel base URL
pub const DEFAULT_ADMIN_URL: &str = "http://localhost:3000";

/// Remote tab titles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabNames {
    /// Active requests
    pub active: String,
    /// Archived requests
    pub archived: String,
    /// Key/value settings
    pub settings: String,
}

impl Default for TabNames {
    fn default() -> Self {
        Self {
            active: "Active".to_string(),
            archived: "Archived".to_string(),
            settings: "Settings".to_string(),
        }
    }
}

/// Desk configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Remote tab titles
    pub tabs: TabNames,
    /// Request snapshot file
    pub snapshot_path: PathBuf,
    /// Local settings file
    pub settings_path: PathBuf,
    /// Base URL linked from notifications
    pub admin_url: String,
}

impl DeskConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default file names placed under `dir`
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            snapshot_path: dir.join("requests-cache.json"),
            settings_path: dir.join("settings.json"),
            ..Self::default()
        }
    }

    /// With tab titles
    #[inline]
    #[must_use]
    pub fn with_tabs(mut self, tabs: TabNames) -> Self {
        self.tabs = tabs;
        self
    }

    /// With snapshot path
    #[inline]
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }

    /// With settings path
    #[inline]
    #[must_use]
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }

    /// With admin URL
    #[inline]
    #[must_use]
    pub fn with_admin_url(mut self, url: impl Into<String>) -> Self {
        self.admin_url = url.into();
        self
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            tabs: TabNames::default(),
            snapshot_path: PathBuf::from("requests-cache.json"),
            settings_path: PathBuf::from("settings.json"),
            admin_url: DEFAULT_ADMIN_URL.to_string(),
        }
    }
}
