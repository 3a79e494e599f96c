//! Settings persistence
//!
//! Settings live in three places, most authoritative first:
//!
//! 1. The remote settings tab, a two-column `Key`/`Value` table whose values
//!    are JSON arrays
//! 2. A local JSON file, so a restart without the remote keeps edits
//! 3. Built-in defaults, for any field missing from both
//!
//! Every load goes through [`Settings::merge`], so an edited sheet can never
//! leave the service without fulfillers or sites.

use crate::error::SyncError;
use crate::snapshot::{read_json, write_json};
use crate::tabular::{RowSpan, TabRange, TabularStore};
use indexmap::IndexMap;
use parking_lot::RwLock;
use pq_core::{Row, Settings, SettingsPatch, SiteInput};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Last row of the settings tab that is read or cleared
pub const SETTINGS_LAST_ROW: usize = 200;

/// Key under which fulfiller names are stored
pub const FULFILLERS_KEY: &str = "fulfillerNames";

/// Older key for fulfiller names, still accepted on read
pub const LEGACY_FULFILLERS_KEY: &str = "fulfilledByNames";

/// Key under which the site registry is stored
pub const SITES_KEY: &str = "supportedSites";

const KEY_VALUE_HEADER: [&str; 2] = ["Key", "Value"];

/// Remote half of the settings store
#[derive(Debug, Clone)]
struct RemoteSettings {
    store: Arc<dyn TabularStore>,
    tab: String,
}

/// Current settings plus their local and remote copies.
///
/// Lock order is `sync_guard` then `edit_guard`. The edit guard covers every
/// read-modify-write of the current settings together with the local file
/// write. The sync guard keeps remote pulls and pushes from interleaving.
#[derive(Debug)]
pub struct SettingsStore {
    current: RwLock<Settings>,
    local_path: PathBuf,
    remote: Option<RemoteSettings>,
    edit_guard: tokio::sync::Mutex<()>,
    sync_guard: tokio::sync::Mutex<()>,
}

impl SettingsStore {
    /// Store starting from defaults, persisted to `local_path`
    #[must_use]
    pub fn new(local_path: impl Into<PathBuf>) -> Self {
        Self {
            current: RwLock::new(Settings::default()),
            local_path: local_path.into(),
            remote: None,
            edit_guard: tokio::sync::Mutex::new(()),
            sync_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// With a remote settings tab
    #[must_use]
    pub fn with_remote(mut self, store: Arc<dyn TabularStore>, tab: impl Into<String>) -> Self {
        self.remote = Some(RemoteSettings {
            store,
            tab: tab.into(),
        });
        self
    }

    /// Whether a remote tab is configured
    #[inline]
    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Local file path
    #[inline]
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Snapshot of the current settings
    #[must_use]
    pub fn current(&self) -> Settings {
        self.current.read().clone()
    }

    /// Merge the local file over the defaults.
    ///
    /// A missing or unreadable file leaves the defaults in place. Returns
    /// whether a file was applied.
    pub async fn load_local(&self) -> bool {
        let _edit = self.edit_guard.lock().await;
        match read_json::<SettingsPatch>(&self.local_path).await {
            Ok(Some(patch)) => {
                *self.current.write() = Settings::merge(patch);
                tracing::debug!(path = %self.local_path.display(), "loaded local settings");
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read local settings");
                false
            }
        }
    }

    /// Sanitize and adopt `settings`, then write the local file.
    ///
    /// Returns the settings as stored.
    pub async fn replace(&self, settings: Settings) -> Settings {
        self.update(|current| *current = settings).await
    }

    /// Apply `f` to the current settings, sanitize, adopt and write the
    /// local file, all under the edit guard so concurrent edits compose.
    ///
    /// Returns the settings as stored.
    pub async fn update<F>(&self, f: F) -> Settings
    where
        F: FnOnce(&mut Settings),
    {
        let _edit = self.edit_guard.lock().await;
        let mut next = self.current();
        f(&mut next);
        let settings = next.normalized();
        *self.current.write() = settings.clone();
        self.save_local(&settings).await;
        settings
    }

    /// Load the remote tab, merge it over the defaults, adopt the result and
    /// mirror it locally.
    ///
    /// Unparseable values are ignored so the corresponding field falls back
    /// to its default.
    ///
    /// # Errors
    /// - `SyncError::RemoteUnavailable` if no remote is configured
    /// - `SyncError::Store` if the tab cannot be read
    pub async fn pull_remote(&self) -> Result<Settings, SyncError> {
        let remote = self.remote.as_ref().ok_or_else(SyncError::not_configured)?;
        let _sync = self.sync_guard.lock().await;
        remote.ensure_header().await?;

        let rows = remote
            .store
            .read_range(&TabRange::new(
                &remote.tab,
                RowSpan::data(SETTINGS_LAST_ROW),
                KEY_VALUE_HEADER.len(),
            ))
            .await?;

        let settings = Settings::merge(patch_from_rows(&rows));
        {
            let _edit = self.edit_guard.lock().await;
            *self.current.write() = settings.clone();
            self.save_local(&settings).await;
        }

        tracing::info!(
            fulfillers = settings.fulfiller_names.len(),
            sites = settings.supported_sites.len(),
            "loaded settings from sheet"
        );
        Ok(settings)
    }

    /// Overwrite the remote tab with the current settings.
    ///
    /// Pushes are serialized against each other and against pulls. Each
    /// reads the settings only once it holds the guard, so the last push
    /// always writes the latest settings.
    ///
    /// # Errors
    /// - `SyncError::RemoteUnavailable` if no remote is configured
    /// - `SyncError::Store` if the clear or write fails
    pub async fn push_remote(&self) -> Result<(), SyncError> {
        let remote = self.remote.as_ref().ok_or_else(SyncError::not_configured)?;
        let _sync = self.sync_guard.lock().await;
        let rows = rows_from_settings(&self.current());

        remote.store.ensure_tab(&remote.tab).await?;
        remote
            .store
            .clear_range(&TabRange::new(
                &remote.tab,
                RowSpan::data(SETTINGS_LAST_ROW),
                KEY_VALUE_HEADER.len(),
            ))
            .await?;
        remote.store.write_rows(&remote.tab, 1, &rows).await?;

        tracing::info!(tab = %remote.tab, "synced settings to sheet");
        Ok(())
    }

    async fn save_local(&self, settings: &Settings) {
        if let Err(e) = write_json(&self.local_path, settings).await {
            tracing::warn!(error = %e, "failed to write local settings");
        }
    }
}

impl RemoteSettings {
    async fn ensure_header(&self) -> Result<(), SyncError> {
        self.store.ensure_tab(&self.tab).await?;
        let current = self
            .store
            .read_range(&TabRange::new(&self.tab, RowSpan::header(), KEY_VALUE_HEADER.len()))
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        if current.iter().map(String::as_str).eq(KEY_VALUE_HEADER) {
            return Ok(());
        }
        self.store.write_rows(&self.tab, 1, &[header_row()]).await?;
        Ok(())
    }
}

fn header_row() -> Row {
    KEY_VALUE_HEADER.iter().map(|s| (*s).to_string()).collect()
}

/// Build a patch from `Key`/`Value` data rows; later keys win
fn patch_from_rows(rows: &[Row]) -> SettingsPatch {
    let map: IndexMap<String, String> = rows
        .iter()
        .filter_map(|row| {
            let key = row.first()?.trim();
            (!key.is_empty()).then(|| (key.to_string(), row.get(1).cloned().unwrap_or_default()))
        })
        .collect();

    let fulfiller_names = map
        .get(FULFILLERS_KEY)
        .or_else(|| map.get(LEGACY_FULFILLERS_KEY))
        .and_then(|raw| parse_value::<Vec<String>>(FULFILLERS_KEY, raw));
    let supported_sites = map
        .get(SITES_KEY)
        .and_then(|raw| parse_value::<Vec<SiteInput>>(SITES_KEY, raw));

    SettingsPatch {
        fulfiller_names,
        supported_sites,
    }
}

fn parse_value<T: serde::de::DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unparseable settings value");
            None
        }
    }
}

fn rows_from_settings(settings: &Settings) -> Vec<Row> {
    let encode = |value: serde_json::Result<String>| value.unwrap_or_else(|_| "[]".to_string());
    vec![
        header_row(),
        vec![
            FULFILLERS_KEY.to_string(),
            encode(serde_json::to_string(&settings.fulfiller_names)),
        ],
        vec![
            SITES_KEY.to_string(),
            encode(serde_json::to_string(&settings.supported_sites)),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTabularStore;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn patch_prefers_current_key_over_legacy() {
        let patch = patch_from_rows(&[
            row(&["fulfilledByNames", r#"["Old"]"#]),
            row(&["fulfillerNames", r#"["New"]"#]),
        ]);
        assert_eq!(patch.fulfiller_names, Some(vec!["New".to_string()]));
        assert!(patch.supported_sites.is_none());
    }

    #[test]
    fn patch_accepts_legacy_key() {
        let patch = patch_from_rows(&[row(&["fulfilledByNames", r#"["Ada"]"#])]);
        assert_eq!(patch.fulfiller_names, Some(vec!["Ada".to_string()]));
    }

    #[test]
    fn unparseable_value_is_ignored() {
        let patch = patch_from_rows(&[row(&["fulfillerNames", "not json"]), row(&["supportedSites"])]);
        assert!(patch.fulfiller_names.is_none());
        assert!(patch.supported_sites.is_none());
    }

    #[tokio::test]
    async fn pull_remote_merges_and_mirrors_locally() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(MemoryTabularStore::new().with_tab(
            "Settings",
            vec![row(&["Key", "Value"]), row(&["fulfillerNames", r#"[" Ada ","ada","Bob"]"#])],
        ));
        let store = SettingsStore::new(dir.path().join("settings.json")).with_remote(remote, "Settings");

        let settings = store.pull_remote().await.unwrap();
        assert_eq!(settings.fulfiller_names, vec!["Ada", "Bob"]);
        assert_eq!(settings.supported_sites, Settings::default().supported_sites);

        let local = SettingsStore::new(dir.path().join("settings.json"));
        assert!(local.load_local().await);
        assert_eq!(local.current(), settings);
    }

    #[tokio::test]
    async fn pull_remote_creates_tab_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(MemoryTabularStore::new());
        let store = SettingsStore::new(dir.path().join("settings.json"))
            .with_remote(remote.clone(), "Settings");

        let settings = store.pull_remote().await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(remote.tab("Settings").unwrap(), vec![row(&["Key", "Value"])]);
    }

    #[tokio::test]
    async fn push_then_pull_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(MemoryTabularStore::new());
        let store = SettingsStore::new(dir.path().join("settings.json"))
            .with_remote(remote.clone(), "Settings");

        let mut edited = Settings::default();
        edited.fulfiller_names = vec!["Zed".to_string()];
        store.replace(edited.clone()).await;
        store.push_remote().await.unwrap();

        let rows = remote.tab("Settings").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "fulfillerNames");
        assert_eq!(rows[1][1], r#"["Zed"]"#);

        let fresh = SettingsStore::new(dir.path().join("other.json")).with_remote(remote, "Settings");
        assert_eq!(fresh.pull_remote().await.unwrap(), edited);
    }

    #[tokio::test]
    async fn remote_failure_keeps_current() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(MemoryTabularStore::new());
        remote.set_offline(true);
        let store = SettingsStore::new(dir.path().join("settings.json"))
            .with_remote(remote, "Settings");

        let mut edited = Settings::default();
        edited.fulfiller_names = vec!["Keep".to_string()];
        store.replace(edited.clone()).await;

        assert!(store.pull_remote().await.unwrap_err().is_unavailable());
        assert_eq!(store.current(), edited);
    }

    #[tokio::test]
    async fn pull_during_push_reads_pushed_settings() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(MemoryTabularStore::new());
        let store = Arc::new(
            SettingsStore::new(dir.path().join("settings.json"))
                .with_remote(remote.clone(), "Settings"),
        );
        store
            .update(|s| s.fulfiller_names = vec!["Zed".to_string()])
            .await;

        remote.set_write_delay(Some(Duration::from_millis(200)));
        let push = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.push_remote().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let pulled = store.pull_remote().await.unwrap();
        push.await.unwrap().unwrap();

        assert_eq!(pulled.fulfiller_names, vec!["Zed"]);
        assert_eq!(store.current().fulfiller_names, vec!["Zed"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_edits_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = Arc::new(SettingsStore::new(&path));
        store.replace(Settings::default()).await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .update(|s| s.fulfiller_names.push(format!("Name {i}")))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let names = store.current().fulfiller_names;
        assert_eq!(names.len(), Settings::default().fulfiller_names.len() + 8);
        for i in 0..8 {
            assert!(names.contains(&format!("Name {i}")));
        }

        let reloaded = SettingsStore::new(&path);
        assert!(reloaded.load_local().await);
        assert_eq!(reloaded.current(), store.current());
    }

    #[tokio::test]
    async fn without_remote_is_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert!(!store.has_remote());
        assert!(matches!(
            store.push_remote().await.unwrap_err(),
            SyncError::RemoteUnavailable(_)
        ));
        assert!(!store.load_local().await);
    }
}
