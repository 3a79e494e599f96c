//! Quote desk service
//!
//! The single entry point the outer surfaces (HTTP, CLI) call into. Each
//! mutation validates first, then commits to the [`RequestStore`] (which
//! writes the snapshot), then schedules a background push. Submissions also
//! schedule a notification.
//!
//! Explicit remote operations (`reload`, `sync_now`, `reload_settings`) are
//! awaited and return their errors. Background ones only log.

use crate::config::DeskConfig;
use crate::engine::{PullReport, PushReport, SheetSyncEngine};
use crate::error::{DeskError, SyncError};
use crate::notify::NotificationPort;
use crate::settings_store::SettingsStore;
use crate::snapshot::SnapshotCache;
use crate::store::{RequestStore, StoreCounts};
use crate::tabular::TabularStore;
use crate::tasks::BackgroundTasks;
use pq_core::{
    apply_status, detect_source, export, settings, CoreError, DetectedSource, NewRequest,
    QuoteNotification, Request, RequestId, RequestStatus, Settings, SiteInput, SupportedSite,
};
use serde::Serialize;
use std::sync::Arc;

/// What `bootstrap` managed to load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Records warm-started from the snapshot
    pub snapshot_records: usize,
    /// Whether remote settings were loaded
    pub remote_settings: bool,
    /// Remote pull result, if one succeeded
    pub remote_requests: Option<PullReport>,
}

/// Health summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeskStatus {
    /// All records
    pub total: usize,
    /// Active records
    pub active: usize,
    /// Archived records
    pub archived: usize,
    /// Whether a remote store is configured
    pub remote_enabled: bool,
    /// Whether notifications are delivered
    pub notifications_enabled: bool,
    /// Background tasks still running
    pub pending_tasks: usize,
}

/// Request lifecycle and sync facade
#[derive(Debug)]
pub struct QuoteDesk {
    config: DeskConfig,
    requests: Arc<RequestStore>,
    settings: Arc<SettingsStore>,
    sync: Option<Arc<SheetSyncEngine>>,
    notifier: Arc<dyn NotificationPort>,
    tasks: BackgroundTasks,
}

impl QuoteDesk {
    /// Desk with no remote store and no notifier
    #[must_use]
    pub fn new(config: DeskConfig) -> Self {
        let requests = RequestStore::new(SnapshotCache::new(&config.snapshot_path));
        let settings = SettingsStore::new(&config.settings_path);
        Self {
            config,
            requests: Arc::new(requests),
            settings: Arc::new(settings),
            sync: None,
            notifier: Arc::new(crate::notify::NoopNotifier),
            tasks: BackgroundTasks::new(),
        }
    }

    /// With a remote store for requests and settings
    #[must_use]
    pub fn with_remote(mut self, store: Arc<dyn TabularStore>) -> Self {
        let tabs = &self.config.tabs;
        let engine = SheetSyncEngine::new(Arc::clone(&store), &tabs.active, &tabs.archived);
        let settings =
            SettingsStore::new(&self.config.settings_path).with_remote(store, &tabs.settings);
        self.sync = Some(Arc::new(engine));
        self.settings = Arc::new(settings);
        self
    }

    /// With a notification transport
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationPort>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    /// Warm-start from local files, then refresh from the remote if one is
    /// configured. Remote failures are logged and the local state is kept.
    pub async fn bootstrap(&self) -> BootstrapReport {
        self.settings.load_local().await;
        let mut report = BootstrapReport {
            snapshot_records: self.requests.load_snapshot().await,
            ..BootstrapReport::default()
        };

        let Some(sync) = &self.sync else {
            tracing::info!("remote store not configured, using local snapshot only");
            return report;
        };

        match self.settings.pull_remote().await {
            Ok(_) => report.remote_settings = true,
            Err(e) => tracing::warn!(error = %e, "failed to load settings from sheet"),
        }
        match sync.pull(&self.requests).await {
            Ok(pulled) => report.remote_requests = Some(pulled),
            Err(e) => tracing::warn!(error = %e, "failed to load requests from sheet"),
        }
        report
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Accept a public submission.
    ///
    /// # Errors
    /// - `CoreError::MissingField` if name, email or model link is blank;
    ///   nothing is stored and nothing is scheduled
    pub async fn submit(&self, payload: NewRequest) -> Result<Request, DeskError> {
        let record = payload.into_request()?;
        self.requests.insert(record.clone()).await;
        tracing::info!(request_id = %record.id, "accepted quote request");

        self.schedule_push();
        self.schedule_notification(&record);
        Ok(record)
    }

    /// All records, most recent first
    pub async fn list(&self) -> Vec<Request> {
        self.requests.all().await
    }

    /// One record
    ///
    /// # Errors
    /// - `CoreError::NotFound`
    pub async fn get(&self, id: &RequestId) -> Result<Request, DeskError> {
        self.requests
            .get(id)
            .await
            .ok_or_else(|| CoreError::NotFound(id.clone()).into())
    }

    /// Move a record to `status`.
    ///
    /// The status is validated before the record is looked up.
    ///
    /// # Errors
    /// - `CoreError::InvalidStatus` for an unknown status
    /// - `CoreError::NotFound`
    pub async fn set_status(&self, id: &RequestId, status: &str) -> Result<Request, DeskError> {
        let status: RequestStatus = status.parse()?;
        self.mutate(id, |r| apply_status(r, status.as_str()).map(drop))
            .await
    }

    /// Assign or clear the fulfiller; blank clears
    ///
    /// # Errors
    /// - `CoreError::NotFound`
    pub async fn set_fulfilled_by(
        &self,
        id: &RequestId,
        fulfiller: Option<&str>,
    ) -> Result<Request, DeskError> {
        self.mutate(id, |r| {
            r.assign(fulfiller);
            Ok(())
        })
        .await
    }

    /// Replace admin notes
    ///
    /// # Errors
    /// - `CoreError::NotFound`
    pub async fn set_admin_notes(&self, id: &RequestId, notes: &str) -> Result<Request, DeskError> {
        self.mutate(id, |r| {
            r.set_admin_notes(notes);
            Ok(())
        })
        .await
    }

    /// Replace the tracking number (trimmed)
    ///
    /// # Errors
    /// - `CoreError::NotFound`
    pub async fn set_tracking_number(
        &self,
        id: &RequestId,
        tracking: &str,
    ) -> Result<Request, DeskError> {
        self.mutate(id, |r| {
            r.set_tracking_number(tracking);
            Ok(())
        })
        .await
    }

    /// Archive or restore
    ///
    /// # Errors
    /// - `CoreError::NotFound`
    pub async fn set_archived(&self, id: &RequestId, archived: bool) -> Result<Request, DeskError> {
        self.mutate(id, |r| {
            r.set_archived(archived);
            Ok(())
        })
        .await
    }

    /// Replace the collection from the remote.
    ///
    /// # Errors
    /// - `SyncError::RemoteUnavailable` if no remote is configured
    /// - `SyncError::Store` on remote failure; the collection is unchanged
    pub async fn reload(&self) -> Result<PullReport, DeskError> {
        let sync = self.sync.as_ref().ok_or_else(SyncError::not_configured)?;
        Ok(sync.pull(&self.requests).await?)
    }

    /// Push the collection now and wait for it.
    ///
    /// # Errors
    /// - `SyncError::RemoteUnavailable` if no remote is configured
    /// - `SyncError::Store` on remote failure
    pub async fn sync_now(&self) -> Result<PushReport, DeskError> {
        let sync = self.sync.as_ref().ok_or_else(SyncError::not_configured)?;
        Ok(sync.push(&self.requests).await?)
    }

    /// CSV export in canonical column order
    pub async fn export_csv(&self) -> String {
        export::to_csv(&self.requests.all().await)
    }

    /// JSON export
    ///
    /// # Errors
    /// - `serde_json::Error` if serialization fails
    pub async fn export_json(&self) -> serde_json::Result<String> {
        export::to_json(&self.requests.all().await)
    }

    /// Health summary
    pub async fn status(&self) -> DeskStatus {
        let StoreCounts {
            total,
            active,
            archived,
        } = self.requests.counts().await;
        DeskStatus {
            total,
            active,
            archived,
            remote_enabled: self.sync.is_some(),
            notifications_enabled: self.notifier.is_enabled(),
            pending_tasks: self.tasks.pending(),
        }
    }

    /// Wait for every scheduled push and notification
    pub async fn flush(&self) {
        self.tasks.flush().await;
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Current settings
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings.current()
    }

    /// Enabled sites, for the public form
    #[must_use]
    pub fn public_sites(&self) -> Vec<SupportedSite> {
        self.settings
            .current()
            .enabled_sites()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Classify a model link against the current registry
    #[must_use]
    pub fn detect(&self, link: &str) -> DetectedSource {
        detect_source(link, &self.settings.current().supported_sites)
    }

    /// Replace the fulfiller list.
    ///
    /// # Errors
    /// - `CoreError::InvalidSettings` if no usable name remains
    pub async fn update_fulfillers(&self, names: &[String]) -> Result<Settings, DeskError> {
        let names = settings::sanitize_fulfillers(names);
        if names.is_empty() {
            return Err(CoreError::InvalidSettings("provide at least one name".to_string()).into());
        }
        let saved = self
            .settings
            .update(|current| current.fulfiller_names = names)
            .await;
        self.schedule_settings_push();
        Ok(saved)
    }

    /// Replace the site registry.
    ///
    /// # Errors
    /// - `CoreError::InvalidSettings` if no usable site remains
    pub async fn update_sites(&self, sites: &[SiteInput]) -> Result<Settings, DeskError> {
        let sites = settings::sanitize_sites(sites);
        if sites.is_empty() {
            return Err(CoreError::InvalidSettings("provide at least one site".to_string()).into());
        }
        let saved = self
            .settings
            .update(|current| current.supported_sites = sites)
            .await;
        self.schedule_settings_push();
        Ok(saved)
    }

    /// Reload settings from the remote if configured, else the local file.
    ///
    /// # Errors
    /// - `SyncError::Store` on remote failure; settings are unchanged
    pub async fn reload_settings(&self) -> Result<Settings, DeskError> {
        if self.settings.has_remote() {
            return Ok(self.settings.pull_remote().await?);
        }
        self.settings.load_local().await;
        Ok(self.settings.current())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn mutate<F>(&self, id: &RequestId, f: F) -> Result<Request, DeskError>
    where
        F: FnOnce(&mut Request) -> Result<(), CoreError>,
    {
        let updated = self.requests.update(id, f).await?;
        tracing::debug!(request_id = %id, status = %updated.status, "updated request");
        self.schedule_push();
        Ok(updated)
    }

    fn schedule_settings_push(&self) {
        if !self.settings.has_remote() {
            return;
        }
        let settings = Arc::clone(&self.settings);
        self.tasks
            .spawn("settings-push", async move { settings.push_remote().await });
    }

    fn schedule_push(&self) {
        let Some(sync) = &self.sync else {
            return;
        };
        let sync = Arc::clone(sync);
        let requests = Arc::clone(&self.requests);
        self.tasks.spawn("push", async move {
            sync.push(&requests).await.map(drop)
        });
    }

    fn schedule_notification(&self, record: &Request) {
        let source = self.detect(&record.model_link);
        let message = QuoteNotification::compose(record, source, &self.config.admin_url);
        let notifier = Arc::clone(&self.notifier);
        self.tasks
            .spawn("notify", async move { notifier.notify(message).await });
    }
}
