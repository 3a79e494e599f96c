//! Sheet synchronization engine
//!
//! Keeps the in-memory [`RequestStore`] and the two request tabs consistent.
//!
//! # Protocol
//!
//! - **Pull**: ensure both headers, read both tabs, decode, force the
//!   `archived` flag from the tab each row came from, merge, sort newest
//!   first, replace the collection.
//! - **Push**: partition by `archived`, create missing tabs, clear the data
//!   rows of both tabs, write header plus rows back. Full replace, because
//!   archive toggles move records between tabs and an append cannot remove
//!   a row.
//!
//! Pull and push share one guard so a pull never reads a half-written tab.
//! A push clones the collection only after taking the guard, so queued
//! pushes land in order and the last one carries the latest state.

use crate::error::SyncError;
use crate::store::RequestStore;
use crate::tabular::{RowSpan, StoreError, TabRange, TabularStore, MAX_ROWS};
use pq_core::{Request, Row, RowCodec};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What `ensure_header` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAction {
    /// Header was already complete
    Unchanged,
    /// Tab had no header; canonical header written
    Written,
    /// Header was shorter than canonical; blanks filled in place
    Extended,
}

/// Outcome of a pull
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Records read from the active tab
    pub active: usize,
    /// Records read from the archived tab
    pub archived: usize,
    /// Rows dropped for having no id
    pub skipped: usize,
    /// Records dropped because their id was already seen
    pub duplicates: usize,
}

impl PullReport {
    /// Records now in the collection
    #[inline]
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.active + self.archived - self.duplicates
    }
}

/// Outcome of a push
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Rows written to the active tab
    pub active: usize,
    /// Rows written to the archived tab
    pub archived: usize,
}

/// Two-tab reconciliation engine
#[derive(Debug)]
pub struct SheetSyncEngine {
    store: Arc<dyn TabularStore>,
    active_tab: String,
    archived_tab: String,
    codec: RowCodec,
    guard: Mutex<()>,
}

impl SheetSyncEngine {
    /// Engine over `store` using the current schema
    #[must_use]
    pub fn new(
        store: Arc<dyn TabularStore>,
        active_tab: impl Into<String>,
        archived_tab: impl Into<String>,
    ) -> Self {
        Self {
            store,
            active_tab: active_tab.into(),
            archived_tab: archived_tab.into(),
            codec: RowCodec::current(),
            guard: Mutex::new(()),
        }
    }

    /// With a specific codec
    #[inline]
    #[must_use]
    pub fn with_codec(mut self, codec: RowCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Active tab title
    #[inline]
    #[must_use]
    pub fn active_tab(&self) -> &str {
        &self.active_tab
    }

    /// Archived tab title
    #[inline]
    #[must_use]
    pub fn archived_tab(&self) -> &str {
        &self.archived_tab
    }

    /// Make sure `tab` exists and carries at least the canonical header.
    ///
    /// Existing header cells are kept; only blank or missing positions are
    /// filled. Idempotent.
    ///
    /// # Errors
    /// - `StoreError` from the remote
    pub async fn ensure_header(&self, tab: &str) -> Result<HeaderAction, StoreError> {
        let canonical = self.codec.header();
        self.store.ensure_tab(tab).await?;

        let current = self
            .store
            .read_range(&TabRange::new(tab, RowSpan::header(), canonical.len()))
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let blank = current.iter().all(|cell| cell.trim().is_empty());
        if !blank && current.len() >= canonical.len() {
            return Ok(HeaderAction::Unchanged);
        }

        let mut merged = current;
        merged.resize(canonical.len().max(merged.len()), String::new());
        for (cell, name) in merged.iter_mut().zip(&canonical) {
            if cell.trim().is_empty() {
                cell.clone_from(name);
            }
        }

        self.store.write_rows(tab, 1, &[merged]).await?;

        let action = if blank {
            HeaderAction::Written
        } else {
            HeaderAction::Extended
        };
        tracing::info!(tab, ?action, "initialized request header");
        Ok(action)
    }

    /// Replace the collection with the contents of both tabs.
    ///
    /// On any remote failure the collection is left untouched.
    ///
    /// # Errors
    /// - `SyncError::Store` if either tab cannot be read
    pub async fn pull(&self, requests: &RequestStore) -> Result<PullReport, SyncError> {
        let _guard = self.guard.lock().await;

        let (records, report) = self.fetch().await?;
        requests.replace_all(records).await;

        tracing::info!(
            active = report.active,
            archived = report.archived,
            skipped = report.skipped,
            duplicates = report.duplicates,
            "loaded requests from sheet"
        );
        Ok(report)
    }

    /// Replace both tabs with the current collection.
    ///
    /// # Errors
    /// - `SyncError::Store` if any clear or write fails; the tabs may then
    ///   disagree with each other until the next successful push
    pub async fn push(&self, requests: &RequestStore) -> Result<PushReport, SyncError> {
        let _guard = self.guard.lock().await;

        let records = requests.all().await;
        let report = self.write_partitions(&records).await?;

        tracing::info!(
            active = report.active,
            archived = report.archived,
            "synced requests to sheet"
        );
        Ok(report)
    }

    async fn fetch(&self) -> Result<(Vec<Request>, PullReport), SyncError> {
        futures::try_join!(
            self.ensure_header(&self.active_tab),
            self.ensure_header(&self.archived_tab)
        )?;

        let width = self.codec.version().width();
        let active_range = TabRange::new(&self.active_tab, RowSpan::whole(MAX_ROWS), width);
        let archived_range = TabRange::new(&self.archived_tab, RowSpan::whole(MAX_ROWS), width);
        let (active_rows, archived_rows) = futures::try_join!(
            self.store.read_range(&active_range),
            self.store.read_range(&archived_range),
        )?;

        let active = self.codec.decode_tab(&active_rows);
        let archived = self.codec.decode_tab(&archived_rows);

        let mut report = PullReport {
            active: active.records.len(),
            archived: archived.records.len(),
            skipped: active.skipped + archived.skipped,
            duplicates: 0,
        };

        let tagged = active
            .records
            .into_iter()
            .map(|r| (r, false))
            .chain(archived.records.into_iter().map(|r| (r, true)));

        let mut seen = HashSet::new();
        let mut merged = Vec::with_capacity(report.active + report.archived);
        for (mut record, archived) in tagged {
            if !seen.insert(record.id.clone()) {
                tracing::warn!(request_id = %record.id, "request id present in both tabs");
                report.duplicates += 1;
                continue;
            }
            record.archived = archived;
            merged.push(record);
        }

        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((merged, report))
    }

    async fn write_partitions(&self, records: &[Request]) -> Result<PushReport, SyncError> {
        let (archived, active): (Vec<&Request>, Vec<&Request>) =
            records.iter().partition(|r| r.archived);

        let active_values = self.tab_values(&active);
        let archived_values = self.tab_values(&archived);

        for (tab, values) in [
            (&self.active_tab, &active_values),
            (&self.archived_tab, &archived_values),
        ] {
            if values.len() > MAX_ROWS {
                tracing::warn!(tab = %tab, rows = values.len(), "partition exceeds sheet range");
            }
        }

        futures::try_join!(
            self.store.ensure_tab(&self.active_tab),
            self.store.ensure_tab(&self.archived_tab),
        )?;

        let width = self.codec.version().width();
        let active_range = TabRange::new(&self.active_tab, RowSpan::data(MAX_ROWS), width);
        let archived_range = TabRange::new(&self.archived_tab, RowSpan::data(MAX_ROWS), width);
        futures::try_join!(
            self.store.clear_range(&active_range),
            self.store.clear_range(&archived_range),
        )?;

        futures::try_join!(
            self.store.write_rows(&self.active_tab, 1, &active_values),
            self.store.write_rows(&self.archived_tab, 1, &archived_values),
        )?;

        Ok(PushReport {
            active: active.len(),
            archived: archived.len(),
        })
    }

    fn tab_values(&self, records: &[&Request]) -> Vec<Row> {
        std::iter::once(self.codec.header())
            .chain(records.iter().map(|r| self.codec.encode(r)))
            .collect()
    }
}
