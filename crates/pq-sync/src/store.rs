//! The authoritative in-memory request collection
//!
//! One mutex covers each read-modify-write and the snapshot write that
//! follows it, so the snapshot on disk never lags a mutation another caller
//! has already observed. Snapshot failures are logged, not returned: the
//! in-memory copy stays the source of truth.

use crate::snapshot::SnapshotCache;
use pq_core::{CoreError, Request, RequestId};
use tokio::sync::Mutex;

/// Counts by partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    /// All records
    pub total: usize,
    /// Records in the active partition
    pub active: usize,
    /// Records in the archived partition
    pub archived: usize,
}

/// Most-recent-first request collection with a write-through snapshot
#[derive(Debug)]
pub struct RequestStore {
    records: Mutex<Vec<Request>>,
    snapshot: SnapshotCache,
}

impl RequestStore {
    /// Empty store mirrored to `snapshot`
    #[inline]
    #[must_use]
    pub fn new(snapshot: SnapshotCache) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            snapshot,
        }
    }

    /// Store warm-started from the snapshot file
    pub async fn open(snapshot: SnapshotCache) -> Self {
        let store = Self::new(snapshot);
        store.load_snapshot().await;
        store
    }

    /// Replace the collection with the snapshot contents.
    ///
    /// An unreadable snapshot is logged and leaves the collection as it was.
    /// Returns the number of records loaded.
    pub async fn load_snapshot(&self) -> usize {
        match self.snapshot.load().await {
            Ok(records) => {
                let records = dedupe(records);
                let count = records.len();
                tracing::info!(
                    count,
                    path = %self.snapshot.path().display(),
                    "loaded request snapshot"
                );
                *self.records.lock().await = records;
                count
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load request snapshot");
                0
            }
        }
    }

    /// Prepend a new record
    pub async fn insert(&self, record: Request) {
        let mut records = self.records.lock().await;
        records.insert(0, record);
        self.persist(&records).await;
    }

    /// Mutate one record in place.
    ///
    /// `mutate` runs under the lock; if it fails the record is left as it
    /// was and no snapshot is written.
    ///
    /// # Errors
    /// - `CoreError::NotFound` if no record has `id`
    /// - whatever `mutate` returns
    pub async fn update<F>(&self, id: &RequestId, mutate: F) -> Result<Request, CoreError>
    where
        F: FnOnce(&mut Request) -> Result<(), CoreError>,
    {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| CoreError::NotFound(id.clone()))?;

        let mut draft = record.clone();
        mutate(&mut draft)?;
        *record = draft.clone();

        self.persist(&records).await;
        Ok(draft)
    }

    /// Replace the whole collection
    pub async fn replace_all(&self, replacement: Vec<Request>) {
        let mut records = self.records.lock().await;
        *records = dedupe(replacement);
        self.persist(&records).await;
    }

    /// Clone of every record, most recent first
    pub async fn all(&self) -> Vec<Request> {
        self.records.lock().await.clone()
    }

    /// Clone of one record
    pub async fn get(&self, id: &RequestId) -> Option<Request> {
        self.records
            .lock()
            .await
            .iter()
            .find(|r| &r.id == id)
            .cloned()
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Partition counts
    pub async fn counts(&self) -> StoreCounts {
        let records = self.records.lock().await;
        let archived = records.iter().filter(|r| r.archived).count();
        StoreCounts {
            total: records.len(),
            active: records.len() - archived,
            archived,
        }
    }

    async fn persist(&self, records: &[Request]) {
        if let Err(e) = self.snapshot.save(records).await {
            tracing::warn!(error = %e, "failed to write request snapshot");
        }
    }
}

/// Keep the first copy of each id
fn dedupe(records: Vec<Request>) -> Vec<Request> {
    let mut seen = std::collections::HashSet::new();
    let before = records.len();
    let kept: Vec<Request> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if kept.len() != before {
        tracing::warn!(dropped = before - kept.len(), "dropped duplicate request ids");
    }
    kept
}
