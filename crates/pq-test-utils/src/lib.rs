//! Testing utilities for PQ workspace
//!
//! Shared fixtures, fake notifiers, and a desk harness over a temp dir.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pq_core::{timestamp, NewRequest, QuoteNotification, Request, RequestId, Row, RowCodec};
use pq_sync::{
    DeskConfig, MemoryTabularStore, NotificationPort, NotifyError, QuoteDesk, TabularStore,
};
use std::sync::Arc;
use tempfile::TempDir;

pub fn new_request(name: &str) -> NewRequest {
    NewRequest::new(
        name,
        format!("{}@example.com", name.to_lowercase()),
        "https://platform.stlflix.com/models/1",
    )
}

pub fn create_request(name: &str) -> Request {
    new_request(name).into_request().unwrap()
}

/// Request with a fixed id and creation time (`2024-06-01` or any RFC 3339)
pub fn create_request_at(id: &str, created: &str) -> Request {
    let mut request = create_request(&format!("user-{id}"));
    request.id = RequestId::from(id);
    request.created_at = parse_time(created);
    request
}

pub fn parse_time(value: &str) -> DateTime<Utc> {
    timestamp::parse_flexible(value).unwrap()
}

pub fn header_row() -> Row {
    RowCodec::current().header()
}

/// Header followed by encoded records, as a tab would hold them
pub fn tab_rows(records: &[Request]) -> Vec<Row> {
    let codec = RowCodec::current();
    std::iter::once(codec.header())
        .chain(records.iter().map(|r| codec.encode(r)))
        .collect()
}

pub fn row(cells: &[&str]) -> Row {
    cells.iter().map(|s| (*s).to_string()).collect()
}

/// Notifier that keeps every message it is given
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<QuoteNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<QuoteNotification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn notify(&self, message: QuoteNotification) -> Result<(), NotifyError> {
        self.sent.lock().push(message);
        Ok(())
    }
}

/// Notifier that always fails
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl NotificationPort for FailingNotifier {
    async fn notify(&self, _message: QuoteNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("connection refused".to_string()))
    }
}

/// Desk wired to an in-memory remote and a recording notifier
pub struct DeskHarness {
    pub desk: QuoteDesk,
    pub remote: Arc<MemoryTabularStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub dir: TempDir,
}

impl DeskHarness {
    /// Harness over an empty remote
    pub async fn start() -> Self {
        Self::start_with(MemoryTabularStore::new()).await
    }

    /// Harness over `remote`, already bootstrapped
    pub async fn start_with(remote: MemoryTabularStore) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(remote);
        let notifier = RecordingNotifier::new();
        let desk = QuoteDesk::new(DeskConfig::in_dir(dir.path()))
            .with_remote(Arc::clone(&remote) as Arc<dyn TabularStore>)
            .with_notifier(Arc::clone(&notifier) as Arc<dyn NotificationPort>);
        desk.bootstrap().await;
        remote.clear_calls();
        Self {
            desk,
            remote,
            notifier,
            dir,
        }
    }

    /// A second desk sharing this harness's remote, with its own data dir
    pub async fn restart(&self) -> QuoteDesk {
        let dir = self.dir.path().join("restart");
        let desk = QuoteDesk::new(DeskConfig::in_dir(dir))
            .with_remote(Arc::clone(&self.remote) as Arc<dyn TabularStore>);
        desk.bootstrap().await;
        desk
    }

    pub fn active_rows(&self) -> Vec<Row> {
        self.remote.tab("Active").unwrap_or_default()
    }

    pub fn archived_rows(&self) -> Vec<Row> {
        self.remote.tab("Archived").unwrap_or_default()
    }
}
