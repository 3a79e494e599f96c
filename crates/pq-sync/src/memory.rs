//! In-memory [`TabularStore`]
//!
//! Behaves like the Sheets values API for the calls the engine makes:
//! trailing blank cells and rows are trimmed on read, unknown tabs are
//! rejected. Outages, per-tab write failures and slow writes can be
//! injected.

use crate::tabular::{RowSpan, StoreError, TabRange, TabularStore};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use pq_core::Row;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Call recorded by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `read_range`
    Read(String),
    /// `clear_range`
    Clear(String),
    /// `write_rows` with the number of rows written
    Write {
        /// Tab title
        tab: String,
        /// First row written
        first_row: usize,
        /// Rows written
        rows: usize,
    },
    /// `ensure_tab`
    EnsureTab(String),
}

/// Tab map guarded by a mutex
#[derive(Debug, Default)]
pub struct MemoryTabularStore {
    tabs: Mutex<IndexMap<String, Vec<Row>>>,
    calls: Mutex<Vec<StoreCall>>,
    offline: AtomicBool,
    failing_tab: Mutex<Option<String>>,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryTabularStore {
    /// Empty store with no tabs
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a tab holding `rows`
    #[must_use]
    pub fn with_tab(self, tab: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tabs.lock().insert(tab.into(), rows);
        self
    }

    /// Simulate an outage: every call fails with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make writes to one tab fail; `None` clears the fault
    pub fn fail_writes_to(&self, tab: Option<&str>) {
        *self.failing_tab.lock() = tab.map(str::to_string);
    }

    /// Hold every write for `delay` before applying it; `None` clears it
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *self.write_delay.lock() = delay;
    }

    /// Current contents of a tab, trailing blanks trimmed
    #[must_use]
    pub fn tab(&self, tab: &str) -> Option<Vec<Row>> {
        self.tabs.lock().get(tab).map(|rows| trim_rows(rows.clone()))
    }

    /// Tab titles in creation order
    #[must_use]
    pub fn tab_names(&self) -> Vec<String> {
        self.tabs.lock().keys().cloned().collect()
    }

    /// Calls made so far
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }
}

fn missing_tab(tab: &str) -> StoreError {
    StoreError::Rejected {
        status: 400,
        message: format!("Unable to parse range: {tab}"),
    }
}

fn trim_row(mut row: Row) -> Row {
    while row.last().is_some_and(String::is_empty) {
        row.pop();
    }
    row
}

fn trim_rows(rows: Vec<Row>) -> Vec<Row> {
    let mut rows: Vec<Row> = rows.into_iter().map(trim_row).collect();
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }
    rows
}

#[async_trait]
impl TabularStore for MemoryTabularStore {
    async fn read_range(&self, range: &TabRange) -> Result<Vec<Row>, StoreError> {
        self.check_online()?;
        self.record(StoreCall::Read(range.to_a1()));

        let tabs = self.tabs.lock();
        let rows = tabs.get(&range.tab).ok_or_else(|| missing_tab(&range.tab))?;
        let RowSpan { first, last } = range.rows;

        let slice: Vec<Row> = rows
            .iter()
            .enumerate()
            .filter(|(i, _)| (first..=last).contains(&(i + 1)))
            .map(|(_, row)| row.iter().take(range.width).cloned().collect())
            .collect();
        Ok(trim_rows(slice))
    }

    async fn clear_range(&self, range: &TabRange) -> Result<(), StoreError> {
        self.check_online()?;
        self.record(StoreCall::Clear(range.to_a1()));

        let mut tabs = self.tabs.lock();
        let rows = tabs
            .get_mut(&range.tab)
            .ok_or_else(|| missing_tab(&range.tab))?;
        for (i, row) in rows.iter_mut().enumerate() {
            if range.rows.contains(i + 1) {
                for cell in row.iter_mut().take(range.width) {
                    cell.clear();
                }
            }
        }
        Ok(())
    }

    async fn write_rows(
        &self,
        tab: &str,
        first_row: usize,
        rows: &[Row],
    ) -> Result<(), StoreError> {
        self.check_online()?;
        if self.failing_tab.lock().as_deref() == Some(tab) {
            return Err(StoreError::Rejected {
                status: 500,
                message: format!("injected write failure on {tab}"),
            });
        }
        self.record(StoreCall::Write {
            tab: tab.to_string(),
            first_row,
            rows: rows.len(),
        });

        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut tabs = self.tabs.lock();
        let existing = tabs.get_mut(tab).ok_or_else(|| missing_tab(tab))?;
        let start = first_row.saturating_sub(1);
        if existing.len() < start + rows.len() {
            existing.resize(start + rows.len(), Vec::new());
        }
        for (offset, row) in rows.iter().enumerate() {
            let target = &mut existing[start + offset];
            if target.len() < row.len() {
                target.resize(row.len(), String::new());
            }
            for (i, cell) in row.iter().enumerate() {
                target[i].clone_from(cell);
            }
        }
        Ok(())
    }

    async fn ensure_tab(&self, tab: &str) -> Result<(), StoreError> {
        self.check_online()?;
        self.record(StoreCall::EnsureTab(tab.to_string()));
        self.tabs.lock().entry(tab.to_string()).or_default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn read_trims_and_limits_width() {
        let store = MemoryTabularStore::new().with_tab(
            "T",
            vec![row(&["a", "b", "c"]), row(&["d", "", ""]), row(&[])],
        );
        let rows = store
            .read_range(&TabRange::new("T", RowSpan::whole(100), 2))
            .await
            .unwrap();
        assert_eq!(rows, vec![row(&["a", "b"]), row(&["d"])]);
    }

    #[tokio::test]
    async fn clear_keeps_cells_outside_range() {
        let store =
            MemoryTabularStore::new().with_tab("T", vec![row(&["h1", "h2"]), row(&["x", "y", "z"])]);
        store
            .clear_range(&TabRange::new("T", RowSpan::data(100), 2))
            .await
            .unwrap();
        assert_eq!(
            store.tab("T").unwrap(),
            vec![row(&["h1", "h2"]), row(&["", "", "z"])]
        );
    }

    #[tokio::test]
    async fn write_overlays_cells() {
        let store = MemoryTabularStore::new().with_tab("T", vec![row(&["a", "b", "c"])]);
        store.write_rows("T", 1, &[row(&["A"]), row(&["B", "C"])]).await.unwrap();
        assert_eq!(store.tab("T").unwrap(), vec![row(&["A", "b", "c"]), row(&["B", "C"])]);
    }

    #[tokio::test]
    async fn unknown_tab_rejected() {
        let store = MemoryTabularStore::new();
        let err = store
            .read_range(&TabRange::new("Nope", RowSpan::header(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 400, .. }));

        store.ensure_tab("Nope").await.unwrap();
        assert_eq!(store.tab_names(), vec!["Nope".to_string()]);
    }

    #[tokio::test]
    async fn offline_fails_everything() {
        let store = MemoryTabularStore::new();
        store.set_offline(true);
        assert!(store.ensure_tab("T").await.unwrap_err().is_unavailable());
        assert!(store.calls().is_empty());
    }
}
