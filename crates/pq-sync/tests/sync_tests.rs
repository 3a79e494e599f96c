use pq_core::{Request, RequestStatus};
use pq_sync::{MemoryTabularStore, RequestStore, SheetSyncEngine, SnapshotCache};
use pq_test_utils::{create_request_at, header_row, row, tab_rows};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn engine_over(remote: &Arc<MemoryTabularStore>) -> SheetSyncEngine {
    SheetSyncEngine::new(remote.clone(), "Active", "Archived")
}

fn store_in(dir: &tempfile::TempDir) -> RequestStore {
    RequestStore::new(SnapshotCache::new(dir.path().join("requests-cache.json")))
}

#[tokio::test]
async fn test_pull_tab_decides_archived_flag() {
    let mut stale_active = create_request_at("a1", "2024-02-01T00:00:00Z");
    stale_active.archived = true;
    let stale_archived = create_request_at("b1", "2024-03-01T00:00:00Z");

    let remote = Arc::new(
        MemoryTabularStore::new()
            .with_tab("Active", tab_rows(&[stale_active]))
            .with_tab("Archived", tab_rows(&[stale_archived])),
    );
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    engine_over(&remote).pull(&store).await.unwrap();

    let a1 = store.get(&"a1".into()).await.unwrap();
    let b1 = store.get(&"b1".into()).await.unwrap();
    assert!(!a1.archived);
    assert!(b1.archived);
}

#[tokio::test]
async fn test_pull_sorts_newest_first() {
    let remote = Arc::new(
        MemoryTabularStore::new()
            .with_tab(
                "Active",
                tab_rows(&[create_request_at("old", "2024-01-01T00:00:00Z")]),
            )
            .with_tab(
                "Archived",
                tab_rows(&[create_request_at("new", "2024-06-01T00:00:00Z")]),
            ),
    );
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    engine_over(&remote).pull(&store).await.unwrap();

    let ids: Vec<String> = store.all().await.iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[tokio::test]
async fn test_pull_reads_legacy_layout() {
    let legacy_header = row(&[
        "ID", "Created", "Name", "Email", "STL Link", "Details", "Status", "Fulfilled By",
        "Archived",
    ]);
    let legacy_row = row(&[
        "1700000000000",
        "1/5/2024, 3:04:05 PM",
        "Ada",
        "ada@example.com",
        "https://stlflix.com/m/9",
        "",
        "Quote approved",
        "Jared",
        "No",
    ]);
    let remote = Arc::new(
        MemoryTabularStore::new()
            .with_tab("Active", vec![legacy_header, legacy_row])
            .with_tab("Archived", vec![]),
    );
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let report = engine_over(&remote).pull(&store).await.unwrap();
    assert_eq!(report.active, 1);

    let record = store.get(&"1700000000000".into()).await.unwrap();
    assert_eq!(record.model_link, "https://stlflix.com/m/9");
    assert_eq!(record.status, RequestStatus::QuoteApproved);
    assert_eq!(record.fulfilled_by.as_deref(), Some("Jared"));
    assert_eq!(record.admin_notes, "");

    // Header was extended in place, not replaced
    let header = remote.tab("Active").unwrap().remove(0);
    assert_eq!(header[4], "STL Link");
    assert_eq!(header.len(), header_row().len());
}

#[tokio::test]
async fn test_duplicate_id_keeps_active_copy() {
    let mut active = create_request_at("dup", "2024-01-01T00:00:00Z");
    active.name = "active copy".to_string();
    let mut archived = active.clone();
    archived.name = "archived copy".to_string();

    let remote = Arc::new(
        MemoryTabularStore::new()
            .with_tab("Active", tab_rows(&[active]))
            .with_tab("Archived", tab_rows(&[archived])),
    );
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let report = engine_over(&remote).pull(&store).await.unwrap();
    assert_eq!(report.duplicates, 1);
    assert_eq!(store.len().await, 1);
    assert_eq!(store.get(&"dup".into()).await.unwrap().name, "active copy");
}

#[tokio::test]
async fn test_failed_pull_keeps_memory_and_snapshot() {
    let remote = Arc::new(MemoryTabularStore::new());
    remote.set_offline(true);
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store
        .insert(create_request_at("keep", "2024-01-01T00:00:00Z"))
        .await;

    assert!(engine_over(&remote).pull(&store).await.is_err());

    assert_eq!(store.len().await, 1);
    let reopened = RequestStore::open(SnapshotCache::new(dir.path().join("requests-cache.json"))).await;
    assert_eq!(reopened.len().await, 1);
}

#[tokio::test]
async fn test_concurrent_pushes_end_with_latest_state() {
    let remote = Arc::new(MemoryTabularStore::new());
    let engine = Arc::new(engine_over(&remote));
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store_in(&dir));

    let mut handles = Vec::new();
    for i in 0..5 {
        store
            .insert(create_request_at(&format!("r{i}"), "2024-01-01T00:00:00Z"))
            .await;
        let engine = engine.clone();
        let store = store.clone();
        handles.push(tokio::spawn(async move { engine.push(&store).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Every push cloned under the guard, so whichever ran last saw all five
    engine.push(&store).await.unwrap();
    assert_eq!(remote.tab("Active").unwrap().len(), 6);
}

#[tokio::test]
async fn test_pull_waits_for_inflight_push() {
    let remote = Arc::new(MemoryTabularStore::new());
    let engine = Arc::new(engine_over(&remote));
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store_in(&dir));
    for i in 0..3 {
        store
            .insert(create_request_at(&format!("r{i}"), "2024-01-01T00:00:00Z"))
            .await;
    }
    let mut archived = create_request_at("gone", "2024-02-01T00:00:00Z");
    archived.archived = true;
    store.insert(archived).await;

    remote.set_write_delay(Some(Duration::from_millis(200)));
    let push = tokio::spawn({
        let engine = engine.clone();
        let store = store.clone();
        async move { engine.push(&store).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The push has cleared both tabs by now; a pull must not observe that
    let report = engine.pull(&store).await.unwrap();
    push.await.unwrap().unwrap();

    assert_eq!(report.active, 3);
    assert_eq!(report.archived, 1);
    assert_eq!(store.len().await, 4);
    assert!(store.get(&"gone".into()).await.unwrap().archived);
}

fn arb_partitions() -> impl Strategy<Value = Vec<(u32, bool)>> {
    prop::collection::vec((0u32..1_000_000, any::<bool>()), 0..12)
}

fn records_from(spec: &[(u32, bool)]) -> Vec<Request> {
    spec.iter()
        .enumerate()
        .map(|(i, (secs, archived))| {
            let mut r = create_request_at(&format!("id{i}"), "2024-01-01T00:00:00Z");
            r.created_at += chrono::Duration::seconds(i64::from(*secs));
            r.archived = *archived;
            r
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_push_then_pull_preserves_partitions(spec in arb_partitions()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let remote = Arc::new(MemoryTabularStore::new());
            let engine = engine_over(&remote);
            let dir = tempfile::tempdir().unwrap();
            let store = store_in(&dir);

            let records = records_from(&spec);
            store.replace_all(records.clone()).await;
            engine.push(&store).await.unwrap();

            let other_dir = tempfile::tempdir().unwrap();
            let fresh = store_in(&other_dir);
            engine.pull(&fresh).await.unwrap();

            let pulled = fresh.all().await;
            assert_eq!(pulled.len(), records.len());
            for original in &records {
                let back = pulled.iter().find(|r| r.id == original.id).unwrap();
                assert_eq!(back.archived, original.archived);
                assert_eq!(back.created_at, original.created_at);
            }
            assert!(pulled.windows(2).all(|w| w[0].created_at >= w[1].created_at));

            // A second push writes the same rows in the same order
            let before = (remote.tab("Active"), remote.tab("Archived"));
            engine.push(&fresh).await.unwrap();
            engine.pull(&fresh).await.unwrap();
            engine.push(&fresh).await.unwrap();
            let after = (remote.tab("Active"), remote.tab("Archived"));
            let sorted = |rows: Option<Vec<pq_core::Row>>| {
                let mut rows = rows.unwrap_or_default();
                rows.sort();
                rows
            };
            assert_eq!(sorted(before.0), sorted(after.0));
            assert_eq!(sorted(before.1), sorted(after.1));
        });
    }
}
