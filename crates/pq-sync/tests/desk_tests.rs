use pq_core::{CoreError, NewRequest, RequestStatus, SiteInput};
use pq_sync::{DeskConfig, MemoryTabularStore, QuoteDesk, TabularStore};
use pq_test_utils::{create_request_at, new_request, row, tab_rows, DeskHarness, FailingNotifier};
use std::sync::Arc;

#[tokio::test]
async fn test_submit_pushes_and_notifies() {
    let harness = DeskHarness::start().await;

    let request = harness.desk.submit(new_request("Ada")).await.unwrap();
    harness.desk.flush().await;

    let active = harness.active_rows();
    assert_eq!(active.len(), 2);
    assert_eq!(active[1][0], request.id.to_string());
    assert_eq!(active[1][6], "New");

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New quote request from Ada");
    assert_eq!(sent[0].source.label, "STLFlix");
}

#[tokio::test]
async fn test_missing_email_changes_nothing() {
    let harness = DeskHarness::start().await;

    let err = harness
        .desk
        .submit(NewRequest::new("Ada", "", "https://stlflix.com/m/1"))
        .await
        .unwrap_err();
    harness.desk.flush().await;

    assert_eq!(err.as_core(), Some(&CoreError::MissingField("email")));
    assert!(harness.desk.list().await.is_empty());
    assert!(harness.notifier.sent().is_empty());
    assert!(harness.remote.calls().is_empty());
}

#[tokio::test]
async fn test_archive_moves_row_between_tabs() {
    let harness = DeskHarness::start().await;
    let request = harness.desk.submit(new_request("Ada")).await.unwrap();

    harness.desk.set_archived(&request.id, true).await.unwrap();
    harness.desk.flush().await;
    assert_eq!(harness.active_rows().len(), 1);
    assert_eq!(harness.archived_rows().len(), 2);
    assert_eq!(harness.archived_rows()[1][8], "Yes");

    harness.desk.set_archived(&request.id, false).await.unwrap();
    harness.desk.flush().await;
    assert_eq!(harness.active_rows().len(), 2);
    assert_eq!(harness.archived_rows().len(), 1);
}

#[tokio::test]
async fn test_push_failure_keeps_memory_and_next_push_recovers() {
    let harness = DeskHarness::start().await;
    harness.remote.fail_writes_to(Some("Active"));

    let request = harness.desk.submit(new_request("Ada")).await.unwrap();
    harness.desk.set_admin_notes(&request.id, "call back").await.unwrap();
    harness.desk.flush().await;

    let stored = harness.desk.get(&request.id).await.unwrap();
    assert_eq!(stored.admin_notes, "call back");
    assert!(harness.desk.sync_now().await.is_err());

    harness.remote.fail_writes_to(None);
    harness.desk.sync_now().await.unwrap();
    assert_eq!(harness.active_rows()[1][9], "call back");
}

#[tokio::test]
async fn test_notification_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let desk = QuoteDesk::new(DeskConfig::in_dir(dir.path())).with_notifier(Arc::new(FailingNotifier));

    desk.submit(new_request("Ada")).await.unwrap();
    desk.flush().await;
    assert_eq!(desk.status().await.total, 1);
}

#[tokio::test]
async fn test_reload_replaces_local_edits() {
    let remote = MemoryTabularStore::new()
        .with_tab(
            "Active",
            tab_rows(&[create_request_at("r1", "2024-01-01T00:00:00Z")]),
        )
        .with_tab("Archived", tab_rows(&[]));
    let harness = DeskHarness::start_with(remote).await;
    assert_eq!(harness.desk.list().await.len(), 1);

    // Someone edits the sheet directly
    let mut edited = create_request_at("r1", "2024-01-01T00:00:00Z");
    edited.status = RequestStatus::Shipped;
    let rows = tab_rows(&[edited]);
    harness.remote.write_rows("Active", 1, &rows).await.unwrap();

    let report = harness.desk.reload().await.unwrap();
    assert_eq!(report.loaded(), 1);
    let r1 = harness.desk.get(&"r1".into()).await.unwrap();
    assert_eq!(r1.status, RequestStatus::Shipped);
}

#[tokio::test]
async fn test_restart_sees_pushed_state() {
    let harness = DeskHarness::start().await;
    let request = harness.desk.submit(new_request("Ada")).await.unwrap();
    harness
        .desk
        .set_status(&request.id, "sent_to_printer")
        .await
        .unwrap();
    harness.desk.set_fulfilled_by(&request.id, Some("Jared")).await.unwrap();
    harness.desk.flush().await;

    let restarted = harness.restart().await;
    let seen = restarted.get(&request.id).await.unwrap();
    assert_eq!(seen.status, RequestStatus::SentToPrinter);
    assert_eq!(seen.fulfilled_by.as_deref(), Some("Jared"));
    assert_eq!(seen.created_at.timestamp(), request.created_at.timestamp());
}

#[tokio::test]
async fn test_settings_edits_reach_remote_tab() {
    let harness = DeskHarness::start().await;

    harness
        .desk
        .update_fulfillers(&["Ann".to_string(), " ann ".to_string(), "Bo".to_string()])
        .await
        .unwrap();
    harness
        .desk
        .update_sites(&[SiteInput {
            name: Some("Printables".to_string()),
            hosts: vec!["www.Printables.com".to_string()],
            ..SiteInput::default()
        }])
        .await
        .unwrap();
    harness.desk.flush().await;

    let tab = harness.remote.tab("Settings").unwrap();
    assert_eq!(tab[0], row(&["Key", "Value"]));
    assert_eq!(tab[1], row(&["fulfillerNames", r#"["Ann","Bo"]"#]));
    assert!(tab[2][1].contains(r#""hosts":["printables.com"]"#));

    let restarted = harness.restart().await;
    assert_eq!(restarted.settings().fulfiller_names, vec!["Ann", "Bo"]);
    assert!(restarted.detect("https://printables.com/model/1").supported);
    assert!(!restarted.detect("https://stlflix.com/m/1").supported);
}

#[tokio::test]
async fn test_bootstrap_creates_missing_tabs() {
    let harness = DeskHarness::start().await;
    let mut names = harness.remote.tab_names();
    names.sort();
    assert_eq!(names, vec!["Active", "Archived", "Settings"]);
    assert_eq!(harness.active_rows(), vec![pq_test_utils::header_row()]);
    assert_eq!(harness.remote.tab("Settings").unwrap(), vec![row(&["Key", "Value"])]);
}
