//! Watcher-driven reconciliation: idempotence and order tolerance.

use crate::common::{assert_invariant, open_sample};
use vellum::fs::FileSystemGateway;
use vellum::interaction::SaveChoice;
use vellum::workspace::watch::{ChangeEvent, ChangeKind, WatchMessage};

fn event(kind: ChangeKind, path: &str) -> ChangeEvent {
    ChangeEvent::new(kind, path.to_string())
}

#[tokio::test]
async fn add_event_materializes_external_file() {
    let mut h = open_sample().await;
    h.gateway.add_file("/root/docs/external.md", "outside edit");

    h.ws.apply_change(&event(ChangeKind::Add, "/root/docs/external.md"))
        .await
        .unwrap();
    assert!(h.ws.find_by_path("/root/docs/external.md").is_some());
    assert_invariant(&h);
}

#[tokio::test]
async fn add_event_is_idempotent() {
    let mut h = open_sample().await;
    h.gateway.add_file("/root/docs/external.md", "");

    let add = event(ChangeKind::Add, "/root/docs/external.md");
    h.ws.apply_change(&add).await.unwrap();
    let snapshot = h.ws.tree().unwrap().snapshot();
    h.ws.apply_change(&add).await.unwrap();
    assert_eq!(h.ws.tree().unwrap().snapshot(), snapshot);

    // An echo of a user-initiated create is equally a no-op.
    let echo = event(ChangeKind::Add, "/root/docs/a.md");
    h.ws.apply_change(&echo).await.unwrap();
    assert_eq!(h.ws.tree().unwrap().snapshot(), snapshot);
}

#[tokio::test]
async fn add_dir_event_materializes_recursively() {
    let mut h = open_sample().await;
    h.gateway.add_file("/root/imported/sub/x.md", "");
    h.gateway.add_file("/root/imported/y.md", "");

    h.ws.apply_change(&event(ChangeKind::AddDir, "/root/imported"))
        .await
        .unwrap();
    assert!(h.ws.find_by_path("/root/imported/sub/x.md").is_some());
    assert!(h.ws.find_by_path("/root/imported/y.md").is_some());
    assert_invariant(&h);
}

#[tokio::test]
async fn add_event_without_materialized_parent_is_dropped() {
    let mut h = open_sample().await;
    // The parent directory was never added to the tree (and is outside it
    // on disk), so the event has no reachable context.
    h.gateway.add_file("/elsewhere/file.md", "");
    let snapshot = h.ws.tree().unwrap().snapshot();

    h.ws.apply_change(&event(ChangeKind::Add, "/elsewhere/file.md"))
        .await
        .unwrap();
    assert_eq!(h.ws.tree().unwrap().snapshot(), snapshot);
}

#[tokio::test]
async fn add_event_for_vanished_path_is_benign() {
    let mut h = open_sample().await;
    let snapshot = h.ws.tree().unwrap().snapshot();
    h.ws.apply_change(&event(ChangeKind::Add, "/root/docs/ghost.md"))
        .await
        .unwrap();
    assert_eq!(h.ws.tree().unwrap().snapshot(), snapshot);
}

#[tokio::test]
async fn unlink_event_removes_node_and_closes_tabs() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/docs/nested/deep.md").await.unwrap();
    let keeper = h.ws.open_file("/root/readme.md").await.unwrap();

    // Simulate the external deletion, then its event.
    h.gateway.remove("/root/docs/nested", true).await.unwrap();
    h.ws.apply_change(&event(ChangeKind::UnlinkDir, "/root/docs/nested"))
        .await
        .unwrap();

    assert!(h.ws.find_by_path("/root/docs/nested").is_none());
    assert!(h.ws.tabs().get(tab).is_none());
    assert!(h.ws.tabs().get(keeper).is_some());
    assert_invariant(&h);
}

#[tokio::test]
async fn unlink_keeps_dirty_buffer_in_memory_when_close_is_cancelled() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/docs/a.md").await.unwrap();
    h.ws.update_tab_content(tab, "unsaved work".to_string());
    h.interaction.push_save_choice(SaveChoice::Cancel);

    h.gateway.remove("/root/docs/a.md", true).await.unwrap();
    h.ws.apply_change(&event(ChangeKind::Unlink, "/root/docs/a.md"))
        .await
        .unwrap();

    // The node is gone; the buffer survives with no backing path, so it can
    // never re-save to the vanished location.
    assert!(h.ws.find_by_path("/root/docs/a.md").is_none());
    let survivor = h.ws.tabs().get(tab).unwrap();
    assert_eq!(survivor.path, None);
    assert_eq!(survivor.content, "unsaved work");
}

#[tokio::test]
async fn unlink_for_absent_path_is_silent() {
    let mut h = open_sample().await;
    let snapshot = h.ws.tree().unwrap().snapshot();
    h.ws.apply_change(&event(ChangeKind::Unlink, "/root/never-existed.md"))
        .await
        .unwrap();
    h.ws.apply_change(&event(ChangeKind::UnlinkDir, "/root/nor-this"))
        .await
        .unwrap();
    assert_eq!(h.ws.tree().unwrap().snapshot(), snapshot);
    assert!(h.notifier.entries().iter().all(|n| {
        !matches!(
            n.level,
            vellum::notifications::NotificationLevel::Error
                | vellum::notifications::NotificationLevel::Critical
        )
    }));
}

#[tokio::test]
async fn change_event_refreshes_metadata_but_not_tab_content() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/docs/a.md").await.unwrap();

    // External write changes the file under the open buffer.
    h.gateway.write("/root/docs/a.md", "much longer content than before").await.unwrap();
    h.ws.apply_change(&event(ChangeKind::Change, "/root/docs/a.md"))
        .await
        .unwrap();

    let node_id = h.ws.find_by_path("/root/docs/a.md").unwrap();
    let node = h.ws.tree().unwrap().node(node_id).unwrap();
    assert_eq!(node.size, "much longer content than before".len() as u64);
    // The buffer is never silently reloaded from disk.
    assert_eq!(h.ws.tabs().get(tab).unwrap().content, "alpha");
}

#[tokio::test]
async fn events_after_folder_close_are_ignored() {
    let mut h = open_sample().await;
    assert!(h.ws.close_folder().await.unwrap());
    h.ws.apply_change(&event(ChangeKind::Add, "/root/docs/late.md"))
        .await
        .unwrap();
    h.ws.apply_change(&event(ChangeKind::Unlink, "/root/docs/a.md"))
        .await
        .unwrap();
    assert!(h.ws.tree().is_none());
}

#[tokio::test]
async fn transport_errors_surface_as_warnings_and_do_not_stop_the_stream() {
    let mut h = open_sample().await;
    h.gateway.add_file("/root/docs/after-error.md", "");

    h.ws.apply_message(WatchMessage::Error("watch backlog overflow".to_string()))
        .await;
    h.ws.apply_message(WatchMessage::Event(event(
        ChangeKind::Add,
        "/root/docs/after-error.md",
    )))
    .await;

    assert!(h.ws.find_by_path("/root/docs/after-error.md").is_some());
    assert!(h.notifier.entries().iter().any(|n| {
        n.level == vellum::notifications::NotificationLevel::Warning
            && n.message.contains("overflow")
    }));
}

#[tokio::test]
async fn out_of_order_events_for_unrelated_paths_are_safe() {
    let mut h = open_sample().await;
    h.gateway.add_file("/root/new-1.md", "");
    h.gateway.add_file("/root/new-2.md", "");

    // Deliver in an arbitrary interleaving, with duplicates.
    for ev in [
        event(ChangeKind::Unlink, "/root/new-2.md"),
        event(ChangeKind::Add, "/root/new-1.md"),
        event(ChangeKind::Add, "/root/new-2.md"),
        event(ChangeKind::Add, "/root/new-1.md"),
        event(ChangeKind::Change, "/root/new-1.md"),
    ] {
        h.ws.apply_change(&ev).await.unwrap();
    }
    assert!(h.ws.find_by_path("/root/new-1.md").is_some());
    assert!(h.ws.find_by_path("/root/new-2.md").is_some());
    assert_invariant(&h);
}
