//! User-initiated mutations: create, delete, rename, and their atomicity.

use crate::common::{assert_invariant, open_sample};
use vellum::error::WorkspaceError;

#[tokio::test]
async fn create_file_lands_on_disk_and_in_tree() {
    let mut h = open_sample().await;
    let docs = h.ws.find_by_path("/root/docs").unwrap();
    let id = h.ws.create_file(docs, Some("c.md")).await.unwrap();

    let tree = h.ws.tree().unwrap();
    assert_eq!(tree.node(id).unwrap().path, "/root/docs/c.md");
    assert_eq!(tree.selected(), Some(id));
    assert!(h.gateway.paths().contains(&"/root/docs/c.md".to_string()));
    // Markdown files start with the seeded heading.
    assert_eq!(
        h.gateway.content_of("/root/docs/c.md").unwrap(),
        "# New Document\n\n"
    );
    assert_invariant(&h);
}

#[tokio::test]
async fn untitled_counters_are_keyed_per_parent_and_kind() {
    let mut h = open_sample().await;
    let docs = h.ws.find_by_path("/root/docs").unwrap();
    let notes = h.ws.find_by_path("/root/notes").unwrap();

    let first = h.ws.create_file(docs, None).await.unwrap();
    let second = h.ws.create_file(docs, None).await.unwrap();
    let folder = h.ws.create_folder(docs, None).await.unwrap();
    let other = h.ws.create_file(notes, None).await.unwrap();

    let tree = h.ws.tree().unwrap();
    assert_eq!(tree.node(first).unwrap().label, "Untitled-01.md");
    assert_eq!(tree.node(second).unwrap().label, "Untitled-02.md");
    // Folders number independently of files in the same parent.
    assert_eq!(tree.node(folder).unwrap().label, "Untitled-01");
    // Unrelated folders do not share numbering.
    assert_eq!(tree.node(other).unwrap().label, "Untitled-01.md");
}

#[tokio::test]
async fn untitled_counters_survive_folder_close() {
    let mut h = open_sample().await;
    let docs = h.ws.find_by_path("/root/docs").unwrap();
    h.ws.create_file(docs, None).await.unwrap();

    assert!(h.ws.close_folder().await.unwrap());
    assert!(h.ws.open_folder("/root").await.unwrap());
    let docs = h.ws.find_by_path("/root/docs").unwrap();
    let next = h.ws.create_file(docs, None).await.unwrap();
    assert_eq!(
        h.ws.tree().unwrap().node(next).unwrap().label,
        "Untitled-02.md"
    );
}

#[tokio::test]
async fn create_rejects_occupied_path_and_file_parent() {
    let mut h = open_sample().await;
    let docs = h.ws.find_by_path("/root/docs").unwrap();
    let file = h.ws.find_by_path("/root/docs/a.md").unwrap();

    assert!(matches!(
        h.ws.create_file(docs, Some("a.md")).await,
        Err(WorkspaceError::AlreadyExists(_))
    ));
    assert!(matches!(
        h.ws.create_file(file, Some("x.md")).await,
        Err(WorkspaceError::InvalidParent(_))
    ));
    assert_invariant(&h);
}

#[tokio::test]
async fn failed_create_leaves_tree_untouched() {
    let mut h = open_sample().await;
    let docs = h.ws.find_by_path("/root/docs").unwrap();
    let before = h.ws.tree().unwrap().snapshot();

    h.gateway.fail_next_operation("disk full");
    assert!(h.ws.create_file(docs, Some("c.md")).await.is_err());
    assert_eq!(h.ws.tree().unwrap().snapshot(), before);
    assert_invariant(&h);
}

#[tokio::test]
async fn rename_rewrites_descendants_and_tabs() {
    let mut h = open_sample().await;
    h.ws.open_file("/root/docs/nested/deep.md").await.unwrap();
    h.ws.open_file("/root/docs/a.md").await.unwrap();

    let docs = h.ws.find_by_path("/root/docs").unwrap();
    h.ws.rename_node(docs, "papers").await.unwrap();

    let tree = h.ws.tree().unwrap();
    assert!(tree.find_by_path("/root/docs").is_none());
    assert_eq!(tree.node(docs).unwrap().path, "/root/papers");
    assert!(tree.find_by_path("/root/papers/nested/deep.md").is_some());
    assert_eq!(tree.selected(), Some(docs));

    let tab_paths: Vec<Option<String>> =
        h.ws.tabs().iter().map(|t| t.path.clone()).collect();
    assert!(tab_paths.contains(&Some("/root/papers/nested/deep.md".to_string())));
    assert!(tab_paths.contains(&Some("/root/papers/a.md".to_string())));

    assert!(h.gateway.paths().contains(&"/root/papers/nested/deep.md".to_string()));
    assert_invariant(&h);
}

#[tokio::test]
async fn rename_to_same_name_is_noop_success() {
    let mut h = open_sample().await;
    let a = h.ws.find_by_path("/root/docs/a.md").unwrap();
    let before = h.ws.tree().unwrap().snapshot();
    let id = h.ws.rename_node(a, "a.md").await.unwrap();
    assert_eq!(id, a);
    assert_eq!(h.ws.tree().unwrap().snapshot(), before);
}

#[tokio::test]
async fn rename_collision_is_blocking() {
    let mut h = open_sample().await;
    let a = h.ws.find_by_path("/root/docs/a.md").unwrap();
    assert!(matches!(
        h.ws.rename_node(a, "b.md").await,
        Err(WorkspaceError::AlreadyExists(_))
    ));
    // Tree and disk untouched.
    assert!(h.ws.find_by_path("/root/docs/a.md").is_some());
    assert!(h.gateway.paths().contains(&"/root/docs/a.md".to_string()));
}

#[tokio::test]
async fn failed_rename_leaves_tree_untouched() {
    let mut h = open_sample().await;
    let docs = h.ws.find_by_path("/root/docs").unwrap();
    let before = h.ws.tree().unwrap().snapshot();

    h.gateway.fail_next_operation("device offline");
    assert!(h.ws.rename_node(docs, "papers").await.is_err());
    assert_eq!(h.ws.tree().unwrap().snapshot(), before);
    assert_invariant(&h);
}

#[tokio::test]
async fn declined_delete_changes_nothing() {
    let mut h = open_sample().await;
    let docs = h.ws.find_by_path("/root/docs").unwrap();
    let before = h.ws.tree().unwrap().snapshot();
    // Scripted default answer is "no".
    assert!(!h.ws.delete_node(docs).await.unwrap());
    assert_eq!(h.ws.tree().unwrap().snapshot(), before);
    assert!(h.gateway.paths().contains(&"/root/docs/a.md".to_string()));
}

#[tokio::test]
async fn delete_cascades_over_open_tabs() {
    let mut h = open_sample().await;
    h.ws.open_file("/root/docs/a.md").await.unwrap();
    h.ws.open_file("/root/docs/nested/deep.md").await.unwrap();
    h.ws.open_file("/root/readme.md").await.unwrap();

    let docs = h.ws.find_by_path("/root/docs").unwrap();
    h.interaction.push_confirmation(true);
    assert!(h.ws.delete_node(docs).await.unwrap());

    let tree = h.ws.tree().unwrap();
    assert!(tree.find_by_path("/root/docs").is_none());
    assert_eq!(tree.selected(), None);
    assert!(!h.gateway.paths().iter().any(|p| p.starts_with("/root/docs")));

    // Only the unrelated tab survives.
    assert_eq!(h.ws.tabs().len(), 1);
    assert_eq!(
        h.ws.tabs().iter().next().unwrap().path.as_deref(),
        Some("/root/readme.md")
    );
    assert_invariant(&h);
}

#[tokio::test]
async fn cancelled_cascade_close_does_not_undo_the_delete() {
    let mut h = open_sample().await;
    let tab = h.ws.open_file("/root/docs/a.md").await.unwrap();
    h.ws.update_tab_content(tab, "edited".to_string());

    let docs = h.ws.find_by_path("/root/docs").unwrap();
    h.interaction.push_confirmation(true);
    // The dirty tab's save prompt is cancelled (scripted default).
    assert!(h.ws.delete_node(docs).await.unwrap());

    // Disk and tree deletion already committed; the buffer lives on
    // without a backing path.
    assert!(h.ws.find_by_path("/root/docs").is_none());
    let survivor = h.ws.tabs().get(tab).unwrap();
    assert_eq!(survivor.path, None);
    assert!(survivor.is_dirty);
}

#[tokio::test]
async fn move_into_own_subtree_is_rejected() {
    let mut h = open_sample().await;
    let docs = h.ws.find_by_path("/root/docs").unwrap();
    let nested = h.ws.find_by_path("/root/docs/nested").unwrap();
    assert!(matches!(
        h.ws.move_node(docs, nested).await,
        Err(WorkspaceError::MoveIntoSubtree(_))
    ));
    assert_invariant(&h);
}

#[tokio::test]
async fn mutations_against_unknown_kinds_fail_cleanly() {
    let mut h = open_sample().await;
    let file = h.ws.find_by_path("/root/readme.md").unwrap();
    let a = h.ws.find_by_path("/root/docs/a.md").unwrap();
    // Moving into a file is a contract violation, not a coercion.
    assert!(matches!(
        h.ws.move_node(a, file).await,
        Err(WorkspaceError::InvalidParent(_))
    ));
}
