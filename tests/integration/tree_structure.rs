//! Discovery and structural properties of the loaded tree.

use crate::common::{assert_invariant, open_sample};
use vellum::error::WorkspaceError;
use vellum::tree::discover::load_tree;
use vellum::tree::NodeKind;

#[tokio::test]
async fn open_folder_discovers_every_entry() {
    let h = open_sample().await;
    let tree = h.ws.tree().unwrap();
    // Root, readme, docs(+3 inside +nested dir), notes(+1 inside).
    assert_eq!(tree.len(), 9);
    assert_eq!(h.ws.root(), Some("/root"));
    for path in [
        "/root/readme.md",
        "/root/docs",
        "/root/docs/a.md",
        "/root/docs/nested/deep.md",
        "/root/notes/note.md",
    ] {
        assert!(h.ws.find_by_path(path).is_some(), "missing {}", path);
    }
    assert_invariant(&h);
}

#[tokio::test]
async fn every_node_id_is_unique_and_stable() {
    let h = open_sample().await;
    let tree = h.ws.tree().unwrap();
    let ids = tree.subtree_ids(tree.root());
    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(ids.len(), deduped.len());
}

#[tokio::test]
async fn non_directory_root_fails_the_load() {
    let mut h = open_sample().await;
    // Current folder survives the failed switch.
    let err = h.ws.open_folder("/root/readme.md").await.unwrap_err();
    assert!(matches!(err, WorkspaceError::NotADirectory(_)));
}

#[tokio::test]
async fn unreadable_directory_yields_empty_node() {
    let mut h = crate::common::harness();
    h.gateway.add_file("/root/open/a.md", "");
    h.gateway.add_file("/root/locked/secret.md", "");
    h.gateway.deny_dir("/root/locked");

    assert!(h.ws.open_folder("/root").await.unwrap());
    let tree = h.ws.tree().unwrap();
    let locked = h.ws.find_by_path("/root/locked").unwrap();
    let node = tree.node(locked).unwrap();
    assert_eq!(node.kind, NodeKind::Folder);
    assert_eq!(node.children.as_deref(), Some(&[][..]));
    // The readable part of the tree is intact.
    assert!(h.ws.find_by_path("/root/open/a.md").is_some());
    assert!(h.ws.find_by_path("/root/locked/secret.md").is_none());
}

#[tokio::test]
async fn unreadable_root_is_fatal() {
    let gateway = vellum::fs::memory::MemoryFileSystem::new();
    gateway.add_file("/root/a.md", "");
    gateway.deny_dir("/root");
    let err = load_tree(&gateway, "/root").await.unwrap_err();
    assert!(matches!(err, WorkspaceError::PermissionDenied(_)));
}

#[tokio::test]
async fn find_by_path_normalizes_input() {
    let h = open_sample().await;
    assert!(h.ws.find_by_path("/root/docs/").is_some());
    assert_eq!(
        h.ws.find_by_path("/root/docs/a.md"),
        h.ws.find_by_path("/root/docs/a.md/")
    );
    assert!(h.ws.find_by_path("/root/ghost.md").is_none());
}
