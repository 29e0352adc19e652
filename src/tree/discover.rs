//! Tree discovery through the filesystem gateway.
//!
//! Discovery is eager: one `list` call per folder, every entry materialized.
//! A failure to read the root is fatal to the load; unreadable descendant
//! directories degrade to empty children, a partial tree beats no tree.

use super::path;
use super::{FileTree, TreeNode};
use crate::error::WorkspaceError;
use crate::fs::{Entry, FileSystemGateway, Metadata};
use crate::types::NodeId;
use tracing::debug;

pub(crate) fn apply_metadata(node: &mut TreeNode, meta: &Metadata) {
    node.size = meta.size;
    node.created_at = meta.created;
    node.modified_at = meta.modified;
}

fn insert_entries(tree: &mut FileTree, parent: NodeId, entries: Vec<Entry>) -> Vec<NodeId> {
    let mut folders = Vec::new();
    for entry in entries {
        // An entry already present means this listing raced a concurrent
        // insert for the same path; keep the existing node.
        let id = match tree.insert_child(parent, &entry.name, entry.kind) {
            Ok(id) => id,
            Err(WorkspaceError::AlreadyExists(_)) => continue,
            Err(_) => continue,
        };
        if let Some(node) = tree.node_mut(id) {
            node.size = entry.size;
            node.created_at = entry.created;
            node.modified_at = entry.modified;
        }
        if entry.kind.is_folder() {
            folders.push(id);
        }
    }
    folders
}

/// Recursively materialize the subtree below `start`, which must already be
/// a folder node with empty children. Permission failures and vanished
/// directories leave that folder empty; other gateway errors propagate.
pub async fn populate(
    gateway: &dyn FileSystemGateway,
    tree: &mut FileTree,
    start: NodeId,
) -> Result<(), WorkspaceError> {
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        let dir_path = match tree.node(id) {
            Some(node) => node.path.clone(),
            None => continue,
        };
        let entries = match gateway.list(&dir_path).await {
            Ok(entries) => entries,
            Err(WorkspaceError::PermissionDenied(_)) | Err(WorkspaceError::NotFound(_)) => {
                debug!(path = %dir_path, "directory unreadable, leaving node empty");
                continue;
            }
            Err(err) => return Err(err),
        };
        stack.extend(insert_entries(tree, id, entries));
    }
    Ok(())
}

/// Build the complete tree for `root_path`.
///
/// Fails with `NotADirectory` when the root is not a folder; any error
/// reading the root itself is fatal.
pub async fn load_tree(
    gateway: &dyn FileSystemGateway,
    root_path: &str,
) -> Result<FileTree, WorkspaceError> {
    let root_path = path::normalize_str(root_path);
    let meta = gateway.stat(&root_path).await?;
    if !meta.kind.is_folder() {
        return Err(WorkspaceError::NotADirectory(root_path));
    }

    let mut tree = FileTree::new(root_path.clone());
    let root = tree.root();
    if let Some(node) = tree.node_mut(root) {
        apply_metadata(node, &meta);
    }

    let entries = gateway.list(&root_path).await?;
    let folders = insert_entries(&mut tree, root, entries);
    for folder in folders {
        populate(gateway, &mut tree, folder).await?;
    }
    Ok(tree)
}
