//! Presentation ordering and visibility filtering.
//!
//! Sorting is a separate, idempotent pass over a subtree: it reorders
//! `children` recursively and touches nothing else. Discovery imposes no
//! canonical order, and mutation hot paths deliberately skip re-sorting.

use super::path;
use super::{FileTree, NodeKind};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Sort mode for the explorer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    None,
    NameAsc,
    NameDesc,
    TypeAsc,
    TypeDesc,
    CreatedAsc,
    CreatedDesc,
    ModifiedAsc,
    ModifiedDesc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SortKey::None),
            "name-asc" => Ok(SortKey::NameAsc),
            "name-desc" => Ok(SortKey::NameDesc),
            "type-asc" => Ok(SortKey::TypeAsc),
            "type-desc" => Ok(SortKey::TypeDesc),
            "created-asc" => Ok(SortKey::CreatedAsc),
            "created-desc" => Ok(SortKey::CreatedDesc),
            "modified-asc" => Ok(SortKey::ModifiedAsc),
            "modified-desc" => Ok(SortKey::ModifiedDesc),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

fn by_name(tree: &FileTree, a: NodeId, b: NodeId) -> Ordering {
    let a = tree.node(a).map(|n| path::fold_name(&n.label)).unwrap_or_default();
    let b = tree.node(b).map(|n| path::fold_name(&n.label)).unwrap_or_default();
    a.cmp(&b)
}

fn kind_rank(tree: &FileTree, id: NodeId, folders_first: bool) -> u8 {
    let is_folder = tree
        .node(id)
        .map(|n| n.kind == NodeKind::Folder)
        .unwrap_or(false);
    match (is_folder, folders_first) {
        (true, true) | (false, false) => 0,
        _ => 1,
    }
}

fn timestamp(tree: &FileTree, id: NodeId, created: bool) -> i64 {
    tree.node(id)
        .and_then(|n| if created { n.created_at } else { n.modified_at })
        .map(|t| t.timestamp_millis())
        .unwrap_or(0)
}

fn compare(tree: &FileTree, key: SortKey, a: NodeId, b: NodeId) -> Ordering {
    match key {
        SortKey::None => Ordering::Equal,
        SortKey::NameAsc => by_name(tree, a, b),
        SortKey::NameDesc => by_name(tree, b, a),
        SortKey::TypeAsc => kind_rank(tree, a, true)
            .cmp(&kind_rank(tree, b, true))
            .then_with(|| by_name(tree, a, b)),
        SortKey::TypeDesc => kind_rank(tree, a, false)
            .cmp(&kind_rank(tree, b, false))
            .then_with(|| by_name(tree, a, b)),
        SortKey::CreatedAsc => timestamp(tree, a, true).cmp(&timestamp(tree, b, true)),
        SortKey::CreatedDesc => timestamp(tree, b, true).cmp(&timestamp(tree, a, true)),
        SortKey::ModifiedAsc => timestamp(tree, a, false).cmp(&timestamp(tree, b, false)),
        SortKey::ModifiedDesc => timestamp(tree, b, false).cmp(&timestamp(tree, a, false)),
    }
}

/// Sort the subtree rooted at `start`, recursively. `SortKey::None` leaves
/// insertion order untouched. Nodes outside the subtree are not affected.
pub fn sort_subtree(tree: &mut FileTree, start: NodeId, key: SortKey) {
    if key == SortKey::None {
        return;
    }
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        let children = match tree.node(id).and_then(|n| n.children.clone()) {
            Some(children) => children,
            None => continue,
        };
        let mut ordered = children;
        ordered.sort_by(|a, b| compare(tree, key, *a, *b));
        stack.extend(ordered.iter().copied());
        if let Some(node) = tree.node_mut(id) {
            node.children = Some(ordered);
        }
    }
}

/// Apply a case-insensitive substring filter to node visibility. An empty
/// query makes everything visible again.
pub fn apply_filter(tree: &mut FileTree, query: &str) {
    let query = query.to_lowercase();
    let ids = tree.subtree_ids(tree.root());
    for id in ids {
        if let Some(node) = tree.node_mut(id) {
            node.is_visible = query.is_empty() || node.label.to_lowercase().contains(&query);
        }
    }
    let root = tree.root();
    if let Some(node) = tree.node_mut(root) {
        node.is_visible = true;
    }
}
