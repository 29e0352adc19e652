//! File tree node types.

use crate::types::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of filesystem entry a node mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    pub fn is_folder(self) -> bool {
        matches!(self, NodeKind::Folder)
    }
}

/// One filesystem entry inside an opened root.
///
/// Invariant: for every non-root node, `path == parent.path + "/" + label`.
/// Parent and child links are id references into the owning tree's arena;
/// ownership runs strictly top-down through `children`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: NodeId,
    /// Display name, always the basename of `path`.
    pub label: String,
    /// Absolute normalized path, forward-slash separated.
    pub path: String,
    pub kind: NodeKind,
    /// `Some` for folders (a complete snapshot of immediate entries as of the
    /// last sync), `None` for files.
    pub children: Option<Vec<NodeId>>,
    /// Non-owning back reference for upward path reconstruction.
    pub parent: Option<NodeId>,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    // Presentation flags, no consistency relation with disk state.
    pub is_visible: bool,
    pub is_expanded: bool,
    pub is_selected: bool,
}

impl TreeNode {
    pub(crate) fn new(id: NodeId, path: String, kind: NodeKind, parent: Option<NodeId>) -> Self {
        let label = super::path::basename(&path).to_string();
        Self {
            id,
            label,
            path,
            kind,
            children: if kind.is_folder() { Some(Vec::new()) } else { None },
            parent,
            size: 0,
            created_at: None,
            modified_at: None,
            is_visible: true,
            is_expanded: false,
            is_selected: false,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }
}
