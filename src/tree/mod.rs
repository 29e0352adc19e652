//! In-memory file tree.
//!
//! The tree mirrors a directory subtree on disk. Nodes live in an arena keyed
//! by stable [`NodeId`]s; parent and child relationships are id references,
//! so the cyclic parent back-link never forms an ownership cycle. Structural
//! operations here are pure in-memory edits: disk access and orchestration
//! live in the workspace layer, which only mutates the tree after the
//! corresponding gateway call succeeded.

pub mod discover;
pub mod node;
pub mod path;
pub mod sort;

pub use node::{NodeKind, TreeNode};

use crate::error::WorkspaceError;
use crate::types::NodeId;
use std::collections::HashMap;

/// Arena-owned file tree for one opened root.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: HashMap<NodeId, TreeNode>,
    root: NodeId,
    selected: Option<NodeId>,
    next_id: u64,
}

impl FileTree {
    /// Create a tree holding only the root folder node.
    pub fn new(root_path: String) -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        let mut root_node = TreeNode::new(root, root_path, NodeKind::Folder, None);
        root_node.is_expanded = true;
        nodes.insert(root, root_node);
        Self {
            nodes,
            root,
            selected: None,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(&id)
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Move selection, keeping the per-node flags consistent.
    pub fn select(&mut self, id: Option<NodeId>) {
        if let Some(prev) = self.selected.take() {
            if let Some(node) = self.nodes.get_mut(&prev) {
                node.is_selected = false;
            }
        }
        if let Some(id) = id {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.is_selected = true;
                self.selected = Some(id);
            }
        }
    }

    fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a freshly discovered entry under `parent`.
    ///
    /// The child's path is derived from the parent's path and `name`, which
    /// keeps the path invariant true by construction. Fails when the parent
    /// is not a folder or already holds a child with this name.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
    ) -> Result<NodeId, WorkspaceError> {
        let parent_path = {
            let parent_node = self.nodes.get(&parent).ok_or(WorkspaceError::UnknownNode)?;
            if !parent_node.is_folder() {
                return Err(WorkspaceError::InvalidParent(parent_node.path.clone()));
            }
            parent_node.path.clone()
        };
        let child_path = path::join(&parent_path, name);
        if self.child_by_label(parent, name).is_some() {
            return Err(WorkspaceError::AlreadyExists(child_path));
        }

        let id = self.alloc();
        let node = TreeNode::new(id, child_path, kind, Some(parent));
        self.nodes.insert(id, node);
        let children = self
            .nodes
            .get_mut(&parent)
            .and_then(|n| n.children.as_mut())
            .expect("parent checked as folder above");
        children.push(id);
        Ok(id)
    }

    /// Exact-label lookup among a folder's children.
    pub fn child_by_label(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let children = self.nodes.get(&parent)?.children.as_ref()?;
        children
            .iter()
            .copied()
            .find(|id| self.nodes.get(id).map(|n| n.label.as_str()) == Some(name))
    }

    /// Collision lookup among a folder's children: case-insensitive
    /// (normalization-folded) name and kind match first, exact match as the
    /// fallback.
    pub fn child_by_folded_label(
        &self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
    ) -> Option<NodeId> {
        let children = self.nodes.get(&parent)?.children.as_ref()?;
        let folded = path::fold_name(name);
        children
            .iter()
            .copied()
            .find(|id| {
                self.nodes
                    .get(id)
                    .map(|n| n.kind == kind && path::fold_name(&n.label) == folded)
                    .unwrap_or(false)
            })
            .or_else(|| {
                children.iter().copied().find(|id| {
                    self.nodes
                        .get(id)
                        .map(|n| n.kind == kind && n.label == name)
                        .unwrap_or(false)
                })
            })
    }

    /// Depth-first search by normalized path. The path invariant guarantees
    /// at most one match.
    pub fn find_by_path(&self, target: &str) -> Option<NodeId> {
        self.find_below(self.root, target)
    }

    fn find_below(&self, id: NodeId, target: &str) -> Option<NodeId> {
        let node = self.nodes.get(&id)?;
        if node.path == target {
            return Some(id);
        }
        if let Some(children) = &node.children {
            for child in children {
                if let Some(found) = self.find_below(*child, target) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// True if `ancestor` lies on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        while let Some(node) = self.nodes.get(&id) {
            match node.parent {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => id = parent,
                None => break,
            }
        }
        false
    }

    /// All ids in the subtree rooted at `id`, depth-first, `id` first.
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                if let Some(children) = &node.children {
                    stack.extend(children.iter().rev().copied());
                }
            }
        }
        out
    }

    /// Detach `id` from its parent's children. The subtree stays in the
    /// arena so it can be re-attached (moves) or dropped (deletes).
    pub fn detach(&mut self, id: NodeId) -> Result<(), WorkspaceError> {
        if id == self.root {
            return Err(WorkspaceError::UnknownNode);
        }
        let parent = self
            .nodes
            .get(&id)
            .ok_or(WorkspaceError::UnknownNode)?
            .parent;
        if let Some(parent) = parent {
            if let Some(children) = self.nodes.get_mut(&parent).and_then(|n| n.children.as_mut()) {
                children.retain(|child| *child != id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
        Ok(())
    }

    /// Attach a detached subtree under `new_parent` and rewrite its paths.
    pub fn attach(&mut self, id: NodeId, new_parent: NodeId) -> Result<Vec<(String, String)>, WorkspaceError> {
        let (parent_path, is_folder) = {
            let parent_node = self
                .nodes
                .get(&new_parent)
                .ok_or(WorkspaceError::UnknownNode)?;
            (parent_node.path.clone(), parent_node.is_folder())
        };
        if !is_folder {
            return Err(WorkspaceError::InvalidParent(parent_path));
        }
        let label = self
            .nodes
            .get(&id)
            .ok_or(WorkspaceError::UnknownNode)?
            .label
            .clone();
        self.nodes
            .get_mut(&new_parent)
            .and_then(|n| n.children.as_mut())
            .expect("parent checked as folder above")
            .push(id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(new_parent);
        }
        Ok(self.rewrite_paths(id, path::join(&parent_path, &label)))
    }

    /// Remove a subtree from the arena entirely. Selection inside the
    /// removed subtree falls back to none.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<(), WorkspaceError> {
        self.detach(id)?;
        for removed in self.subtree_ids(id) {
            if self.selected == Some(removed) {
                self.selected = None;
            }
            self.nodes.remove(&removed);
        }
        Ok(())
    }

    /// Set a new path for `id` and derive every descendant's path from it.
    ///
    /// Descendant paths are materialized eagerly, so a rename or move must
    /// rewrite the whole subtree as one logical step. Returns the
    /// `(old_path, new_path)` pair for every rewritten node so callers can
    /// update tab backing paths in the same pass.
    pub fn rewrite_paths(&mut self, id: NodeId, new_path: String) -> Vec<(String, String)> {
        let mut rewritten = Vec::new();
        let mut stack = vec![(id, new_path)];
        while let Some((current, current_path)) = stack.pop() {
            let children = match self.nodes.get_mut(&current) {
                Some(node) => {
                    let old = std::mem::replace(&mut node.path, current_path.clone());
                    node.label = path::basename(&current_path).to_string();
                    rewritten.push((old, current_path.clone()));
                    node.children.clone()
                }
                None => None,
            };
            if let Some(children) = children {
                for child in children {
                    if let Some(child_node) = self.nodes.get(&child) {
                        stack.push((child, path::join(&current_path, &child_node.label)));
                    }
                }
            }
        }
        rewritten
    }

    /// Check the path invariant over the whole tree. Used by tests after
    /// every mutation and reconciliation step.
    pub fn verify_path_invariant(&self) -> Result<(), String> {
        for (id, node) in &self.nodes {
            if node.label != path::basename(&node.path) {
                return Err(format!(
                    "label {:?} does not match basename of {:?}",
                    node.label, node.path
                ));
            }
            match node.parent {
                None => {
                    if *id != self.root {
                        return Err(format!("non-root node {} has no parent", id));
                    }
                }
                Some(parent_id) => {
                    let parent = self
                        .nodes
                        .get(&parent_id)
                        .ok_or_else(|| format!("dangling parent link on {}", id))?;
                    let expected = path::join(&parent.path, &node.label);
                    if node.path != expected {
                        return Err(format!(
                            "path {:?} expected {:?} under parent {:?}",
                            node.path, expected, parent.path
                        ));
                    }
                    let occurrences = parent
                        .children
                        .as_ref()
                        .map(|c| c.iter().filter(|child| **child == *id).count())
                        .unwrap_or(0);
                    if occurrences != 1 {
                        return Err(format!(
                            "node {} appears {} times in parent children",
                            id, occurrences
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Sorted `(path, kind)` snapshot of the whole tree. Structural equality
    /// of two snapshots is the "tree untouched" check in atomicity tests.
    pub fn snapshot(&self) -> Vec<(String, NodeKind)> {
        let mut out: Vec<(String, NodeKind)> = self
            .nodes
            .values()
            .map(|n| (n.path.clone(), n.kind))
            .collect();
        out.sort();
        out
    }
}
