//! User-initiated tree mutations.
//!
//! Every operation follows the same shape: validate against the in-memory
//! tree, perform the disk operation through the gateway, then apply the tree
//! and tab updates as one step. On failure the tree is left untouched, so a
//! reported error never leaves memory ahead of or behind disk.

use crate::error::WorkspaceError;
use crate::interaction::ConflictChoice;
use crate::tree::{discover, path, NodeKind};
use crate::types::NodeId;
use crate::workspace::state::{Workspace, CTX_FILE_OP};
use crate::workspace::types::{MoveAction, MoveOutcome, PendingConflict, UntitledKey};
use std::sync::Arc;

impl Workspace {
    /// Next synthesized name for an unnamed entry under `parent_path`.
    /// Counters are keyed per (parent, kind) and live for the whole session.
    fn untitled_name(&mut self, parent_path: &str, kind: NodeKind) -> String {
        let extension = self.config().editor.default_extension.clone();
        let key = UntitledKey {
            parent_path: parent_path.to_string(),
            kind,
        };
        let counter = self.untitled.entry(key).or_insert(0);
        *counter += 1;
        match kind {
            NodeKind::Folder => format!("Untitled-{:02}", counter),
            NodeKind::File => format!("Untitled-{:02}.{}", counter, extension),
        }
    }

    /// Create a file under `parent`. A missing `name` synthesizes an
    /// untitled one. The new node is appended and selected.
    pub async fn create_file(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, WorkspaceError> {
        self.create_entry(parent, name, NodeKind::File).await
    }

    /// Create a folder under `parent`. Same shape as [`Self::create_file`].
    pub async fn create_folder(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, WorkspaceError> {
        self.create_entry(parent, name, NodeKind::Folder).await
    }

    async fn create_entry(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
        kind: NodeKind,
    ) -> Result<NodeId, WorkspaceError> {
        let (parent_path, parent_is_folder) = {
            let tree = self.require_tree()?;
            let node = tree.node(parent).ok_or(WorkspaceError::UnknownNode)?;
            (node.path.clone(), node.is_folder())
        };
        if !parent_is_folder {
            let err = WorkspaceError::InvalidParent(parent_path);
            self.notifier.error(err.to_string(), CTX_FILE_OP);
            return Err(err);
        }

        let name = match name {
            Some(name) => name.to_string(),
            None => self.untitled_name(&parent_path, kind),
        };
        let target = path::join(&parent_path, &name);

        let gateway = Arc::clone(&self.gateway);
        if gateway.exists(&target).await {
            let err = WorkspaceError::AlreadyExists(target);
            self.notifier.error(err.to_string(), CTX_FILE_OP);
            return Err(err);
        }
        let created = match kind {
            NodeKind::File => gateway.create_file(&target).await,
            NodeKind::Folder => gateway.create_dir(&target).await,
        };
        if let Err(err) = created {
            self.notifier
                .error(format!("failed to create {}: {}", target, err), CTX_FILE_OP);
            return Err(err);
        }
        let meta = gateway.stat(&target).await.ok();

        let tree = self.require_tree()?;
        // A watcher echo may have inserted the node at this path during the
        // awaits above; adopt it instead of duplicating.
        let id = match tree.insert_child(parent, &name, kind) {
            Ok(id) => id,
            Err(WorkspaceError::AlreadyExists(_)) => tree
                .find_by_path(&target)
                .ok_or(WorkspaceError::UnknownNode)?,
            Err(err) => return Err(err),
        };
        if let Some(meta) = meta {
            if let Some(node) = tree.node_mut(id) {
                discover::apply_metadata(node, &meta);
            }
        }
        tree.select(Some(id));
        self.notifier
            .success(format!("{} created", name), CTX_FILE_OP);
        Ok(id)
    }

    /// Delete a node after confirmation. Returns `Ok(false)` when the user
    /// declines. Tabs under the deleted path are cascade-closed after the
    /// disk delete has committed; a cancelled cascade close does not undo
    /// the delete.
    pub async fn delete_node(&mut self, id: NodeId) -> Result<bool, WorkspaceError> {
        let target = {
            let tree = self.require_tree()?;
            let node = tree.node(id).ok_or(WorkspaceError::UnknownNode)?;
            if node.parent.is_none() {
                return Err(WorkspaceError::InvalidParent(node.path.clone()));
            }
            node.path.clone()
        };

        let interaction = Arc::clone(&self.interaction);
        if !interaction.confirm_delete(&target).await {
            return Ok(false);
        }

        let gateway = Arc::clone(&self.gateway);
        if let Err(err) = gateway.remove(&target, true).await {
            self.notifier
                .error(format!("failed to delete {}: {}", target, err), CTX_FILE_OP);
            return Err(err);
        }

        let tree = self.require_tree()?;
        // The watcher may already have reconciled the removal.
        if tree.node(id).is_some() {
            tree.remove_subtree(id)?;
        }
        self.notifier
            .success(format!("{} deleted", target), CTX_FILE_OP);
        self.cascade_close_tabs(&target).await?;
        if let Some(tree) = self.tree.as_mut() {
            tree.select(None);
        }
        Ok(true)
    }

    /// Rename a node. Renaming to the current name is a no-op success.
    /// Descendant paths and affected tabs are rewritten in the same pass;
    /// the children order is deliberately not re-sorted here.
    pub async fn rename_node(
        &mut self,
        id: NodeId,
        new_name: &str,
    ) -> Result<NodeId, WorkspaceError> {
        let old_path = {
            let tree = self.require_tree()?;
            let node = tree.node(id).ok_or(WorkspaceError::UnknownNode)?;
            if node.label == new_name {
                return Ok(id);
            }
            let parent = node
                .parent
                .ok_or_else(|| WorkspaceError::InvalidParent(node.path.clone()))?;
            if let Some(sibling) = tree.child_by_label(parent, new_name) {
                if sibling != id {
                    return Err(WorkspaceError::AlreadyExists(path::join(
                        path::dirname(&node.path),
                        new_name,
                    )));
                }
            }
            node.path.clone()
        };
        let new_path = path::join(path::dirname(&old_path), new_name);

        let gateway = Arc::clone(&self.gateway);
        if gateway.exists(&new_path).await {
            let err = WorkspaceError::AlreadyExists(new_path);
            self.notifier.error(err.to_string(), CTX_FILE_OP);
            return Err(err);
        }
        if let Err(err) = gateway.rename(&old_path, &new_path).await {
            self.notifier.error(
                format!("failed to rename {}: {}", old_path, err),
                CTX_FILE_OP,
            );
            return Err(err);
        }

        let tree = self.require_tree()?;
        let rewritten = tree.rewrite_paths(id, new_path.clone());
        tree.select(Some(id));
        for (old, new) in &rewritten {
            self.tabs.rebind_path(old, new);
        }
        self.notifier.success(
            format!("{} -> {} renamed", old_path, new_name),
            CTX_FILE_OP,
        );
        Ok(id)
    }

    /// Move a node into `target_folder`.
    ///
    /// A source already in the target directory yields a `skip` outcome. A
    /// name collision becomes a three-way decision: keep both (probe a
    /// `name (n)` variant), replace (delete the occupant, then move), or
    /// cancel (no disk or tree change).
    pub async fn move_node(
        &mut self,
        source: NodeId,
        target_folder: NodeId,
    ) -> Result<MoveOutcome, WorkspaceError> {
        let (source_path, source_label, source_kind) = {
            let tree = self.require_tree()?;
            let node = tree.node(source).ok_or(WorkspaceError::UnknownNode)?;
            if node.parent.is_none() {
                return Err(WorkspaceError::InvalidParent(node.path.clone()));
            }
            (node.path.clone(), node.label.clone(), node.kind)
        };
        let target_dir = {
            let tree = self.require_tree()?;
            let target = tree
                .node(target_folder)
                .ok_or(WorkspaceError::UnknownNode)?;
            if !target.is_folder() {
                return Err(WorkspaceError::InvalidParent(target.path.clone()));
            }
            if source == target_folder || tree.is_ancestor(source, target_folder) {
                return Err(WorkspaceError::MoveIntoSubtree(source_path));
            }
            target.path.clone()
        };
        if path::dirname(&source_path) == target_dir {
            return Ok(MoveOutcome::aborted(MoveAction::Skip));
        }

        let target_path = path::join(&target_dir, &source_label);
        let gateway = Arc::clone(&self.gateway);
        let interaction = Arc::clone(&self.interaction);

        let mut final_path = target_path.clone();
        let mut action = None;
        if gateway.exists(&target_path).await {
            let conflict = PendingConflict {
                source_path: source_path.clone(),
                target_path: target_path.clone(),
                name: source_label.clone(),
                is_directory: source_kind.is_folder(),
            };
            match interaction.resolve_conflict(&conflict).await {
                ConflictChoice::Cancel => {
                    return Ok(MoveOutcome::aborted(MoveAction::Cancel));
                }
                ConflictChoice::Replace => {
                    if let Err(err) = gateway.remove(&target_path, true).await {
                        self.notifier.error(
                            format!("failed to replace {}: {}", target_path, err),
                            CTX_FILE_OP,
                        );
                        return Err(err);
                    }
                    // The replaced entry's buffers lose their backing file.
                    self.cascade_close_tabs(&target_path).await?;
                    if let Err(err) = gateway.rename(&source_path, &target_path).await {
                        self.notifier.error(
                            format!("failed to move {}: {}", source_path, err),
                            CTX_FILE_OP,
                        );
                        return Err(err);
                    }
                    action = Some(MoveAction::Replace);
                }
                ConflictChoice::KeepBoth => {
                    let mut n = 1;
                    loop {
                        let candidate =
                            path::join(&target_dir, &path::numbered_name(&source_label, n));
                        if !gateway.exists(&candidate).await {
                            final_path = candidate;
                            break;
                        }
                        n += 1;
                    }
                    if let Err(err) = gateway.rename(&source_path, &final_path).await {
                        self.notifier.error(
                            format!("failed to move {}: {}", source_path, err),
                            CTX_FILE_OP,
                        );
                        return Err(err);
                    }
                    action = Some(MoveAction::KeepBoth);
                }
            }
        } else if let Err(err) = gateway.rename(&source_path, &target_path).await {
            self.notifier.error(
                format!("failed to move {}: {}", source_path, err),
                CTX_FILE_OP,
            );
            return Err(err);
        }

        let tree = self.require_tree()?;
        if action == Some(MoveAction::Replace) {
            // Drop the occupant's node so the move leaves no stale duplicate
            // under the target folder.
            if let Some(stale) =
                tree.child_by_folded_label(target_folder, &source_label, source_kind)
            {
                if stale != source {
                    tree.remove_subtree(stale)?;
                }
            }
        }
        tree.detach(source)?;
        let final_label = path::basename(&final_path).to_string();
        if let Some(node) = tree.node_mut(source) {
            node.label = final_label;
        }
        let rewritten = tree.attach(source, target_folder)?;
        tree.select(Some(source));
        for (old, new) in &rewritten {
            self.tabs.rebind_path(old, new);
        }
        self.notifier.success(
            format!("{} -> {} moved", source_path, final_path),
            CTX_FILE_OP,
        );
        Ok(match action {
            None => MoveOutcome::moved(final_path),
            Some(action) => MoveOutcome::resolved(action, final_path),
        })
    }
}
