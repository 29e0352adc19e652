//! Watcher-driven reconciliation.
//!
//! The watcher delivers an unordered, best-effort stream covering the whole
//! watched subtree. Reconciliation is idempotent and order-tolerant:
//! find-before-insert on additions, no-op on already-absent removals, and a
//! silent drop for events whose context is unreachable (parent not
//! materialized, root closed in the meantime). One bad event never stops the
//! stream; failures surface as warnings through the notifier.

use crate::error::WorkspaceError;
use crate::tree::{discover, path};
use crate::workspace::state::{Workspace, CTX_TREE_UPDATE, CTX_WATCH};
use crate::workspace::watch::{ChangeEvent, ChangeKind, WatchMessage};
use std::sync::Arc;
use tracing::debug;

impl Workspace {
    /// Apply one watcher event to the tree.
    ///
    /// Safe to call with stale or duplicate events; a no-op result is not an
    /// error. Events arriving after the folder was closed are ignored.
    pub async fn apply_change(&mut self, event: &ChangeEvent) -> Result<(), WorkspaceError> {
        if self.tree.is_none() {
            debug!(path = %event.path, "event for closed workspace dropped");
            return Ok(());
        }
        match event.kind {
            ChangeKind::Add | ChangeKind::AddDir => self.reconcile_added(&event.path).await,
            ChangeKind::Unlink | ChangeKind::UnlinkDir => {
                self.reconcile_removed(&event.path).await
            }
            ChangeKind::Change => self.reconcile_changed(&event.path).await,
        }
    }

    /// Apply a watch stream message, converting failures into warnings so
    /// subsequent events keep flowing.
    pub async fn apply_message(&mut self, message: WatchMessage) {
        match message {
            WatchMessage::Event(event) => {
                if let Err(err) = self.apply_change(&event).await {
                    self.notifier.warning(
                        format!("failed to apply change for {}: {}", event.path, err),
                        CTX_WATCH,
                    );
                }
            }
            WatchMessage::Error(message) => {
                self.notifier.warning(message, CTX_WATCH);
            }
        }
    }

    async fn reconcile_added(&mut self, raw: &str) -> Result<(), WorkspaceError> {
        let target = path::normalize_str(raw);
        if let Some(tree) = self.tree.as_ref() {
            // Echo of a mutation this session already applied.
            if tree.find_by_path(&target).is_some() {
                return Ok(());
            }
        }

        let gateway = Arc::clone(&self.gateway);
        let meta = match gateway.stat(&target).await {
            Ok(meta) => meta,
            Err(err) if err.is_not_found() => {
                // Vanished again before we got here; its unlink follows.
                debug!(path = %target, "added path already gone");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let tree = match self.tree.as_mut() {
            Some(tree) => tree,
            None => return Ok(()),
        };
        if tree.find_by_path(&target).is_some() {
            return Ok(());
        }
        let parent = match tree.find_by_path(path::dirname(&target)) {
            Some(parent) => parent,
            None => {
                // Parent not materialized or path outside the open root:
                // unreachable context, not an error.
                debug!(path = %target, "no parent node for added path, dropped");
                return Ok(());
            }
        };
        let name = path::basename(&target).to_string();
        let id = match tree.insert_child(parent, &name, meta.kind) {
            Ok(id) => id,
            Err(WorkspaceError::AlreadyExists(_)) => return Ok(()),
            Err(err) => return Err(err),
        };
        if let Some(node) = tree.node_mut(id) {
            discover::apply_metadata(node, &meta);
        }
        if meta.kind.is_folder() {
            discover::populate(gateway.as_ref(), tree, id).await?;
        }
        self.notifier
            .success(format!("{} added", target), CTX_TREE_UPDATE);
        Ok(())
    }

    async fn reconcile_removed(&mut self, raw: &str) -> Result<(), WorkspaceError> {
        let target = path::normalize_str(raw);
        let tree = match self.tree.as_mut() {
            Some(tree) => tree,
            None => return Ok(()),
        };
        let id = match tree.find_by_path(&target) {
            Some(id) => id,
            // Already absent, nothing to reconcile.
            None => return Ok(()),
        };
        tree.remove_subtree(id)?;
        self.notifier
            .success(format!("{} removed", target), CTX_TREE_UPDATE);
        // The files are already gone; buffers lose their backing path and
        // the dirty-save protocol decides whether each closes.
        self.cascade_close_tabs(&target).await?;
        Ok(())
    }

    /// Refresh size and modification time. Open tab content is deliberately
    /// not reloaded from disk: an in-editor buffer must never be silently
    /// replaced under unsaved edits.
    async fn reconcile_changed(&mut self, raw: &str) -> Result<(), WorkspaceError> {
        let target = path::normalize_str(raw);
        let id = match self.tree.as_ref().and_then(|t| t.find_by_path(&target)) {
            Some(id) => id,
            None => return Ok(()),
        };
        let gateway = Arc::clone(&self.gateway);
        let meta = match gateway.stat(&target).await {
            Ok(meta) => meta,
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
        };
        if let Some(node) = self.tree.as_mut().and_then(|t| t.node_mut(id)) {
            node.size = meta.size;
            node.modified_at = meta.modified;
        }
        Ok(())
    }
}
