//! Workspace session state.
//!
//! One `Workspace` per open window: the current folder's tree, the open
//! tabs, untitled-name counters, and the gateway/interaction/notification
//! seams, threaded through operations as explicit context instead of ambient
//! globals. All access happens from a single logical thread of control;
//! gateway and interaction calls are the suspension points where watcher
//! activity may interleave.

use crate::config::WorkspaceConfig;
use crate::error::WorkspaceError;
use crate::fs::FileSystemGateway;
use crate::interaction::{Interaction, SaveChoice};
use crate::notifications::Notifier;
use crate::tabs::TabRegistry;
use crate::tree::sort::{apply_filter, sort_subtree, SortKey};
use crate::tree::{discover, path, FileTree};
use crate::types::{NodeId, TabId};
use crate::workspace::types::UntitledKey;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub(crate) const CTX_FILE_OP: &str = "file operation";
pub(crate) const CTX_TREE_LOAD: &str = "file tree load";
pub(crate) const CTX_TREE_UPDATE: &str = "file tree update";
pub(crate) const CTX_WATCH: &str = "file watch";

/// Session state for one open window.
pub struct Workspace {
    pub(crate) gateway: Arc<dyn FileSystemGateway>,
    pub(crate) interaction: Arc<dyn Interaction>,
    pub(crate) notifier: Arc<dyn Notifier>,
    config: WorkspaceConfig,
    root: Option<String>,
    pub(crate) tree: Option<FileTree>,
    pub(crate) tabs: TabRegistry,
    sort: SortKey,
    /// Untitled-name counters, keyed per (parent, kind). Session lifetime;
    /// closing a folder does not reset them.
    pub(crate) untitled: HashMap<UntitledKey, u32>,
}

impl Workspace {
    pub fn new(
        gateway: Arc<dyn FileSystemGateway>,
        interaction: Arc<dyn Interaction>,
        notifier: Arc<dyn Notifier>,
        config: WorkspaceConfig,
    ) -> Self {
        Self {
            gateway,
            interaction,
            notifier,
            config,
            root: None,
            tree: None,
            tabs: TabRegistry::new(),
            sort: SortKey::None,
            untitled: HashMap::new(),
        }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn tree(&self) -> Option<&FileTree> {
        self.tree.as_ref()
    }

    pub fn tabs(&self) -> &TabRegistry {
        &self.tabs
    }

    pub(crate) fn require_tree(&mut self) -> Result<&mut FileTree, WorkspaceError> {
        self.tree.as_mut().ok_or(WorkspaceError::NoFolderOpen)
    }

    pub fn find_by_path(&self, target: &str) -> Option<NodeId> {
        self.tree
            .as_ref()
            .and_then(|tree| tree.find_by_path(&path::normalize_str(target)))
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.tree.as_ref().and_then(FileTree::selected)
    }

    // --- Folder lifecycle -------------------------------------------------

    /// Open a folder: close current tabs, discover the tree. Returns
    /// `Ok(false)` when a dirty-tab prompt aborted the switch. The caller
    /// owns starting the watcher for the new root.
    pub async fn open_folder(&mut self, root: &str) -> Result<bool, WorkspaceError> {
        let root = path::normalize_str(root);
        if self.root.as_deref() == Some(root.as_str()) {
            self.notifier
                .info(format!("{} is already open", root), CTX_FILE_OP);
            return Ok(true);
        }
        if !self.close_all_tabs().await? {
            return Ok(false);
        }

        let gateway = Arc::clone(&self.gateway);
        let tree = match discover::load_tree(gateway.as_ref(), &root).await {
            Ok(tree) => tree,
            Err(err) => {
                self.notifier.error(err.to_string(), CTX_TREE_LOAD);
                return Err(err);
            }
        };
        info!(root = %root, nodes = tree.len(), "folder opened");
        self.tree = Some(tree);
        self.root = Some(root.clone());
        self.notifier
            .success(format!("{} opened", path::basename(&root)), CTX_FILE_OP);
        Ok(true)
    }

    /// Close the current folder. Tabs close first, sequentially; an aborted
    /// close leaves the folder open. The caller stops the watcher before
    /// calling this, so no event can arrive for a discarded tree.
    pub async fn close_folder(&mut self) -> Result<bool, WorkspaceError> {
        if !self.close_all_tabs().await? {
            return Ok(false);
        }
        self.tree = None;
        self.root = None;
        Ok(true)
    }

    // --- Presentation -----------------------------------------------------

    pub fn sort_key(&self) -> SortKey {
        self.sort
    }

    /// Re-sort the whole tree and remember the mode for later loads.
    pub fn sort_tree(&mut self, key: SortKey) {
        self.sort = key;
        if let Some(tree) = self.tree.as_mut() {
            let root = tree.root();
            sort_subtree(tree, root, key);
        }
    }

    pub fn filter_tree(&mut self, query: &str) {
        if let Some(tree) = self.tree.as_mut() {
            apply_filter(tree, query);
        }
    }

    // --- Tabs -------------------------------------------------------------

    /// Open a file into a tab, re-activating an existing tab for the path.
    pub async fn open_file(&mut self, target: &str) -> Result<TabId, WorkspaceError> {
        let target = path::normalize_str(target);
        if let Some(existing) = self.tabs.by_path(&target) {
            self.tabs.set_active(existing);
            return Ok(existing);
        }
        let gateway = Arc::clone(&self.gateway);
        let content = gateway.read(&target).await?;
        let name = path::basename(&target).to_string();
        let id = self.tabs.open(
            Some(name),
            Some(target.clone()),
            content,
            &self.config.editor.default_extension,
        );
        self.notifier
            .success(format!("{} opened", target), CTX_FILE_OP);
        Ok(id)
    }

    /// Open a fresh untitled buffer.
    pub fn new_tab(&mut self) -> TabId {
        self.tabs
            .open(None, None, String::new(), &self.config.editor.default_extension)
    }

    pub fn set_active_tab(&mut self, id: TabId) {
        self.tabs.set_active(id);
    }

    pub fn update_tab_content(&mut self, id: TabId, content: String) -> bool {
        self.tabs.update_content(id, content)
    }

    /// Close one tab, running the dirty-save protocol.
    ///
    /// Returns `Ok(false)` when the close was aborted: the user cancelled,
    /// the save failed, or the save-as picker was dismissed. The tab then
    /// stays open and dirty.
    pub async fn close_tab(&mut self, id: TabId) -> Result<bool, WorkspaceError> {
        let (name, dirty) = match self.tabs.get(id) {
            Some(tab) => (tab.name.clone(), tab.is_dirty),
            None => return Ok(false),
        };
        if dirty {
            let interaction = Arc::clone(&self.interaction);
            match interaction.prompt_save(&name).await {
                SaveChoice::Cancel => return Ok(false),
                SaveChoice::DontSave => {}
                SaveChoice::Save => {
                    if !self.save_tab(id, false).await? {
                        return Ok(false);
                    }
                }
            }
        }
        self.tabs.remove(id);
        Ok(true)
    }

    /// Close every tab, sequentially, stopping at the first abort. Later
    /// tabs are left untouched and the overall result is `false`.
    pub async fn close_all_tabs(&mut self) -> Result<bool, WorkspaceError> {
        for id in self.tabs.ids() {
            if !self.close_tab(id).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Save a tab's buffer. Pathless tabs (and `save_as`) go through the
    /// save-path picker; `Ok(false)` means the user dismissed it or the
    /// write failed, and the tab stays dirty.
    pub async fn save_tab(&mut self, id: TabId, save_as: bool) -> Result<bool, WorkspaceError> {
        let (name, current_path, content) = match self.tabs.get(id) {
            Some(tab) => (tab.name.clone(), tab.path.clone(), tab.content.clone()),
            None => return Err(WorkspaceError::UnknownTab),
        };

        let target = match (&current_path, save_as) {
            (Some(p), false) => p.clone(),
            _ => {
                let interaction = Arc::clone(&self.interaction);
                match interaction.pick_save_path(&name).await {
                    Some(p) => path::normalize_str(&p),
                    None => return Ok(false),
                }
            }
        };

        let gateway = Arc::clone(&self.gateway);
        if let Err(err) = gateway.write(&target, &content).await {
            self.notifier.error(
                format!("failed to save {}: {}", target, err),
                CTX_FILE_OP,
            );
            return Ok(false);
        }

        if let Some(tab) = self.tabs.get_mut(id) {
            tab.path = Some(target.clone());
            tab.name = path::basename(&target).to_string();
            tab.is_dirty = false;
        }
        if current_path.as_deref() != Some(target.as_str()) {
            // Saved to a fresh location inside the watched root; the add
            // event will bring the tree up to date.
            debug!(path = %target, "tab saved to new location");
        }
        self.notifier.success(
            format!("{} saved", path::basename(&target)),
            CTX_FILE_OP,
        );
        Ok(true)
    }

    /// Save every dirty tab: pathed tabs first (no prompts), then pathless
    /// ones sequentially through the picker.
    pub async fn save_all_tabs(&mut self) -> Result<bool, WorkspaceError> {
        let dirty: Vec<(TabId, bool)> = self
            .tabs
            .iter()
            .filter(|t| t.is_dirty)
            .map(|t| (t.id, t.path.is_some()))
            .collect();
        let mut all_saved = true;
        for (id, _) in dirty.iter().filter(|(_, pathed)| *pathed) {
            all_saved &= self.save_tab(*id, false).await?;
        }
        for (id, _) in dirty.iter().filter(|(_, pathed)| !*pathed) {
            all_saved &= self.save_tab(*id, false).await?;
        }
        Ok(all_saved)
    }

    /// Close every tab backed by `target` or a path below it, clearing the
    /// backing path first: the disk entry is already gone (or replaced), so
    /// the buffer must not re-save to the vanished location. Cascaded aborts
    /// do not undo anything; the disk-level operation has already committed.
    pub(crate) async fn cascade_close_tabs(&mut self, target: &str) -> Result<(), WorkspaceError> {
        for id in self.tabs.covered_by(target) {
            self.tabs.clear_path(id);
            let closed = self.close_tab(id).await?;
            if !closed {
                debug!(tab = %id, "cascaded close kept tab as in-memory buffer");
            }
        }
        Ok(())
    }
}
