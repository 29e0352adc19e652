//! Open document tabs.
//!
//! A tab is an open buffer, optionally backed by a filesystem path. The
//! relationship to tree nodes is a soft one: tabs are matched by path when a
//! node changes, and a tab survives the deletion of its node by dropping the
//! backing path. The registry only manages tab state; the close protocol
//! (save prompts, cascades) is orchestrated by the workspace layer.

use crate::document::DocumentType;
use crate::tree::path;
use crate::types::TabId;

/// One open document.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub name: String,
    /// Backing path; `None` for unsaved untitled buffers.
    pub path: Option<String>,
    pub content: String,
    pub is_dirty: bool,
    pub is_active: bool,
    pub document_type: DocumentType,
}

/// Ordered set of open tabs with at most one active tab.
#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    active: Option<TabId>,
    next_id: u64,
    untitled_counter: u32,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            next_id: 1,
            untitled_counter: 1,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(|t| t.id).collect()
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    pub fn by_path(&self, target: &str) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|t| t.path.as_deref() == Some(target))
            .map(|t| t.id)
    }

    /// Tabs whose backing path equals `target` or lies below it.
    pub fn covered_by(&self, target: &str) -> Vec<TabId> {
        self.tabs
            .iter()
            .filter(|t| t.path.as_deref().map(|p| path::covers(target, p)).unwrap_or(false))
            .map(|t| t.id)
            .collect()
    }

    pub fn active(&self) -> Option<TabId> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.get(id))
    }

    /// Next untitled tab name, `Untitled-NN.<ext>`. The counter wraps from
    /// 99 back to 1.
    fn next_untitled_name(&mut self, extension: &str) -> String {
        let name = format!("Untitled-{:02}.{}", self.untitled_counter, extension);
        self.untitled_counter = if self.untitled_counter >= 99 {
            1
        } else {
            self.untitled_counter + 1
        };
        name
    }

    /// Open a new tab and make it active.
    pub fn open(
        &mut self,
        name: Option<String>,
        backing_path: Option<String>,
        content: String,
        untitled_extension: &str,
    ) -> TabId {
        let name = match name {
            Some(name) => name,
            None => self.next_untitled_name(untitled_extension),
        };
        let document_type = match &backing_path {
            Some(p) => DocumentType::from_path(p),
            None => DocumentType::TextEditor,
        };
        let id = TabId(self.next_id);
        self.next_id += 1;
        for tab in &mut self.tabs {
            tab.is_active = false;
        }
        self.tabs.push(Tab {
            id,
            name,
            path: backing_path,
            content,
            is_dirty: false,
            is_active: true,
            document_type,
        });
        self.active = Some(id);
        id
    }

    /// Remove a tab. When the active tab is removed, the neighbor at the
    /// same position (or the new last tab) becomes active.
    pub fn remove(&mut self, id: TabId) -> Option<Tab> {
        let index = self.tabs.iter().position(|t| t.id == id)?;
        let removed = self.tabs.remove(index);
        if self.active == Some(id) {
            if self.tabs.is_empty() {
                self.active = None;
            } else {
                let next = index.min(self.tabs.len() - 1);
                let next_id = self.tabs[next].id;
                self.set_active(next_id);
            }
        }
        Some(removed)
    }

    pub fn set_active(&mut self, id: TabId) {
        let mut found = false;
        for tab in &mut self.tabs {
            tab.is_active = tab.id == id;
            found |= tab.is_active;
        }
        if found {
            self.active = Some(id);
        }
    }

    /// Record an edit: replaces the buffer and marks the tab dirty.
    pub fn update_content(&mut self, id: TabId, content: String) -> bool {
        match self.get_mut(id) {
            Some(tab) => {
                tab.content = content;
                tab.is_dirty = true;
                true
            }
            None => false,
        }
    }

    /// Point a tab at a new backing path after a rename or move. The display
    /// name and document type follow the path.
    pub fn rebind_path(&mut self, old_path: &str, new_path: &str) {
        if let Some(id) = self.by_path(old_path) {
            if let Some(tab) = self.get_mut(id) {
                tab.path = Some(new_path.to_string());
                tab.name = path::basename(new_path).to_string();
                tab.document_type = DocumentType::from_path(new_path);
            }
        }
    }

    /// Drop a tab's backing path, turning it into an in-memory-only buffer.
    pub fn clear_path(&mut self, id: TabId) {
        if let Some(tab) = self.get_mut(id) {
            tab.path = None;
        }
    }
}
