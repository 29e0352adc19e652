//! In-memory filesystem gateway.
//!
//! Backs the test suite and headless drivers. Mirrors the local gateway's
//! error behavior (occupancy checks, not-found classification) and adds
//! single-shot failure injection so atomicity can be exercised without a real
//! disk.

use super::{seed_content, Entry, FileSystemGateway, Metadata};
use crate::error::WorkspaceError;
use crate::tree::path;
use crate::tree::NodeKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct MemEntry {
    kind: NodeKind,
    content: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl MemEntry {
    fn new(kind: NodeKind, content: String) -> Self {
        let now = Utc::now();
        Self {
            kind,
            content,
            created: now,
            modified: now,
        }
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            kind: self.kind,
            size: if self.kind.is_folder() {
                0
            } else {
                self.content.len() as u64
            },
            created: Some(self.created),
            modified: Some(self.modified),
        }
    }
}

/// In-memory gateway with failure injection.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    entries: Mutex<BTreeMap<String, MemEntry>>,
    fail_next: Mutex<Option<String>>,
    denied: Mutex<Vec<String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a directory (and its ancestors) without going through the async
    /// API. Fixture setup for tests.
    pub fn add_dir(&self, dir: &str) {
        let mut entries = self.entries.lock();
        let normalized = path::normalize_str(dir);
        let mut current = normalized.as_str();
        loop {
            entries
                .entry(current.to_string())
                .or_insert_with(|| MemEntry::new(NodeKind::Folder, String::new()));
            let parent = path::dirname(current);
            if parent == current || parent == "/" {
                break;
            }
            current = parent;
        }
    }

    /// Seed a file, creating parent directories. Fixture setup for tests.
    pub fn add_file(&self, file: &str, content: &str) {
        let normalized = path::normalize_str(file);
        self.add_dir(path::dirname(&normalized));
        self.entries
            .lock()
            .insert(normalized, MemEntry::new(NodeKind::File, content.to_string()));
    }

    /// Make the next mutating operation fail with an I/O error carrying
    /// `message`. Read-only operations are unaffected.
    pub fn fail_next_operation(&self, message: &str) {
        *self.fail_next.lock() = Some(message.to_string());
    }

    /// Mark a directory as unreadable: listing it reports permission
    /// denied, the way a protected directory would on disk.
    pub fn deny_dir(&self, dir: &str) {
        self.denied.lock().push(path::normalize_str(dir));
    }

    /// Sorted list of all stored paths. Assertion helper for tests.
    pub fn paths(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn content_of(&self, file: &str) -> Option<String> {
        self.entries.lock().get(file).map(|e| e.content.clone())
    }

    fn take_injected_failure(&self) -> Result<(), WorkspaceError> {
        match self.fail_next.lock().take() {
            Some(message) => Err(WorkspaceError::Io(std::io::Error::new(std::io::ErrorKind::Other, message))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FileSystemGateway for MemoryFileSystem {
    async fn list(&self, dir: &str) -> Result<Vec<Entry>, WorkspaceError> {
        let dir = path::normalize_str(dir);
        if self.denied.lock().contains(&dir) {
            return Err(WorkspaceError::PermissionDenied(dir));
        }
        let entries = self.entries.lock();
        match entries.get(&dir) {
            None => return Err(WorkspaceError::NotFound(dir)),
            Some(entry) if !entry.kind.is_folder() => {
                return Err(WorkspaceError::NotADirectory(dir))
            }
            Some(_) => {}
        }
        Ok(entries
            .iter()
            .filter(|(p, _)| path::dirname(p) == dir && **p != dir)
            .map(|(p, e)| {
                let meta = e.metadata();
                Entry {
                    name: path::basename(p).to_string(),
                    path: p.clone(),
                    kind: meta.kind,
                    size: meta.size,
                    created: meta.created,
                    modified: meta.modified,
                }
            })
            .collect())
    }

    async fn stat(&self, target: &str) -> Result<Metadata, WorkspaceError> {
        let target = path::normalize_str(target);
        self.entries
            .lock()
            .get(&target)
            .map(|e| e.metadata())
            .ok_or(WorkspaceError::NotFound(target))
    }

    async fn create_file(&self, target: &str) -> Result<(), WorkspaceError> {
        self.take_injected_failure()?;
        let target = path::normalize_str(target);
        let mut entries = self.entries.lock();
        if entries.contains_key(&target) {
            return Err(WorkspaceError::AlreadyExists(target));
        }
        let parent = path::dirname(&target).to_string();
        match entries.get(&parent) {
            None => return Err(WorkspaceError::NotFound(parent)),
            Some(entry) if !entry.kind.is_folder() => {
                return Err(WorkspaceError::InvalidParent(parent))
            }
            Some(_) => {}
        }
        let seed = seed_content(&target).to_string();
        entries.insert(target, MemEntry::new(NodeKind::File, seed));
        Ok(())
    }

    async fn create_dir(&self, target: &str) -> Result<(), WorkspaceError> {
        self.take_injected_failure()?;
        let target = path::normalize_str(target);
        let mut entries = self.entries.lock();
        if entries.contains_key(&target) {
            return Err(WorkspaceError::AlreadyExists(target));
        }
        entries.insert(target, MemEntry::new(NodeKind::Folder, String::new()));
        Ok(())
    }

    async fn remove(&self, target: &str, recursive: bool) -> Result<(), WorkspaceError> {
        self.take_injected_failure()?;
        let target = path::normalize_str(target);
        let mut entries = self.entries.lock();
        let entry = entries
            .get(&target)
            .ok_or_else(|| WorkspaceError::NotFound(target.clone()))?;
        if entry.kind.is_folder() {
            let descendants: Vec<String> = entries
                .keys()
                .filter(|p| path::is_descendant(p, &target))
                .cloned()
                .collect();
            if !descendants.is_empty() && !recursive {
                return Err(WorkspaceError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "directory not empty",
                )));
            }
            for p in descendants {
                entries.remove(&p);
            }
        }
        entries.remove(&target);
        Ok(())
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), WorkspaceError> {
        self.take_injected_failure()?;
        let old_path = path::normalize_str(old_path);
        let new_path = path::normalize_str(new_path);
        let mut entries = self.entries.lock();
        if !entries.contains_key(&old_path) {
            return Err(WorkspaceError::NotFound(old_path));
        }
        if entries.contains_key(&new_path) {
            return Err(WorkspaceError::AlreadyExists(new_path));
        }
        let moved: Vec<String> = entries
            .keys()
            .filter(|p| path::covers(&old_path, p))
            .cloned()
            .collect();
        for p in moved {
            if let Some(mut entry) = entries.remove(&p) {
                entry.modified = Utc::now();
                entries.insert(path::rewrite_prefix(&p, &old_path, &new_path), entry);
            }
        }
        Ok(())
    }

    async fn read(&self, target: &str) -> Result<String, WorkspaceError> {
        let target = path::normalize_str(target);
        let entries = self.entries.lock();
        match entries.get(&target) {
            Some(entry) if !entry.kind.is_folder() => Ok(entry.content.clone()),
            Some(_) => Err(WorkspaceError::Io(std::io::Error::new(std::io::ErrorKind::Other, "is a directory"))),
            None => Err(WorkspaceError::NotFound(target)),
        }
    }

    async fn write(&self, target: &str, content: &str) -> Result<(), WorkspaceError> {
        self.take_injected_failure()?;
        let target = path::normalize_str(target);
        let mut entries = self.entries.lock();
        match entries.get_mut(&target) {
            Some(entry) if entry.kind.is_folder() => {
                Err(WorkspaceError::Io(std::io::Error::new(std::io::ErrorKind::Other, "is a directory")))
            }
            Some(entry) => {
                entry.content = content.to_string();
                entry.modified = Utc::now();
                Ok(())
            }
            None => {
                let parent = path::dirname(&target).to_string();
                if !entries.contains_key(&parent) {
                    return Err(WorkspaceError::NotFound(parent));
                }
                entries.insert(target, MemEntry::new(NodeKind::File, content.to_string()));
                Ok(())
            }
        }
    }
}
