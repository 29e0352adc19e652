//! Filesystem gateway.
//!
//! The workspace core talks to disk exclusively through [`FileSystemGateway`]:
//! a narrow set of async primitives that either resolve or fail. The local
//! implementation wraps `tokio::fs`; the in-memory implementation backs tests
//! and headless drivers, including failure injection for atomicity checks.

pub mod local;
pub mod memory;

use crate::error::WorkspaceError;
use crate::tree::path;
use crate::tree::NodeKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One directory entry as reported by [`FileSystemGateway::list`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    /// Absolute normalized path.
    pub path: String,
    pub kind: NodeKind,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// Metadata for a single path as reported by [`FileSystemGateway::stat`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metadata {
    pub kind: NodeKind,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// Seed content for freshly created files. Markdown files start with a
/// heading so the editor opens on something other than a blank page.
pub(crate) fn seed_content(path: &str) -> &'static str {
    if path.ends_with(".md") || path.ends_with(".markdown") {
        "# New Document\n\n"
    } else {
        ""
    }
}

/// Async filesystem primitives consumed by the workspace core.
#[async_trait]
pub trait FileSystemGateway: Send + Sync {
    async fn list(&self, path: &str) -> Result<Vec<Entry>, WorkspaceError>;

    async fn stat(&self, path: &str) -> Result<Metadata, WorkspaceError>;

    /// Occupancy probe used for collision checks and keep-both name probing.
    async fn exists(&self, path: &str) -> bool {
        self.stat(path).await.is_ok()
    }

    async fn create_file(&self, path: &str) -> Result<(), WorkspaceError>;

    async fn create_dir(&self, path: &str) -> Result<(), WorkspaceError>;

    async fn remove(&self, path: &str, recursive: bool) -> Result<(), WorkspaceError>;

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), WorkspaceError>;

    /// Move an entry into `dest_dir` under its current name. Returns the new
    /// path.
    async fn move_entry(&self, src: &str, dest_dir: &str) -> Result<String, WorkspaceError> {
        let target = path::join(dest_dir, path::basename(src));
        self.rename(src, &target).await?;
        Ok(target)
    }

    async fn read(&self, path: &str) -> Result<String, WorkspaceError>;

    /// Write a document's content, creating the file if needed.
    async fn write(&self, path: &str, content: &str) -> Result<(), WorkspaceError>;
}
