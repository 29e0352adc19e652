//! Error taxonomy for workspace operations.
//!
//! Mutation operations either fully succeed or fully fail: on any error the
//! in-memory tree is left exactly as it was before the call. Reconciliation
//! errors are reported through the notification seam and never re-enter the
//! event stream.

use thiserror::Error;

/// Errors surfaced by workspace, tree, and gateway operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The opened root is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The path vanished between decision and execution.
    #[error("not found: {0}")]
    NotFound(String),

    /// The target path is already occupied.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A child mutation was attempted against a non-folder node.
    #[error("invalid parent, not a folder: {0}")]
    InvalidParent(String),

    /// A folder cannot be moved into its own subtree.
    #[error("cannot move {0} into its own subtree")]
    MoveIntoSubtree(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// An operation requiring an open folder ran without one.
    #[error("no folder is open")]
    NoFolderOpen,

    /// A node id that is not (or no longer) present in the tree.
    #[error("unknown node id")]
    UnknownNode,

    /// A tab id that is not (or no longer) present in the registry.
    #[error("unknown tab id")]
    UnknownTab,

    #[error("watch error: {0}")]
    Watch(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WorkspaceError {
    /// Classify an I/O error against the path it concerned, so callers see
    /// `NotFound` / `PermissionDenied` / `AlreadyExists` instead of a bare
    /// `Io` wrapper.
    pub fn from_io(err: std::io::Error, path: &str) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => WorkspaceError::NotFound(path.to_string()),
            ErrorKind::PermissionDenied => WorkspaceError::PermissionDenied(path.to_string()),
            ErrorKind::AlreadyExists => WorkspaceError::AlreadyExists(path.to_string()),
            _ => WorkspaceError::Io(err),
        }
    }

    /// True for removal-class misses that reconciliation treats as benign.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkspaceError::NotFound(_))
    }
}
