//! Vellum: workspace core for a desktop writing application.
//!
//! Maintains an in-memory file tree mirroring an opened folder, keeps it
//! consistent with disk through watcher-driven reconciliation, and manages
//! the open document tabs that reference paths inside that tree.

pub mod config;
pub mod document;
pub mod error;
pub mod fs;
pub mod interaction;
pub mod logging;
pub mod notifications;
pub mod tabs;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod workspace;
