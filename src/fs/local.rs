//! Local filesystem gateway backed by `tokio::fs`.

use super::{seed_content, Entry, FileSystemGateway, Metadata};
use crate::error::WorkspaceError;
use crate::tree::path;
use crate::tree::NodeKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::SystemTime;

/// Gateway over the real filesystem.
#[derive(Debug, Default, Clone)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn timestamp(time: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

fn metadata_from_std(meta: &std::fs::Metadata) -> Metadata {
    Metadata {
        kind: if meta.is_dir() {
            NodeKind::Folder
        } else {
            NodeKind::File
        },
        size: if meta.is_dir() { 0 } else { meta.len() },
        created: timestamp(meta.created()),
        modified: timestamp(meta.modified()),
    }
}

#[async_trait]
impl FileSystemGateway for LocalFileSystem {
    async fn list(&self, dir: &str) -> Result<Vec<Entry>, WorkspaceError> {
        let mut read_dir = tokio::fs::read_dir(Path::new(dir))
            .await
            .map_err(|e| WorkspaceError::from_io(e, dir))?;
        let mut entries = Vec::new();
        while let Some(dir_entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| WorkspaceError::from_io(e, dir))?
        {
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            let entry_path = path::join(&path::normalize_str(dir), &name);
            // Entries that vanish mid-listing are skipped, their unlink
            // event will catch up with the tree.
            let meta = match dir_entry.metadata().await {
                Ok(meta) => metadata_from_std(&meta),
                Err(_) => continue,
            };
            entries.push(Entry {
                name,
                path: entry_path,
                kind: meta.kind,
                size: meta.size,
                created: meta.created,
                modified: meta.modified,
            });
        }
        Ok(entries)
    }

    async fn stat(&self, target: &str) -> Result<Metadata, WorkspaceError> {
        let meta = tokio::fs::metadata(Path::new(target))
            .await
            .map_err(|e| WorkspaceError::from_io(e, target))?;
        Ok(metadata_from_std(&meta))
    }

    async fn create_file(&self, target: &str) -> Result<(), WorkspaceError> {
        if tokio::fs::try_exists(Path::new(target))
            .await
            .map_err(|e| WorkspaceError::from_io(e, target))?
        {
            return Err(WorkspaceError::AlreadyExists(target.to_string()));
        }
        tokio::fs::write(Path::new(target), seed_content(target))
            .await
            .map_err(|e| WorkspaceError::from_io(e, target))
    }

    async fn create_dir(&self, target: &str) -> Result<(), WorkspaceError> {
        if tokio::fs::try_exists(Path::new(target))
            .await
            .map_err(|e| WorkspaceError::from_io(e, target))?
        {
            return Err(WorkspaceError::AlreadyExists(target.to_string()));
        }
        tokio::fs::create_dir_all(Path::new(target))
            .await
            .map_err(|e| WorkspaceError::from_io(e, target))
    }

    async fn remove(&self, target: &str, recursive: bool) -> Result<(), WorkspaceError> {
        let meta = self.stat(target).await?;
        let result = match meta.kind {
            NodeKind::Folder if recursive => tokio::fs::remove_dir_all(Path::new(target)).await,
            NodeKind::Folder => tokio::fs::remove_dir(Path::new(target)).await,
            NodeKind::File => tokio::fs::remove_file(Path::new(target)).await,
        };
        result.map_err(|e| WorkspaceError::from_io(e, target))
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), WorkspaceError> {
        if tokio::fs::try_exists(Path::new(new_path))
            .await
            .map_err(|e| WorkspaceError::from_io(e, new_path))?
        {
            return Err(WorkspaceError::AlreadyExists(new_path.to_string()));
        }
        tokio::fs::rename(Path::new(old_path), Path::new(new_path))
            .await
            .map_err(|e| WorkspaceError::from_io(e, old_path))
    }

    async fn read(&self, target: &str) -> Result<String, WorkspaceError> {
        tokio::fs::read_to_string(Path::new(target))
            .await
            .map_err(|e| WorkspaceError::from_io(e, target))
    }

    async fn write(&self, target: &str, content: &str) -> Result<(), WorkspaceError> {
        tokio::fs::write(Path::new(target), content)
            .await
            .map_err(|e| WorkspaceError::from_io(e, target))
    }
}
