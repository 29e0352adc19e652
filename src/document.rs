//! Document type detection.
//!
//! A tab's document type is derived from its backing path's extension and
//! decides which editor surface the UI layer mounts for it.

use serde::{Deserialize, Serialize};

pub const TEXT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];

/// Editor surface a document is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    TextEditor,
    PdfViewer,
    ImageViewer,
    Unknown,
}

impl DocumentType {
    /// Detect from a path's extension.
    pub fn from_path(path: &str) -> Self {
        let name = crate::tree::path::basename(path);
        match crate::tree::path::split_stem_ext(name) {
            (_, Some(ext)) => Self::from_extension(ext),
            (_, None) => DocumentType::Unknown,
        }
    }

    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.to_ascii_lowercase();
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            DocumentType::TextEditor
        } else if PDF_EXTENSIONS.contains(&ext.as_str()) {
            DocumentType::PdfViewer
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            DocumentType::ImageViewer
        } else {
            DocumentType::Unknown
        }
    }
}
