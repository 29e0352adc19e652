//! Workspace configuration.
//!
//! Layered sources, lowest to highest precedence: built-in defaults, a
//! `vellum.toml` next to the opened folder, and `VELLUM_*` environment
//! variables (`VELLUM_EDITOR__AUTO_SAVE=false` style).

use crate::error::WorkspaceError;
use crate::logging::LoggingConfig;
use crate::workspace::watch::WatchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "vellum.toml";

/// Editor-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Save dirty tabs automatically.
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,

    /// Extension for untitled files and tabs.
    #[serde(default = "default_extension")]
    pub default_extension: String,
}

fn default_auto_save() -> bool {
    true
}

fn default_extension() -> String {
    "md".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            auto_save: default_auto_save(),
            default_extension: default_extension(),
        }
    }
}

/// Full workspace configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WorkspaceConfig {
    /// Load configuration for a workspace root.
    pub fn load(workspace_root: &Path) -> Result<Self, WorkspaceError> {
        Self::load_from(Some(&workspace_root.join(CONFIG_FILE_NAME)))
    }

    /// Write the configuration as TOML, e.g. to seed a workspace with an
    /// editable `vellum.toml`.
    pub fn save(&self, file: &Path) -> Result<(), WorkspaceError> {
        let rendered = toml::to_string_pretty(self)
            .map_err(|e| WorkspaceError::Config(e.to_string()))?;
        std::fs::write(file, rendered).map_err(WorkspaceError::Io)
    }

    /// Load configuration from an explicit file, or defaults plus
    /// environment when `None`.
    pub fn load_from(file: Option<&Path>) -> Result<Self, WorkspaceError> {
        let defaults = config::Config::try_from(&WorkspaceConfig::default())
            .map_err(|e| WorkspaceError::Config(e.to_string()))?;
        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(false));
        }
        builder
            .add_source(config::Environment::with_prefix("VELLUM").separator("__"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| WorkspaceError::Config(e.to_string()))
    }
}
