//! Logging setup.
//!
//! Structured logging through `tracing`, configured from the `[logging]`
//! config section with environment overrides. Precedence, highest first:
//! `VELLUM_LOG*` environment variables, the configuration file, defaults.

use crate::error::WorkspaceError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format: text or json.
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stderr, stdout, or file.
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is `file`; `None` resolves a per-user
    /// state-directory default.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            output: default_output(),
            file: None,
        }
    }
}

/// Resolve the log file path: `VELLUM_LOG_FILE`, then config, then the
/// platform state directory.
pub fn resolve_log_file_path(config_file: Option<PathBuf>) -> Result<PathBuf, WorkspaceError> {
    if let Ok(env_path) = std::env::var("VELLUM_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    let project_dirs = directories::ProjectDirs::from("", "vellum", "vellum").ok_or_else(|| {
        WorkspaceError::Config("could not determine platform state directory".to_string())
    })?;
    let state_dir = project_dirs
        .state_dir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_dirs.data_local_dir().to_path_buf());
    Ok(state_dir.join("vellum.log"))
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, WorkspaceError> {
    if let Ok(filter) = EnvFilter::try_from_env("VELLUM_LOG") {
        return Ok(filter);
    }
    config
        .level
        .parse::<EnvFilter>()
        .map_err(|e| WorkspaceError::Config(format!("invalid log level {:?}: {}", config.level, e)))
}

fn env_or<'a>(var: &str, fallback: &'a str) -> String {
    std::env::var(var).unwrap_or_else(|_| fallback.to_string())
}

/// Initialize the global tracing subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), WorkspaceError> {
    let filter = build_env_filter(config)?;
    let format = env_or("VELLUM_LOG_FORMAT", &config.format);
    let output = env_or("VELLUM_LOG_OUTPUT", &config.output);

    let (writer, ansi): (BoxMakeWriter, bool) = match output.as_str() {
        "stdout" => (BoxMakeWriter::new(std::io::stdout), true),
        "stderr" => (BoxMakeWriter::new(std::io::stderr), true),
        "file" => {
            let log_file = resolve_log_file_path(config.file.clone())?;
            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    WorkspaceError::Config(format!("failed to create log directory: {}", e))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .map_err(|e| {
                    WorkspaceError::Config(format!("failed to open log file {:?}: {}", log_file, e))
                })?;
            (BoxMakeWriter::new(file), false)
        }
        other => {
            return Err(WorkspaceError::Config(format!(
                "invalid log output: {} (must be stdout, stderr, or file)",
                other
            )))
        }
    };

    let base = Registry::default().with(filter);
    match format.as_str() {
        "json" => base
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .init(),
        "text" => base
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .init(),
        other => {
            return Err(WorkspaceError::Config(format!(
                "invalid log format: {} (must be text or json)",
                other
            )))
        }
    }
    Ok(())
}
