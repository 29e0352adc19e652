//! Watch events, filtering, and configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Kind of filesystem change reported by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Add,
    AddDir,
    Change,
    Unlink,
    UnlinkDir,
}

impl ChangeKind {
    /// Removal-class events tolerate an already-absent target.
    pub fn is_removal(self) -> bool {
        matches!(self, ChangeKind::Unlink | ChangeKind::UnlinkDir)
    }
}

/// One filesystem change, as delivered to reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Absolute normalized path.
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: String) -> Self {
        Self {
            kind,
            path,
            timestamp: Utc::now(),
        }
    }
}

/// Watch runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce window for repeated `change` events on one path, in
    /// milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Drop events for hidden (dot-prefixed) entries.
    #[serde(default = "default_true")]
    pub ignore_hidden: bool,
    /// Glob-ish patterns for paths the watcher should not report.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/.DS_Store".to_string(),
        "**/*.swp".to_string(),
        "**/*.tmp".to_string(),
    ]
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            ignore_hidden: default_true(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl WatchConfig {
    /// True when the watcher should not report this path at all.
    pub fn ignores(&self, path: &str) -> bool {
        if self.ignore_hidden {
            let hidden = path
                .split('/')
                .any(|segment| segment.starts_with('.') && segment.len() > 1);
            if hidden {
                return true;
            }
        }
        self.ignore_patterns
            .iter()
            .any(|pattern| glob_match(path, pattern))
    }
}

/// Minimal ordered-wildcard matcher: `*` and `**` both match any run of
/// characters. Enough for the ignore patterns this config carries.
fn glob_match(path: &str, pattern: &str) -> bool {
    let normalized = pattern.replace("**", "*");
    let parts: Vec<&str> = normalized.split('*').collect();
    if parts.len() == 1 {
        return path == normalized || path.contains(&normalized);
    }
    let mut rest = path;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(after) => rest = after,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(idx) => rest = &rest[idx + part.len()..],
                None => return false,
            }
        }
    }
    true
}

/// Per-path debouncer for `change` events.
///
/// Editors produce bursts of writes; only the first `change` in the window
/// is forwarded. Structural events always pass and reset the path's window.
pub struct Debouncer {
    window: Duration,
    last_forwarded: HashMap<String, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_forwarded: HashMap::new(),
        }
    }

    pub fn accept(&mut self, event: &ChangeEvent) -> bool {
        match event.kind {
            ChangeKind::Change => {
                let now = Instant::now();
                match self.last_forwarded.get(&event.path) {
                    Some(last) if now.duration_since(*last) < self.window => false,
                    _ => {
                        self.last_forwarded.insert(event.path.clone(), now);
                        true
                    }
                }
            }
            _ => {
                self.last_forwarded.remove(&event.path);
                true
            }
        }
    }
}
