//! Watch runtime: notify-backed directory watchers, one per opened root.
//!
//! Raw notify events arrive on a watcher thread, get converted to
//! [`ChangeEvent`]s, filtered and debounced on a pump thread, and are
//! forwarded over a futures channel. The receiver side implements `Stream`;
//! the workspace driver pulls from it and feeds reconciliation. The pump owns
//! no workspace state.

use super::events::{ChangeEvent, ChangeKind, Debouncer, WatchConfig};
use crate::error::WorkspaceError;
use crate::tree::path;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Message on the watch stream: a change event, or a transport-level error
/// that the driver should surface as a warning without tearing the watch
/// down.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchMessage {
    Event(ChangeEvent),
    Error(String),
}

struct ActiveWatch {
    running: Arc<RwLock<bool>>,
    // Kept alive for the registration's lifetime; dropping it ends the
    // notify subscription and lets the pump drain out.
    _watcher: RecommendedWatcher,
}

/// Per-root watcher registrations.
///
/// Each opened folder holds at most one registration: starting a watch for a
/// root that is already watched stops the prior registration first, and
/// `stop` is idempotent.
pub struct WatchService {
    config: WatchConfig,
    active: HashMap<String, ActiveWatch>,
}

impl WatchService {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            active: HashMap::new(),
        }
    }

    pub fn is_watching(&self, root: &str) -> bool {
        self.active.contains_key(&path::normalize_str(root))
    }

    pub fn active_roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self.active.keys().cloned().collect();
        roots.sort();
        roots
    }

    /// Start watching `root` recursively, returning the event stream.
    pub fn start(&mut self, root: &str) -> Result<UnboundedReceiver<WatchMessage>, WorkspaceError> {
        let root = path::normalize_str(root);
        self.stop(&root);

        let (raw_tx, raw_rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = raw_tx.send(res);
        })
        .map_err(|e| WorkspaceError::Watch(format!("failed to create watcher: {}", e)))?;
        watcher
            .watch(Path::new(&root), RecursiveMode::Recursive)
            .map_err(|e| WorkspaceError::Watch(format!("failed to watch {}: {}", root, e)))?;

        let (tx, rx) = unbounded();
        let running = Arc::new(RwLock::new(true));
        {
            let root = root.clone();
            let config = self.config.clone();
            let running = Arc::clone(&running);
            std::thread::spawn(move || pump_loop(root, config, raw_rx, tx, running));
        }

        info!(root = %root, "watching folder");
        self.active.insert(
            root,
            ActiveWatch {
                running,
                _watcher: watcher,
            },
        );
        Ok(rx)
    }

    /// Stop the registration for `root`. No-op when the root is not watched.
    pub fn stop(&mut self, root: &str) {
        let root = path::normalize_str(root);
        if let Some(watch) = self.active.remove(&root) {
            *watch.running.write() = false;
            info!(root = %root, "stopped watching folder");
        }
    }

    pub fn stop_all(&mut self) {
        let roots = self.active_roots();
        for root in roots {
            self.stop(&root);
        }
    }
}

impl Drop for WatchService {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn pump_loop(
    root: String,
    config: WatchConfig,
    raw_rx: mpsc::Receiver<notify::Result<notify::Event>>,
    tx: UnboundedSender<WatchMessage>,
    running: Arc<RwLock<bool>>,
) {
    let mut debouncer = Debouncer::new(Duration::from_millis(config.debounce_ms));
    loop {
        if !*running.read() {
            break;
        }
        match raw_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(Ok(event)) => {
                for change in convert(&event) {
                    let relative = change
                        .path
                        .strip_prefix(&root)
                        .map(|r| r.trim_start_matches('/'))
                        .unwrap_or(&change.path);
                    if config.ignores(relative) {
                        continue;
                    }
                    if !debouncer.accept(&change) {
                        continue;
                    }
                    if tx.unbounded_send(WatchMessage::Event(change)).is_err() {
                        debug!(root = %root, "watch stream closed, stopping pump");
                        return;
                    }
                }
            }
            Ok(Err(err)) => {
                warn!(root = %root, error = %err, "watch transport error");
                if tx
                    .unbounded_send(WatchMessage::Error(err.to_string()))
                    .is_err()
                {
                    return;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!(root = %root, "watch pump stopped");
}

/// Convert one raw notify event into change events, probing the disk where
/// the event kind does not say whether the path is a directory.
fn convert(event: &notify::Event) -> Vec<ChangeEvent> {
    convert_with(event, &|p| std::fs::metadata(p).ok().map(|m| m.is_dir()))
}

/// Conversion with an explicit directory probe, so tests can run without a
/// real filesystem.
pub(crate) fn convert_with(
    event: &notify::Event,
    is_dir: &dyn Fn(&Path) -> Option<bool>,
) -> Vec<ChangeEvent> {
    let added = |p: &std::path::PathBuf| {
        let kind = match is_dir(p) {
            Some(true) => ChangeKind::AddDir,
            _ => ChangeKind::Add,
        };
        ChangeEvent::new(kind, path::normalize(p))
    };

    match event.kind {
        EventKind::Create(create) => match event.paths.first() {
            Some(p) => {
                let kind = match create {
                    CreateKind::Folder => ChangeKind::AddDir,
                    CreateKind::File => ChangeKind::Add,
                    _ => match is_dir(p) {
                        Some(true) => ChangeKind::AddDir,
                        _ => ChangeKind::Add,
                    },
                };
                vec![ChangeEvent::new(kind, path::normalize(p))]
            }
            None => Vec::new(),
        },
        EventKind::Remove(remove) => match event.paths.first() {
            Some(p) => {
                let kind = match remove {
                    RemoveKind::Folder => ChangeKind::UnlinkDir,
                    _ => ChangeKind::Unlink,
                };
                vec![ChangeEvent::new(kind, path::normalize(p))]
            }
            None => Vec::new(),
        },
        EventKind::Modify(ModifyKind::Name(_)) => match event.paths.as_slice() {
            [from, to, ..] => vec![
                ChangeEvent::new(ChangeKind::Unlink, path::normalize(from)),
                added(to),
            ],
            [only] => {
                // Single-sided rename: the path either survived under this
                // name or vanished from it.
                if is_dir(only).is_some() {
                    vec![added(only)]
                } else {
                    vec![ChangeEvent::new(ChangeKind::Unlink, path::normalize(only))]
                }
            }
            [] => Vec::new(),
        },
        EventKind::Modify(_) => event
            .paths
            .first()
            .map(|p| vec![ChangeEvent::new(ChangeKind::Change, path::normalize(p))])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
