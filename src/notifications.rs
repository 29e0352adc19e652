//! User-facing notifications.
//!
//! Every user-visible outcome, success or failure, flows through the
//! [`Notifier`] seam as a categorized message with an operation context
//! string. The library default logs through `tracing`; the CLI installs a
//! colored sink; tests install a collecting sink.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
    Critical,
}

/// One categorized, user-visible message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Operation context, e.g. "file operation" or "file tree update".
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: String, context: &str) -> Self {
        Self {
            level,
            message,
            context: context.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Sink for user-visible notifications.
///
/// The helper methods are plain non-generic defaults so the trait stays
/// object safe behind `Arc<dyn Notifier>`.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: String, context: &str) {
        self.notify(Notification::new(NotificationLevel::Success, message, context));
    }

    fn info(&self, message: String, context: &str) {
        self.notify(Notification::new(NotificationLevel::Info, message, context));
    }

    fn warning(&self, message: String, context: &str) {
        self.notify(Notification::new(NotificationLevel::Warning, message, context));
    }

    fn error(&self, message: String, context: &str) {
        self.notify(Notification::new(NotificationLevel::Error, message, context));
    }

    fn critical(&self, message: String, context: &str) {
        self.notify(Notification::new(NotificationLevel::Critical, message, context));
    }
}

/// Default sink: structured log lines through `tracing`.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.level {
            NotificationLevel::Success | NotificationLevel::Info => {
                info!(context = %n.context, "{}", n.message)
            }
            NotificationLevel::Warning => warn!(context = %n.context, "{}", n.message),
            NotificationLevel::Error | NotificationLevel::Critical => {
                error!(context = %n.context, "{}", n.message)
            }
        }
    }
}

/// Collecting sink for tests and headless drivers.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.entries.lock().push(notification);
    }
}
