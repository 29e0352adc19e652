//! Directory watching: event model and notify-backed runtime.

mod events;
mod runtime;

pub use events::{ChangeEvent, ChangeKind, Debouncer, WatchConfig};
pub use runtime::{WatchMessage, WatchService};
