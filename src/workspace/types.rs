//! Shared types for workspace operations.

use crate::tree::NodeKind;
use serde::{Deserialize, Serialize};

/// Outcome of a move operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<MoveAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
}

impl MoveOutcome {
    pub(crate) fn moved(new_path: String) -> Self {
        Self {
            success: true,
            action: None,
            new_path: Some(new_path),
        }
    }

    pub(crate) fn resolved(action: MoveAction, new_path: String) -> Self {
        Self {
            success: true,
            action: Some(action),
            new_path: Some(new_path),
        }
    }

    pub(crate) fn aborted(action: MoveAction) -> Self {
        Self {
            success: false,
            action: Some(action),
            new_path: None,
        }
    }
}

/// How a move resolved, when it did not run straight through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveAction {
    /// Source already sits in the target directory; nothing to do.
    Skip,
    KeepBoth,
    Replace,
    Cancel,
}

/// A name collision detected during a move, pending a user decision.
///
/// Transient: lives only for the duration of one move operation's decision
/// round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConflict {
    pub source_path: String,
    pub target_path: String,
    /// The colliding entry name.
    pub name: String,
    pub is_directory: bool,
}

/// Key for the per-folder untitled-name counters.
///
/// Counters are keyed by parent path and entry kind so unrelated folders
/// never share numbering. They live for the whole session and are not reset
/// when a folder is closed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UntitledKey {
    pub parent_path: String,
    pub kind: NodeKind,
}
