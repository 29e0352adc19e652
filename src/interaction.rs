//! User interaction seam.
//!
//! Destructive or ambiguous operations pause for a decision: delete
//! confirmation, the three-way move conflict, and the dirty-close save
//! prompt. The workspace core awaits these through [`Interaction`] so the UI
//! shell, the CLI, and the test suite can each supply their own frontend.

use crate::workspace::PendingConflict;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Answer to the dirty-close save prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveChoice {
    Save,
    DontSave,
    Cancel,
}

/// Answer to a move name collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    KeepBoth,
    Replace,
    Cancel,
}

/// Decision prompts awaited by workspace operations.
#[async_trait]
pub trait Interaction: Send + Sync {
    /// Confirm a delete. `false` aborts the operation without error.
    async fn confirm_delete(&self, path: &str) -> bool;

    /// Resolve a move name collision.
    async fn resolve_conflict(&self, conflict: &PendingConflict) -> ConflictChoice;

    /// Ask whether to save a dirty tab before closing it.
    async fn prompt_save(&self, tab_name: &str) -> SaveChoice;

    /// Pick a destination for a pathless save. `None` cancels the save.
    async fn pick_save_path(&self, suggested_name: &str) -> Option<String>;
}

/// Scripted interaction with queued answers.
///
/// Used by the test suite and by headless drivers. Queues drain in order;
/// an empty queue falls back to the configured defaults (decline delete,
/// cancel conflicts and saves), so an unscripted prompt never commits a
/// destructive choice.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    confirmations: Mutex<VecDeque<bool>>,
    conflicts: Mutex<VecDeque<ConflictChoice>>,
    save_choices: Mutex<VecDeque<SaveChoice>>,
    save_paths: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_confirmation(&self, answer: bool) -> &Self {
        self.confirmations.lock().push_back(answer);
        self
    }

    pub fn push_conflict(&self, choice: ConflictChoice) -> &Self {
        self.conflicts.lock().push_back(choice);
        self
    }

    pub fn push_save_choice(&self, choice: SaveChoice) -> &Self {
        self.save_choices.lock().push_back(choice);
        self
    }

    pub fn push_save_path(&self, path: Option<&str>) -> &Self {
        self.save_paths.lock().push_back(path.map(str::to_string));
        self
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn confirm_delete(&self, _path: &str) -> bool {
        self.confirmations.lock().pop_front().unwrap_or(false)
    }

    async fn resolve_conflict(&self, _conflict: &PendingConflict) -> ConflictChoice {
        self.conflicts
            .lock()
            .pop_front()
            .unwrap_or(ConflictChoice::Cancel)
    }

    async fn prompt_save(&self, _tab_name: &str) -> SaveChoice {
        self.save_choices
            .lock()
            .pop_front()
            .unwrap_or(SaveChoice::Cancel)
    }

    async fn pick_save_path(&self, _suggested_name: &str) -> Option<String> {
        self.save_paths.lock().pop_front().flatten()
    }
}
