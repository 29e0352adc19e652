//! Shared fixtures: an in-memory gateway, scripted prompts, and a
//! collecting notifier wired into one workspace.

use std::sync::Arc;
use vellum::config::WorkspaceConfig;
use vellum::fs::memory::MemoryFileSystem;
use vellum::interaction::ScriptedInteraction;
use vellum::notifications::MemoryNotifier;
use vellum::workspace::Workspace;

pub struct Harness {
    pub gateway: Arc<MemoryFileSystem>,
    pub interaction: Arc<ScriptedInteraction>,
    pub notifier: Arc<MemoryNotifier>,
    pub ws: Workspace,
}

pub fn harness() -> Harness {
    let gateway = Arc::new(MemoryFileSystem::new());
    let interaction = Arc::new(ScriptedInteraction::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let ws = Workspace::new(
        gateway.clone(),
        interaction.clone(),
        notifier.clone(),
        WorkspaceConfig::default(),
    );
    Harness {
        gateway,
        interaction,
        notifier,
        ws,
    }
}

/// Standard fixture:
///
/// ```text
/// /root
///   readme.md
///   docs/
///     a.md
///     b.md
///     nested/
///       deep.md
///   notes/
///     note.md
/// ```
pub async fn open_sample() -> Harness {
    let mut h = harness();
    h.gateway.add_file("/root/readme.md", "# readme\n");
    h.gateway.add_file("/root/docs/a.md", "alpha");
    h.gateway.add_file("/root/docs/b.md", "beta");
    h.gateway.add_file("/root/docs/nested/deep.md", "deep");
    h.gateway.add_file("/root/notes/note.md", "note");
    assert!(h.ws.open_folder("/root").await.unwrap());
    h
}

pub fn assert_invariant(h: &Harness) {
    h.ws.tree()
        .expect("tree should be open")
        .verify_path_invariant()
        .expect("path invariant must hold");
}
