//! Vellum CLI.
//!
//! Drives the workspace core from a terminal: inspect a folder as the editor
//! would see it, run the watch loop, and perform one-shot tree mutations with
//! interactive prompts where an operation needs a decision.

use crate::config::WorkspaceConfig;
use crate::fs::local::LocalFileSystem;
use crate::interaction::{ConflictChoice, Interaction, SaveChoice};
use crate::logging::init_logging;
use crate::notifications::{Notification, NotificationLevel, Notifier};
use crate::tree::path;
use crate::tree::sort::SortKey;
use crate::types::NodeId;
use crate::workspace::watch::WatchService;
use crate::workspace::{PendingConflict, Workspace};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use dialoguer::{Confirm, Input, Select};
use futures::StreamExt;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Vellum - workspace engine for a desktop writing application
#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "File tree synchronization and workspace tooling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace folder
    #[arg(long, default_value = ".")]
    pub folder: PathBuf,

    /// Configuration file path (overrides vellum.toml discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the discovered file tree
    Tree {
        /// Sort mode (none, name-asc, name-desc, type-asc, type-desc,
        /// created-asc, created-desc, modified-asc, modified-desc)
        #[arg(long, default_value = "none")]
        sort: String,
    },
    /// Summarize the folder on disk
    Status,
    /// Watch the folder and reconcile changes until interrupted
    Watch,
    /// Create a file or folder
    New {
        /// Parent folder, relative to the workspace root
        parent: String,
        /// Entry name; synthesized when omitted
        #[arg(long)]
        name: Option<String>,
        /// Create a folder instead of a file
        #[arg(long)]
        dir: bool,
    },
    /// Delete a file or folder (asks for confirmation)
    Rm { target: String },
    /// Move an entry into another folder
    Mv { source: String, dest: String },
    /// Rename an entry
    Rename { target: String, new_name: String },
    /// Write a default vellum.toml into the folder
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

/// Interactive prompts through dialoguer.
pub struct CliInteraction;

#[async_trait]
impl Interaction for CliInteraction {
    async fn confirm_delete(&self, target: &str) -> bool {
        let prompt = format!("Delete {}?", target);
        tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false)
    }

    async fn resolve_conflict(&self, conflict: &PendingConflict) -> ConflictChoice {
        let what = if conflict.is_directory { "folder" } else { "file" };
        let prompt = format!(
            "A {} named {} already exists in the target folder",
            what, conflict.name
        );
        tokio::task::spawn_blocking(move || {
            match Select::new()
                .with_prompt(prompt)
                .items(&["Keep both", "Replace", "Cancel"])
                .default(0)
                .interact()
            {
                Ok(0) => ConflictChoice::KeepBoth,
                Ok(1) => ConflictChoice::Replace,
                _ => ConflictChoice::Cancel,
            }
        })
        .await
        .unwrap_or(ConflictChoice::Cancel)
    }

    async fn prompt_save(&self, tab_name: &str) -> SaveChoice {
        let prompt = format!("Save changes to {}?", tab_name);
        tokio::task::spawn_blocking(move || {
            match Select::new()
                .with_prompt(prompt)
                .items(&["Save", "Don't save", "Cancel"])
                .default(0)
                .interact()
            {
                Ok(0) => SaveChoice::Save,
                Ok(1) => SaveChoice::DontSave,
                _ => SaveChoice::Cancel,
            }
        })
        .await
        .unwrap_or(SaveChoice::Cancel)
    }

    async fn pick_save_path(&self, suggested_name: &str) -> Option<String> {
        let default = suggested_name.to_string();
        tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt("Save as")
                .default(default)
                .interact_text()
                .ok()
                .filter(|s| !s.trim().is_empty())
        })
        .await
        .unwrap_or(None)
    }
}

/// Colored terminal notifications.
pub struct CliNotifier;

impl Notifier for CliNotifier {
    fn notify(&self, n: Notification) {
        let tag = match n.level {
            NotificationLevel::Success => "ok".green().to_string(),
            NotificationLevel::Info => "info".blue().to_string(),
            NotificationLevel::Warning => "warn".yellow().to_string(),
            NotificationLevel::Error => "error".red().to_string(),
            NotificationLevel::Critical => "critical".red().bold().to_string(),
        };
        eprintln!("[{}] {}: {}", tag, n.context, n.message);
    }
}

fn load_config(cli: &Cli, root: &std::path::Path) -> anyhow::Result<WorkspaceConfig> {
    let mut config = match &cli.config {
        Some(file) => WorkspaceConfig::load_from(Some(file))?,
        None => WorkspaceConfig::load(root)?,
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.logging.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }
    Ok(config)
}

fn workspace_with(config: WorkspaceConfig) -> Workspace {
    Workspace::new(
        Arc::new(LocalFileSystem::new()),
        Arc::new(CliInteraction),
        Arc::new(CliNotifier),
        config,
    )
}

/// Resolve a user-supplied path against the workspace root.
fn resolve(root: &str, input: &str) -> String {
    let normalized = path::normalize_str(input);
    if normalized.starts_with('/') || normalized.contains(':') {
        normalized
    } else if normalized == "." {
        root.to_string()
    } else {
        path::join(root, &normalized)
    }
}

fn node_or_fail(ws: &Workspace, target: &str) -> anyhow::Result<NodeId> {
    ws.find_by_path(target)
        .ok_or_else(|| anyhow::anyhow!("no entry at {}", target))
}

fn print_tree(ws: &Workspace) {
    let tree = match ws.tree() {
        Some(tree) => tree,
        None => return,
    };
    let mut stack = vec![(tree.root(), 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let node = match tree.node(id) {
            Some(node) => node,
            None => continue,
        };
        let indent = "  ".repeat(depth);
        if node.is_folder() {
            println!("{}{}/", indent, node.label.blue().bold());
            if let Some(children) = &node.children {
                for child in children.iter().rev() {
                    stack.push((*child, depth + 1));
                }
            }
        } else {
            println!("{}{}", indent, node.label);
        }
    }
}

fn print_status(root: &std::path::Path) {
    let mut files: u64 = 0;
    let mut folders: u64 = 0;
    let mut bytes: u64 = 0;
    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
    {
        if entry.file_type().is_dir() {
            folders += 1;
        } else {
            files += 1;
            bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }

    let mut table = Table::new();
    table.set_header(vec!["folder", "files", "folders", "bytes"]);
    table.add_row(vec![
        root.display().to_string(),
        files.to_string(),
        folders.to_string(),
        bytes.to_string(),
    ]);
    println!("{table}");
}

async fn run_watch(ws: &mut Workspace, root: &str) -> anyhow::Result<()> {
    let mut service = WatchService::new(ws.config().watch.clone());
    let mut stream = service.start(root)?;
    println!("watching {} (ctrl-c to stop)", root);
    loop {
        tokio::select! {
            message = stream.next() => {
                match message {
                    Some(message) => ws.apply_message(message).await,
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    // Stop the watcher before the tree goes away so no event can race the
    // teardown.
    service.stop(root);
    ws.close_folder().await?;
    Ok(())
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let canonical = dunce::canonicalize(&cli.folder)
        .map_err(|e| anyhow::anyhow!("cannot resolve folder {:?}: {}", cli.folder, e))?;
    let root = path::normalize(&canonical);
    let config = load_config(&cli, &canonical)?;
    init_logging(&config.logging)?;
    info!(folder = %root, "vellum starting");

    let mut ws = workspace_with(config);

    match cli.command {
        Commands::Status => {
            print_status(&canonical);
            return Ok(());
        }
        Commands::Tree { ref sort } => {
            let key: SortKey = sort
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            ws.open_folder(&root).await?;
            ws.sort_tree(key);
            print_tree(&ws);
        }
        Commands::Watch => {
            ws.open_folder(&root).await?;
            run_watch(&mut ws, &root).await?;
        }
        Commands::New {
            ref parent,
            ref name,
            dir,
        } => {
            ws.open_folder(&root).await?;
            let parent_path = resolve(&root, parent);
            let parent_id = node_or_fail(&ws, &parent_path)?;
            let created = if dir {
                ws.create_folder(parent_id, name.as_deref()).await?
            } else {
                ws.create_file(parent_id, name.as_deref()).await?
            };
            if let Some(node) = ws.tree().and_then(|t| t.node(created)) {
                println!("{}", node.path);
            }
        }
        Commands::Rm { ref target } => {
            ws.open_folder(&root).await?;
            let target_path = resolve(&root, target);
            let id = node_or_fail(&ws, &target_path)?;
            if !ws.delete_node(id).await? {
                println!("cancelled");
            }
        }
        Commands::Mv {
            ref source,
            ref dest,
        } => {
            ws.open_folder(&root).await?;
            let source_id = node_or_fail(&ws, &resolve(&root, source))?;
            let dest_id = node_or_fail(&ws, &resolve(&root, dest))?;
            let outcome = ws.move_node(source_id, dest_id).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Rename {
            ref target,
            ref new_name,
        } => {
            ws.open_folder(&root).await?;
            let id = node_or_fail(&ws, &resolve(&root, target))?;
            ws.rename_node(id, new_name).await?;
        }
        Commands::Init { force } => {
            let file = canonical.join(crate::config::CONFIG_FILE_NAME);
            if file.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", file.display());
            }
            WorkspaceConfig::default().save(&file)?;
            println!("{}", file.display());
        }
    }
    Ok(())
}
