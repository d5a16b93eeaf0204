//! quill - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use quill::config::Settings;
use quill::generator::Generator;
use quill::ignore::PatternSet;
use quill::interactive;
use quill::repo::{ChangeSet, WorkingRepo};

/// Generate AI-powered commit messages from pending git changes.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Generate AI-powered commit messages from pending git changes")]
#[command(version)]
struct Cli {
    /// Path to the git repository (default is the current directory)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Path to the git repository (overrides the positional argument)
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    path_flag: Option<PathBuf>,

    /// Config file (default is the platform config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show the last commit message and exit
    #[arg(short, long)]
    show: bool,

    /// Edit the generated commit message before using it
    #[arg(short, long)]
    edit: bool,

    /// Commit the staged changes with the final message
    #[arg(short, long)]
    commit: bool,

    /// Stage all changes before generating the message
    #[arg(short = 'a', long = "add")]
    add: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let target = cli
        .path_flag
        .clone()
        .or_else(|| cli.path.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let repo = WorkingRepo::open(&target)
        .with_context(|| format!("Failed to open git repository at {}", target.display()))?;

    if cli.show {
        let last = repo
            .last_commit_message()
            .context("Failed to read the last commit message")?;
        interactive::display_message("Last commit message", last.trim_end());
        return Ok(());
    }

    let config_file = match cli.config.clone() {
        Some(path) => path,
        None => Settings::default_config_path().context("Failed to locate configuration")?,
    };

    let settings = Settings::load(&config_file, &target, Some(repo.root()))
        .context("Failed to load configuration")?;
    settings.validate().context("Invalid configuration")?;

    if cli.add {
        repo.stage_all().context("Failed to stage changes")?;
        println!("Staged all changes");
    }

    let changes = repo
        .pending_changes()
        .context("Failed to collect pending changes")?;

    let Some(raw_diff) = changes.diff_text() else {
        println!("No changes to commit");
        return Ok(());
    };
    debug!(source = change_source(&changes), "selected change-set");

    let patterns = PatternSet::discover(&target, Some(repo.root()))
        .context("Failed to load ignore patterns")?;
    let filtered = patterns.filter(raw_diff);

    if filtered.is_empty() {
        println!("chore: no changes after applying ignore patterns");
        return Ok(());
    }

    let generator =
        Generator::new(&settings, &config_file).context("Failed to create generator")?;

    println!("Generating commit message with {}...", settings.provider);
    let message = generator
        .generate(&filtered)
        .await
        .context("Failed to generate commit message")?;

    if cli.edit || cli.commit {
        run_interactive(&message, cli.edit, cli.commit, &repo)
    } else {
        println!("{message}");
        Ok(())
    }
}

fn change_source(changes: &ChangeSet) -> &'static str {
    match changes {
        ChangeSet::Staged(_) => "staged",
        ChangeSet::Unstaged(_) => "unstaged",
        ChangeSet::InitialImport(_) => "initial import",
        ChangeSet::Clean => "clean",
    }
}

/// Editing and commit confirmation for `--edit` / `--commit`.
fn run_interactive(message: &str, edit: bool, commit: bool, repo: &WorkingRepo) -> Result<()> {
    interactive::display_message("Generated commit message", message);

    let mut final_message = message.to_string();
    if edit {
        let mode = interactive::choose_edit_mode().context("Failed to read choice")?;
        final_message =
            interactive::edit_message(message, mode).context("Failed to edit message")?;
    }

    if commit {
        if final_message != message {
            interactive::display_message("Final commit message", &final_message);
        }

        let proceed = interactive::confirm("Commit with this message?", true)
            .context("Failed to read confirmation")?;
        if proceed {
            repo.commit(&final_message).context("Failed to commit")?;
            println!("✓ Committed successfully");
        } else {
            println!("Commit cancelled.");
        }
    } else {
        println!("\nFinal message:\n{final_message}");
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = std::env::var("QUILL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to initialize logging: {err}");
    }
}
