//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading with fallback to defaults
//! - Applying command-line overrides on top of the configuration
//! - Dispatching to organization or undo, and mapping outcomes to exit codes

use crate::batch::Organizer;
use crate::config::{ConfigError, DEFAULTS_ID, LoadedConfig, OrganizerConfig};
use crate::error::OrganizeError;
use crate::history::HistoryLog;
use crate::output::OutputFormatter;
use crate::undo::{UndoManager, UndoOutcome};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Sort the files of a folder into per-category subfolders.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Configuration file (TOML, or JSON if it ends in .json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only report what would be moved (overrides the configuration)
    #[arg(short, long)]
    pub dry_run: bool,

    /// Actually move files (overrides --dry-run and the configuration)
    #[arg(short = 'R', long)]
    pub run: bool,

    /// Revert the most recent batch
    #[arg(short, long)]
    pub undo: bool,

    /// Folder to organize (overrides the configuration)
    #[arg(short, long, value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Also organize files in subfolders
    #[arg(short, long)]
    pub recursive: bool,

    /// Only organize files directly inside the target folder
    #[arg(long)]
    pub no_recursive: bool,

    /// Print debug diagnostics
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies command-line overrides to `config`.
    ///
    /// `--run` beats `--dry-run`, which beats the configured `dry_run`;
    /// `--recursive` beats `--no-recursive`, which beats the configured value.
    pub fn apply_overrides(&self, config: &mut OrganizerConfig) {
        if self.run {
            config.dry_run = false;
        } else if self.dry_run {
            config.dry_run = true;
        }

        if let Some(target) = &self.target {
            config.target_folder = target.clone();
        }

        if self.recursive {
            config.recursive = true;
        } else if self.no_recursive {
            config.recursive = false;
        }
    }

    fn command(&self) -> OrganizeCommand {
        if self.undo {
            OrganizeCommand::Undo
        } else {
            OrganizeCommand::Organize
        }
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Sort the target folder.
    Organize,
    /// Revert the most recent batch.
    Undo,
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// Unexpected failure, such as an unreadable history log.
    Failure,
    TargetMissing,
    /// The configuration could not be used; built-in defaults were applied.
    ConfigUnreadable,
    NothingToUndo,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::TargetMissing => 2,
            ExitStatus::ConfigUnreadable => 3,
            ExitStatus::NothingToUndo => 4,
        }
    }
}

/// Runs the CLI application for parsed arguments.
///
/// An unusable configuration file is reported and replaced by defaults; the
/// run then proceeds and, if nothing else went wrong, exits with
/// [`ExitStatus::ConfigUnreadable`].
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{Cli, run};
///
/// let cli = Cli::parse_from(["dirsort", "--target", "/data/inbox", "--dry-run"]);
/// let status = run(&cli);
/// std::process::exit(status.code().into());
/// ```
pub fn run(cli: &Cli) -> ExitStatus {
    let (loaded, config_failed) = load_config(cli.config.as_deref());
    let mut config = loaded.config;
    cli.apply_overrides(&mut config);

    let status = run_with_config(cli.command(), &config, &loaded.id);
    if status == ExitStatus::Success && config_failed {
        ExitStatus::ConfigUnreadable
    } else {
        status
    }
}

/// Runs `command` against an already-resolved configuration.
///
/// # Arguments
///
/// * `command` - The command to execute (Organize or Undo)
/// * `config` - The effective configuration
/// * `config_id` - Identifier recorded in the batch history
pub fn run_with_config(
    command: OrganizeCommand,
    config: &OrganizerConfig,
    config_id: &str,
) -> ExitStatus {
    match command {
        OrganizeCommand::Organize => organize(config, config_id),
        OrganizeCommand::Undo => undo(config),
    }
}

/// Loads the configuration, falling back to defaults. The flag is set when a
/// configuration file existed but could not be used.
fn load_config(config_path: Option<&Path>) -> (LoadedConfig, bool) {
    match OrganizerConfig::load(config_path) {
        Ok(loaded) => (loaded, false),
        Err(ConfigError::ConfigNotFound(path)) => {
            OutputFormatter::info(&format!(
                "Configuration file {} not found, using defaults",
                path.display()
            ));
            (defaults_for(&path), false)
        }
        Err(e) => {
            OutputFormatter::warning(&format!("{}; using defaults", e));
            let fallback = config_path
                .map(defaults_for)
                .unwrap_or_else(|| LoadedConfig {
                    config: OrganizerConfig::default(),
                    id: DEFAULTS_ID.to_string(),
                });
            (fallback, true)
        }
    }
}

/// Default configuration, recorded under the name of the file that was asked for.
fn defaults_for(path: &Path) -> LoadedConfig {
    LoadedConfig {
        config: OrganizerConfig::default(),
        id: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULTS_ID.to_string()),
    }
}

fn organize(config: &OrganizerConfig, config_id: &str) -> ExitStatus {
    let organizer = match Organizer::new(config, config_id) {
        Ok(organizer) => organizer,
        Err(e) => {
            OutputFormatter::error(&format!("Error compiling filters: {}", e));
            return ExitStatus::ConfigUnreadable;
        }
    };

    match organizer.run() {
        Ok(outcome) => {
            if outcome.history_path.is_some() {
                OutputFormatter::plain("Use 'dirsort --undo' to revert this batch.");
            }
            if outcome.stats.errors > 0 {
                OutputFormatter::warning("Some files could not be organized. Please review errors above.");
            }
            ExitStatus::Success
        }
        Err(e @ OrganizeError::TargetMissing { .. }) => {
            OutputFormatter::error(&e.to_string());
            ExitStatus::TargetMissing
        }
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitStatus::Failure
        }
    }
}

fn undo(config: &OrganizerConfig) -> ExitStatus {
    let log = HistoryLog::new(&config.log_file);
    OutputFormatter::info(&format!("Reading history from {}", log.path().display()));

    match UndoManager::undo(&log) {
        Ok(UndoOutcome::NothingToUndo) => {
            OutputFormatter::info("Nothing to undo.");
            ExitStatus::NothingToUndo
        }
        Ok(UndoOutcome::Reverted(report)) => {
            OutputFormatter::undo_summary(&report);
            OutputFormatter::success(&format!(
                "Reverted {} file move(s)",
                report.restored_files
            ));
            ExitStatus::Success
        }
        Err(e) => {
            OutputFormatter::error(&format!("Undo failed: {}", e));
            ExitStatus::Failure
        }
    }
}
