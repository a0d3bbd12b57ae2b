//! Output formatting and styling module.
//!
//! Centralizes all console output: colored status lines, the scan spinner and
//! the end-of-run summaries.

use crate::batch::BatchOutcome;
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Prints user-facing messages with consistent styling.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗, on stderr)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// OutputFormatter::success("Moved: a.jpg -> Images/");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn separator() {
        println!("{}", "-".repeat(50));
    }

    /// Prints a simulation notice.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a spinner shown while the target folder is enumerated.
    ///
    /// Drawn on stderr and hidden automatically when stderr is not a terminal.
    pub fn create_spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Prints the statistics of a finished run.
    pub fn batch_summary(outcome: &BatchOutcome, dry_run: bool) {
        let stats = &outcome.stats;
        Self::separator();
        Self::header("SUMMARY");

        let rows = [
            ("Total entries", stats.total_files),
            ("Moved files", stats.moved_files),
            ("Skipped files", stats.skipped_files),
            ("Created folders", stats.created_folders),
            ("Errors", stats.errors),
        ];
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        for (label, count) in rows {
            let count = if label == "Errors" && count > 0 {
                count.to_string().red().bold()
            } else {
                count.to_string().green()
            };
            println!("{:<width$} | {}", label, count, width = width);
        }

        if dry_run {
            println!();
            Self::dry_run_notice(&format!(
                "{} file(s) would be moved. Nothing was changed; run again with --run to apply.",
                outcome.simulated_moves
            ));
        }
    }

    /// Prints the outcome of an undo.
    pub fn undo_summary(report: &UndoReport) {
        Self::header("UNDO SUMMARY");
        println!("  Restored: {}", report.restored_files.to_string().green());

        if !report.skipped_files.is_empty() {
            println!("  Skipped: {}", report.skipped_files.len().to_string().yellow());
            for (path, reason) in &report.skipped_files {
                println!("    - {}: {}", path.display(), reason);
            }
        }

        if !report.failed_restores.is_empty() {
            eprintln!("  Failed: {}", report.failed_restores.len().to_string().red());
            for (path, reason) in &report.failed_restores {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }
    }
}
