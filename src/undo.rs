/// Undo functionality for reverting the last organization batch.
///
/// The most recent batch in the history log is reversed operation by
/// operation, newest first. Stale entries are skipped, never fatal.
use crate::error::OrganizeResult;
use crate::file_organizer::move_file;
use crate::history::{BatchRecord, HistoryLog, OperationKind, OperationRecord};
use crate::output::OutputFormatter;
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Timestamp of the batch that was reverted.
    pub batch_timestamp: String,
    /// Target folder of the batch that was reverted.
    pub target_folder: PathBuf,
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files that could not be moved back, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files no longer at their recorded destination.
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Files found at an original location and renamed out of the way.
    pub backups: Vec<PathBuf>,
}

impl UndoReport {
    /// Returns the total number of operations processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if no operation hit a hard failure.
    pub fn is_complete(&self) -> bool {
        self.failed_restores.is_empty()
    }
}

/// What an undo request found.
#[derive(Debug)]
pub enum UndoOutcome {
    /// The log is missing or empty, or its last batch has nothing left to revert.
    NothingToUndo,
    /// The last batch was processed.
    Reverted(UndoReport),
}

/// Manages undo operations for file organization.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent batch recorded in `log`.
    ///
    /// Operations are reversed newest first. An operation whose file has gone
    /// from its recorded destination is skipped; a failed move back is recorded
    /// as a failure. Neither stops the remaining operations.
    ///
    /// When no operation failed, the batch is marked as undone so a second call
    /// returns [`UndoOutcome::NothingToUndo`]. Only the last batch is ever
    /// considered; older batches are not reachable through undo.
    ///
    /// # Edge Cases Handled
    ///
    /// * **File not found**: Skipped with a note that the file couldn't be found
    /// * **File name conflict**: The occupying file is backed up with a timestamp suffix
    /// * **Missing original folder**: Recreated before the file is moved back
    /// * **Permission denied**: Recorded as a failure with the error reason
    ///
    /// # Errors
    ///
    /// Returns an error only if the log exists but cannot be read or parsed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::history::HistoryLog;
    /// use dirsort::undo::{UndoManager, UndoOutcome};
    ///
    /// match UndoManager::undo(&HistoryLog::new("organizer_log.json")) {
    ///     Ok(UndoOutcome::Reverted(report)) => println!("Restored {} files", report.restored_files),
    ///     Ok(UndoOutcome::NothingToUndo) => println!("Nothing to undo"),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(log: &HistoryLog) -> OrganizeResult<UndoOutcome> {
        let Some(batch) = log.last_batch()? else {
            return Ok(UndoOutcome::NothingToUndo);
        };
        if batch.undone || batch.operations.is_empty() {
            return Ok(UndoOutcome::NothingToUndo);
        }

        OutputFormatter::info(&format!(
            "Undoing batch from {} in {}",
            batch.timestamp,
            batch.target_folder.display()
        ));

        let report = Self::revert(&batch);

        if report.is_complete() {
            if let Err(e) = log.mark_last_undone() {
                OutputFormatter::warning(&format!("Could not update history log: {}", e));
            }
        } else {
            OutputFormatter::warning(
                "Some files could not be restored; the batch stays in history so undo can be retried.",
            );
        }

        Ok(UndoOutcome::Reverted(report))
    }

    fn revert(batch: &BatchRecord) -> UndoReport {
        let mut report = UndoReport {
            batch_timestamp: batch.timestamp.clone(),
            target_folder: batch.target_folder.clone(),
            ..Default::default()
        };

        for operation in batch.operations.iter().rev() {
            match operation.operation {
                OperationKind::Move => Self::restore_move(operation, &mut report),
            }
        }

        report
    }

    /// Moves one file from its recorded destination back to its source.
    fn restore_move(operation: &OperationRecord, report: &mut UndoReport) {
        let current = &operation.destination;
        let original = &operation.source;

        if !current.exists() {
            OutputFormatter::warning(&format!(
                "File not found, cannot undo: {}",
                current.display()
            ));
            report.skipped_files.push((
                current.clone(),
                "File not found at expected location".to_string(),
            ));
            return;
        }

        if let Some(parent) = original.parent()
            && !parent.exists()
            && let Err(e) = fs::create_dir_all(parent)
        {
            OutputFormatter::error(&format!("Cannot recreate {}: {}", parent.display(), e));
            report.failed_restores.push((
                current.clone(),
                format!("Could not recreate original folder: {}", e),
            ));
            return;
        }

        if original.exists() {
            let backup_path = generate_backup_path(original);
            if let Err(e) = fs::rename(original, &backup_path) {
                OutputFormatter::error(&format!(
                    "Cannot back up {}: {}",
                    original.display(),
                    e
                ));
                report.failed_restores.push((
                    original.clone(),
                    format!("Could not backup conflicting file: {}", e),
                ));
                return;
            }
            OutputFormatter::warning(&format!(
                "Backed up existing {} to {}",
                original.display(),
                backup_path.display()
            ));
            report.backups.push(backup_path);
        }

        match move_file(current, original) {
            Ok(()) => {
                OutputFormatter::success(&format!(
                    "Restored: {} -> {}",
                    current.display(),
                    original.display()
                ));
                report.restored_files += 1;
            }
            Err(e) => {
                OutputFormatter::error(&format!(
                    "Failed to restore {}: {}",
                    current.display(),
                    e
                ));
                report
                    .failed_restores
                    .push((current.clone(), format!("Failed to restore file: {}", e)));
            }
        }
    }
}

/// Generates a backup path for a file by appending a timestamp.
///
/// Example: `file.txt` becomes `file.txt.bak.20251109-143052`
fn generate_backup_path(original_path: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let filename = original_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());

    let backup_name = format!("{}.bak.{}", filename, timestamp);

    match original_path.parent() {
        Some(parent) => parent.join(backup_name),
        None => PathBuf::from(backup_name),
    }
}
