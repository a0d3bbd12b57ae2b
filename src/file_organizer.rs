/// Single-file relocation.
///
/// [`FileMover`] moves one file to an already-resolved destination, or only
/// reports the move in dry-run mode, and records successful real moves for undo.
use crate::error::{OrganizeError, OrganizeResult};
use crate::history::OperationRecord;
use crate::output::OutputFormatter;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// What [`FileMover::execute`] did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The file now lives at the destination.
    Moved,
    /// Dry run: the move was only reported.
    Simulated,
}

/// Moves files into place for one batch.
#[derive(Debug, Clone, Copy)]
pub struct FileMover {
    dry_run: bool,
    record_history: bool,
}

impl FileMover {
    /// Creates a mover.
    ///
    /// * `dry_run` - report moves without touching the filesystem
    /// * `record_history` - append an [`OperationRecord`] for every real move
    pub fn new(dry_run: bool, record_history: bool) -> Self {
        Self {
            dry_run,
            record_history,
        }
    }

    /// Moves `source` to `destination`, appending a record to `operations` on
    /// success when history is enabled.
    ///
    /// The destination's parent folder must already exist. An existing file at
    /// `destination` is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::FileMoveFailure`] if the filesystem refuses the
    /// move. Nothing is recorded in that case.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::file_organizer::FileMover;
    /// use std::path::Path;
    ///
    /// let mut operations = Vec::new();
    /// let mover = FileMover::new(false, true);
    /// mover
    ///     .execute(
    ///         Path::new("/data/inbox/a.jpg"),
    ///         Path::new("/data/inbox/Images/a.jpg"),
    ///         &mut operations,
    ///     )
    ///     .expect("move failed");
    /// assert_eq!(operations.len(), 1);
    /// ```
    pub fn execute(
        &self,
        source: &Path,
        destination: &Path,
        operations: &mut Vec<OperationRecord>,
    ) -> OrganizeResult<MoveOutcome> {
        if self.dry_run {
            OutputFormatter::dry_run_notice(&format!(
                "Move: {} -> {}",
                source.display(),
                destination.display()
            ));
            return Ok(MoveOutcome::Simulated);
        }

        move_file(source, destination).map_err(|e| OrganizeError::FileMoveFailure {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        })?;

        OutputFormatter::success(&format!(
            "Moved: {} -> {}",
            display_name(source),
            destination
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| format!("{}/{}", n.to_string_lossy(), display_name(destination)))
                .unwrap_or_else(|| destination.display().to_string())
        ));

        if self.record_history {
            operations.push(OperationRecord::moved(source, destination));
        }

        Ok(MoveOutcome::Moved)
    }
}

/// Renames `source` to `destination`, copying and deleting the source when the
/// two live on different filesystems.
///
/// A same-device rename replaces an existing destination atomically. The
/// cross-device fallback truncates and rewrites an existing destination before
/// removing the source, so it is not atomic.
pub fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            log::debug!(
                "{} and {} are on different devices, copying",
                source.display(),
                destination.display()
            );
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
        Err(e) => Err(e),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
