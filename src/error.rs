//! Errors raised while organizing files and managing the history log.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during organization, history and undo operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The target folder does not exist or is not a directory.
    #[error("Target folder does not exist: {}", path.display())]
    TargetMissing { path: PathBuf },

    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move a file.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the history log.
    #[error("Failed to write history log {}: {source}", path.display())]
    HistoryWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read the history log.
    #[error("Failed to read history log {}: {source}", path.display())]
    HistoryReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The history log is not a valid sequence of batch records.
    #[error("Invalid history log {}: {reason}", path.display())]
    InvalidHistoryFormat { path: PathBuf, reason: String },
}

/// Result type for organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;
