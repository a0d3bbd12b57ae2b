/// Persistent batch history used for undo.
///
/// The log is a JSON array of [`BatchRecord`]s, one per real organization run.
/// Each run reads the whole array, appends its record and rewrites the file.
/// A log holding a single object (older format) is read as a one-element array.
use crate::error::{OrganizeError, OrganizeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Kind of a recorded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Move,
}

/// A single executed move, with enough information to reverse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// RFC 3339 local time of the move.
    pub timestamp: String,
    pub operation: OperationKind,
    /// Absolute path the file was moved from.
    pub source: PathBuf,
    /// Absolute path the file was moved to.
    pub destination: PathBuf,
    /// File name before the move (the destination may have been renamed).
    pub original_name: String,
}

impl OperationRecord {
    /// Records a move from `source` to `destination` happening now.
    pub fn moved(source: &Path, destination: &Path) -> Self {
        Self {
            timestamp: now_rfc3339(),
            operation: OperationKind::Move,
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            original_name: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Counters accumulated over one organization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Raw number of enumerated entries, directories included.
    pub total_files: usize,
    pub moved_files: usize,
    pub skipped_files: usize,
    pub created_folders: usize,
    pub errors: usize,
}

/// Everything one organization run did, as persisted in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub timestamp: String,
    /// Identifier of the configuration the run used.
    #[serde(default)]
    pub config: String,
    pub target_folder: PathBuf,
    /// Operations in execution order.
    #[serde(default)]
    pub operations: Vec<OperationRecord>,
    #[serde(default)]
    pub stats: BatchStats,
    /// Set once the batch has been reverted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub undone: bool,
}

impl BatchRecord {
    /// Creates a record stamped with the current time.
    pub fn new(
        config: impl Into<String>,
        target_folder: &Path,
        operations: Vec<OperationRecord>,
        stats: BatchStats,
    ) -> Self {
        Self {
            timestamp: now_rfc3339(),
            config: config.into(),
            target_folder: target_folder.to_path_buf(),
            operations,
            stats,
            undone: false,
        }
    }
}

/// Handle on the history log file.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the log is written through before being renamed into place.
    pub fn temp_path(&self) -> PathBuf {
        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        PathBuf::from(tmp_path)
    }

    /// Reads every batch in the log, oldest first.
    ///
    /// A missing or blank file yields an empty history.
    pub fn load(&self) -> OrganizeResult<Vec<BatchRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content =
            fs::read_to_string(&self.path).map_err(|e| OrganizeError::HistoryReadFailed {
                path: self.path.clone(),
                source: e,
            })?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(&content).map_err(|e| self.invalid(e))?;
        let value = match value {
            Value::Array(batches) => Value::Array(batches),
            Value::Object(batch) => Value::Array(vec![Value::Object(batch)]),
            other => {
                return Err(OrganizeError::InvalidHistoryFormat {
                    path: self.path.clone(),
                    reason: format!("expected an array of batches, found {}", other),
                });
            }
        };

        serde_json::from_value(value).map_err(|e| self.invalid(e))
    }

    /// Returns the most recently appended batch, if any.
    pub fn last_batch(&self) -> OrganizeResult<Option<BatchRecord>> {
        Ok(self.load()?.pop())
    }

    /// Appends `batch` to the log and returns the new number of batches.
    pub fn append(&self, batch: BatchRecord) -> OrganizeResult<usize> {
        let mut batches = self.load()?;
        batches.push(batch);
        self.save(&batches)?;
        Ok(batches.len())
    }

    /// Flags the most recent batch as reverted. No-op on an empty log.
    pub fn mark_last_undone(&self) -> OrganizeResult<()> {
        let mut batches = self.load()?;
        if let Some(last) = batches.last_mut() {
            last.undone = true;
            self.save(&batches)?;
        }
        Ok(())
    }

    /// Rewrites the whole log through a temporary sibling file.
    fn save(&self, batches: &[BatchRecord]) -> OrganizeResult<()> {
        let json = serde_json::to_string_pretty(batches).map_err(|e| {
            OrganizeError::HistoryWriteFailed {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            }
        })?;

        let tmp_path = self.temp_path();

        let write_failed = |e| OrganizeError::HistoryWriteFailed {
            path: self.path.clone(),
            source: e,
        };
        fs::write(&tmp_path, json).map_err(write_failed)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_failed(e));
        }

        log::debug!("history log {} holds {} batches", self.path.display(), batches.len());
        Ok(())
    }

    fn invalid(&self, e: serde_json::Error) -> OrganizeError {
        OrganizeError::InvalidHistoryFormat {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

fn now_rfc3339() -> String {
    chrono::Local::now().to_rfc3339()
}
