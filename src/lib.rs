//! dirsort - sort a folder's files into per-category subfolders
//!
//! This library classifies files by extension, moves them into category
//! folders under a chosen conflict policy, keeps a history log of every batch
//! and can revert the most recent one.

pub mod batch;
pub mod cli;
pub mod config;
pub mod conflict;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod history;
pub mod output;
pub mod undo;

pub use batch::{BatchOutcome, Organizer};
pub use config::{CompiledFilters, ConfigError, OrganizerConfig};
pub use conflict::ConflictPolicy;
pub use error::{OrganizeError, OrganizeResult};
pub use file_category::{CategoryTable, FALLBACK_CATEGORY};
pub use file_organizer::FileMover;
pub use history::{BatchRecord, BatchStats, HistoryLog, OperationRecord};
pub use undo::{UndoManager, UndoOutcome, UndoReport};

pub use cli::{Cli, ExitStatus, OrganizeCommand, run};
