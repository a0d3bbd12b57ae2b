//! Batch orchestration: one full scan-classify-move pass over a folder.
//!
//! A run enumerates the target folder (optionally recursively), and for every
//! file picks its category, makes sure the category folder exists, resolves
//! name conflicts, moves the file and finally appends a [`BatchRecord`] to the
//! history log.

use crate::config::{CompiledFilters, ConfigError, OrganizerConfig};
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_organizer::{FileMover, MoveOutcome};
use crate::history::{BatchRecord, BatchStats, HistoryLog, OperationRecord};
use crate::output::OutputFormatter;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of one organizer run.
#[derive(Debug)]
pub struct BatchOutcome {
    pub stats: BatchStats,
    /// Moves performed, in execution order. Empty when history is disabled.
    pub operations: Vec<OperationRecord>,
    /// Moves that a dry run would have performed.
    pub simulated_moves: usize,
    /// Log the batch was appended to, if it was persisted.
    pub history_path: Option<PathBuf>,
    /// Set when persisting the batch failed. Moves already done are kept.
    pub history_error: Option<OrganizeError>,
}

/// An enumerated entry under the target folder.
struct ScannedEntry {
    path: PathBuf,
    is_dir: bool,
}

/// Drives organizer runs for one configuration.
pub struct Organizer<'a> {
    config: &'a OrganizerConfig,
    config_id: String,
    filters: CompiledFilters,
}

/// Mutable state of a run in progress.
#[derive(Default)]
struct BatchState {
    stats: BatchStats,
    operations: Vec<OperationRecord>,
    simulated_moves: usize,
    announced_folders: HashSet<PathBuf>,
}

impl<'a> Organizer<'a> {
    /// Creates an organizer for `config`. `config_id` is recorded in the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured filter patterns do not compile.
    pub fn new(
        config: &'a OrganizerConfig,
        config_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            config,
            config_id: config_id.into(),
            filters: config.filters.compile()?,
        })
    }

    /// Runs one organization pass.
    ///
    /// Per-file failures are counted and reported without stopping the batch.
    /// A history write failure is reported in [`BatchOutcome::history_error`].
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::TargetMissing`] before touching anything if the
    /// target folder does not exist.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::batch::Organizer;
    /// use dirsort::config::OrganizerConfig;
    ///
    /// let config = OrganizerConfig {
    ///     dry_run: false,
    ///     ..OrganizerConfig::default()
    /// };
    /// let outcome = Organizer::new(&config, "defaults")
    ///     .expect("filters compile")
    ///     .run()
    ///     .expect("target folder exists");
    /// println!("moved {} files", outcome.stats.moved_files);
    /// ```
    pub fn run(&self) -> OrganizeResult<BatchOutcome> {
        let target = absolute(&self.config.target_folder);
        if !target.is_dir() {
            return Err(OrganizeError::TargetMissing { path: target });
        }

        let dry_run = self.config.dry_run;
        OutputFormatter::info(&format!("Scanning folder: {}", target.display()));
        OutputFormatter::plain(&format!(
            "Mode: {}",
            if dry_run { "dry run" } else { "real run" }
        ));
        OutputFormatter::plain(&format!(
            "Recursive: {}",
            if self.config.recursive { "yes" } else { "no" }
        ));
        OutputFormatter::separator();

        let mut state = BatchState::default();
        let entries = self.scan(&target, &mut state.stats);
        state.stats.total_files = entries.len();

        let log_path = absolute(&self.config.log_file);
        let history_tmp = HistoryLog::new(&log_path).temp_path();
        let history_files = [resolve(&log_path), resolve(&history_tmp)];
        let mover = FileMover::new(dry_run, self.config.enable_undo);

        for entry in entries.iter().filter(|e| !e.is_dir) {
            if !self.config.recursive && entry.path.parent() != Some(target.as_path()) {
                continue;
            }
            if is_history_file(&entry.path, &history_files) {
                log::debug!("leaving history file {} in place", entry.path.display());
                continue;
            }
            let relative = entry.path.strip_prefix(&target).unwrap_or(entry.path.as_path());
            if !self.filters.should_include(relative) {
                log::debug!("{} excluded by filters", relative.display());
                continue;
            }

            self.process_file(&target, &entry.path, &mover, &mut state);
        }

        let (history_path, history_error) = if !dry_run && self.config.enable_undo {
            self.persist(&target, &log_path, &state)
        } else {
            (None, None)
        };

        let outcome = BatchOutcome {
            stats: state.stats,
            operations: state.operations,
            simulated_moves: state.simulated_moves,
            history_path,
            history_error,
        };
        OutputFormatter::batch_summary(&outcome, dry_run);

        Ok(outcome)
    }

    /// Collects every entry below `target`, sorted by name within each folder.
    ///
    /// The listing is complete before any file moves, so folders created during
    /// the run are never scanned.
    fn scan(&self, target: &Path, stats: &mut BatchStats) -> Vec<ScannedEntry> {
        let spinner = OutputFormatter::create_spinner("Scanning...");

        let mut walker = WalkDir::new(target).min_depth(1).sort_by_file_name();
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let mut entries = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.into_path();
                    let is_dir = path.is_dir();
                    entries.push(ScannedEntry { path, is_dir });
                }
                Err(e) => {
                    stats.errors += 1;
                    spinner.suspend(|| OutputFormatter::error(&format!("Cannot read entry: {}", e)));
                }
            }
        }

        spinner.finish_and_clear();
        log::debug!("enumerated {} entries under {}", entries.len(), target.display());
        entries
    }

    fn process_file(
        &self,
        target: &Path,
        path: &Path,
        mover: &FileMover,
        state: &mut BatchState,
    ) {
        let Some(file_name) = path.file_name() else {
            return;
        };

        let category = self.config.file_categories.classify(path);
        let category_dir = target.join(category);
        if let Err(e) = self.ensure_folder(&category_dir, state) {
            OutputFormatter::error(&e.to_string());
            state.stats.errors += 1;
            state.stats.skipped_files += 1;
            return;
        }

        let desired = category_dir.join(file_name);
        if desired == path {
            log::debug!("{} is already in {}", path.display(), category);
            state.stats.skipped_files += 1;
            return;
        }

        let Some(destination) = self.config.conflict_resolution.resolve(&desired) else {
            OutputFormatter::warning(&format!(
                "Skipped: {} (conflict policy: {})",
                file_name.to_string_lossy(),
                self.config.conflict_resolution
            ));
            state.stats.skipped_files += 1;
            return;
        };

        match mover.execute(path, &destination, &mut state.operations) {
            Ok(MoveOutcome::Moved) => state.stats.moved_files += 1,
            Ok(MoveOutcome::Simulated) => state.simulated_moves += 1,
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                state.stats.errors += 1;
                state.stats.skipped_files += 1;
            }
        }
    }

    /// Creates `folder` if missing. Dry runs only announce it, once per folder.
    fn ensure_folder(&self, folder: &Path, state: &mut BatchState) -> OrganizeResult<()> {
        if folder.exists() {
            return Ok(());
        }

        if self.config.dry_run {
            if state.announced_folders.insert(folder.to_path_buf()) {
                OutputFormatter::dry_run_notice(&format!("Create folder: {}", folder.display()));
            }
            return Ok(());
        }

        fs::create_dir_all(folder).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: folder.to_path_buf(),
            source: e,
        })?;
        state.stats.created_folders += 1;
        OutputFormatter::info(&format!("Created folder: {}", folder.display()));
        Ok(())
    }

    fn persist(
        &self,
        target: &Path,
        log_path: &Path,
        state: &BatchState,
    ) -> (Option<PathBuf>, Option<OrganizeError>) {
        let batch = BatchRecord::new(
            self.config_id.clone(),
            target,
            state.operations.clone(),
            state.stats,
        );

        match HistoryLog::new(log_path).append(batch) {
            Ok(_) => {
                OutputFormatter::info(&format!("History saved to: {}", log_path.display()));
                (Some(log_path.to_path_buf()), None)
            }
            Err(e) => {
                OutputFormatter::error(&format!("Could not save history: {}", e));
                (None, Some(e))
            }
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Canonical form of `path`, with `..` and symlinks resolved. A file that does
/// not exist yet is resolved through its parent folder.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let absolute = absolute(path);
    if let (Some(parent), Some(name)) = (absolute.parent(), absolute.file_name())
        && let Ok(parent) = fs::canonicalize(parent)
    {
        return parent.join(name);
    }
    absolute
}

/// Whether `path` names the history log or its temporary sibling, however
/// either is spelled.
fn is_history_file(path: &Path, history_files: &[PathBuf]) -> bool {
    let resolved = resolve(path);
    history_files.contains(&resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExcludeRules, FilterRules};
    use crate::conflict::ConflictPolicy;
    use tempfile::TempDir;

    fn config_for(temp_dir: &TempDir) -> OrganizerConfig {
        let target = temp_dir.path().join("inbox");
        fs::create_dir(&target).expect("Failed to create target");
        OrganizerConfig {
            target_folder: target,
            log_file: temp_dir.path().join("history.json"),
            dry_run: false,
            ..OrganizerConfig::default()
        }
    }

    fn run(config: &OrganizerConfig) -> BatchOutcome {
        Organizer::new(config, "test.toml")
            .expect("filters compile")
            .run()
            .expect("run should succeed")
    }

    #[test]
    fn test_missing_target_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = OrganizerConfig {
            target_folder: temp_dir.path().join("missing"),
            log_file: temp_dir.path().join("history.json"),
            dry_run: false,
            ..OrganizerConfig::default()
        };

        let result = Organizer::new(&config, "test.toml").unwrap().run();

        assert!(matches!(result, Err(OrganizeError::TargetMissing { .. })));
        assert!(!config.log_file.exists());
    }

    #[test]
    fn test_total_counts_directories_too() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = config_for(&temp_dir);
        fs::write(config.target_folder.join("a.jpg"), "a").unwrap();
        fs::create_dir(config.target_folder.join("sub")).unwrap();

        let outcome = run(&config);

        assert_eq!(outcome.stats.total_files, 2);
        assert_eq!(outcome.stats.moved_files, 1);
        assert!(config.target_folder.join("sub").is_dir());
    }

    #[test]
    fn test_log_file_inside_target_is_not_moved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        config.log_file = config.target_folder.join("organizer_log.json");
        fs::write(&config.log_file, "[]").unwrap();
        fs::write(config.target_folder.join("b.pdf"), "b").unwrap();

        let outcome = run(&config);

        assert_eq!(outcome.stats.moved_files, 1);
        assert!(config.log_file.exists());
        assert!(!config.target_folder.join("Code").exists());
    }

    #[test]
    fn test_log_file_kept_when_target_is_spelled_with_dotdot() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        let inbox = config.target_folder.clone();
        config.log_file = inbox.join("organizer_log.json");
        config.target_folder = inbox.join("..").join("inbox");
        fs::write(&config.log_file, "[]").unwrap();
        fs::write(inbox.join("a.jpg"), "a").unwrap();

        let outcome = run(&config);

        assert_eq!(outcome.stats.moved_files, 1);
        assert!(inbox.join("Images/a.jpg").exists());
        assert!(!inbox.join("Code").exists());
        assert_eq!(HistoryLog::new(&config.log_file).load().unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_log_file_kept_when_target_is_a_symlink() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        let inbox = config.target_folder.clone();
        let link = temp_dir.path().join("inbox-link");
        std::os::unix::fs::symlink(&inbox, &link).unwrap();
        config.log_file = inbox.join("organizer_log.json");
        config.target_folder = link;
        fs::write(&config.log_file, "[]").unwrap();
        fs::write(inbox.join("b.pdf"), "b").unwrap();

        let outcome = run(&config);

        assert_eq!(outcome.stats.moved_files, 1);
        assert!(config.log_file.exists());
        assert!(!inbox.join("Code").exists());
    }

    #[test]
    fn test_leftover_history_temp_file_is_not_moved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        config.log_file = config.target_folder.join("organizer_log.json");
        fs::write(config.target_folder.join("organizer_log.json.tmp"), "[]").unwrap();
        fs::write(config.target_folder.join("b.pdf"), "b").unwrap();

        let outcome = run(&config);

        assert_eq!(outcome.stats.moved_files, 1);
        assert!(!config.target_folder.join("Others").exists());
        assert!(config.log_file.exists());
    }

    #[test]
    fn test_filtered_files_stay_and_are_not_counted_as_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        config.filters = FilterRules {
            exclude: ExcludeRules {
                extensions: vec!["part".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        fs::write(config.target_folder.join("movie.mkv.part"), "x").unwrap();
        fs::write(config.target_folder.join("movie.mkv"), "x").unwrap();

        let outcome = run(&config);

        assert!(config.target_folder.join("movie.mkv.part").exists());
        assert!(config.target_folder.join("Media/movie.mkv").exists());
        assert_eq!(outcome.stats.skipped_files, 0);
        assert_eq!(outcome.stats.moved_files, 1);
    }

    #[test]
    fn test_recursive_leaves_already_sorted_files_alone() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        config.recursive = true;
        fs::create_dir(config.target_folder.join("Images")).unwrap();
        fs::write(config.target_folder.join("Images/old.png"), "x").unwrap();

        let outcome = run(&config);

        assert!(config.target_folder.join("Images/old.png").exists());
        assert!(!config.target_folder.join("Images/old_1.png").exists());
        assert_eq!(outcome.stats.moved_files, 0);
        assert_eq!(outcome.stats.skipped_files, 1);
    }

    #[test]
    fn test_history_disabled_writes_no_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        config.enable_undo = false;
        fs::write(config.target_folder.join("a.jpg"), "a").unwrap();

        let outcome = run(&config);

        assert!(config.target_folder.join("Images/a.jpg").exists());
        assert!(outcome.operations.is_empty());
        assert!(outcome.history_path.is_none());
        assert!(!config.log_file.exists());
    }

    #[test]
    fn test_history_write_failure_keeps_moves() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        config.log_file = temp_dir.path().join("no_such_dir").join("history.json");
        fs::write(config.target_folder.join("a.jpg"), "a").unwrap();

        let outcome = run(&config);

        assert!(config.target_folder.join("Images/a.jpg").exists());
        assert_eq!(outcome.stats.moved_files, 1);
        assert!(matches!(
            outcome.history_error,
            Some(OrganizeError::HistoryWriteFailed { .. })
        ));
    }

    #[test]
    fn test_dry_run_counts_simulated_moves() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        config.dry_run = true;
        fs::write(config.target_folder.join("a.jpg"), "a").unwrap();
        fs::write(config.target_folder.join("b.jpg"), "b").unwrap();

        let outcome = run(&config);

        assert_eq!(outcome.simulated_moves, 2);
        assert_eq!(outcome.stats.moved_files, 0);
        assert_eq!(outcome.stats.created_folders, 0);
        assert!(!config.target_folder.join("Images").exists());
    }

    #[test]
    fn test_skip_policy_counts_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut config = config_for(&temp_dir);
        config.conflict_resolution = ConflictPolicy::Skip;
        fs::create_dir(config.target_folder.join("Images")).unwrap();
        fs::write(config.target_folder.join("Images/a.jpg"), "old").unwrap();
        fs::write(config.target_folder.join("a.jpg"), "new").unwrap();

        let outcome = run(&config);

        assert_eq!(outcome.stats.skipped_files, 1);
        assert_eq!(outcome.stats.errors, 0);
        assert_eq!(outcome.stats.created_folders, 0);
        assert!(config.target_folder.join("a.jpg").exists());
    }
}
