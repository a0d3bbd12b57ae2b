//! Organizer configuration and file filtering rules.
//!
//! Configuration is read from a TOML file (or JSON when the file name ends in
//! `.json`). Every key is optional; keys left out keep their built-in default.
//!
//! # Configuration File Format
//!
//! ```toml
//! target_folder = "/home/me/Downloads"
//! log_file = "organizer_log.json"
//! enable_undo = true
//! conflict_resolution = "rename"   # or "overwrite", "skip"
//! dry_run = true
//! recursive = false
//!
//! [file_categories]
//! Images = [".jpg", ".png"]
//! Documents = [".pdf", ".txt"]
//! Others = []
//!
//! [filters]
//! skip_hidden = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.part", "node_modules/**"]
//! extensions = ["tmp", ".crdownload"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::conflict::ConflictPolicy;
use crate::file_category::CategoryTable;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "dirsort.toml";

/// Configuration identifier recorded in the log when no file was used.
pub const DEFAULTS_ID: &str = "defaults";

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML/JSON syntax or structure.
    #[error("Invalid configuration {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    /// Invalid regex pattern provided.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for one organizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    /// Folder whose files get sorted.
    pub target_folder: PathBuf,
    /// Category name to extensions, in priority order.
    pub file_categories: CategoryTable,
    /// Where batch history is kept.
    pub log_file: PathBuf,
    /// Record moves so the last batch can be undone.
    pub enable_undo: bool,
    pub conflict_resolution: ConflictPolicy,
    /// Report intended actions without touching the filesystem.
    pub dry_run: bool,
    /// Also sort files in subfolders.
    pub recursive: bool,
    pub filters: FilterRules,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            target_folder: default_target_folder(),
            file_categories: CategoryTable::default(),
            log_file: PathBuf::from("organizer_log.json"),
            enable_undo: true,
            conflict_resolution: ConflictPolicy::Rename,
            dry_run: true,
            recursive: false,
            filters: FilterRules::default(),
        }
    }
}

fn default_target_folder() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join("Downloads")
}

/// A loaded configuration and the identifier recorded for it in batch history.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: OrganizerConfig,
    /// File name of the configuration source, or [`DEFAULTS_ID`].
    pub id: String,
}

impl OrganizerConfig {
    /// Loads configuration, falling back to defaults when no file is found.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `dirsort.toml` in the current directory
    /// 3. `~/.config/dirsort/config.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file is missing, or if any file
    /// found cannot be read, parsed, or has invalid filter patterns.
    pub fn load(config_path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = std::env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(LoadedConfig {
            config: Self::default(),
            id: DEFAULTS_ID.to_string(),
        })
    }

    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::Io` if it cannot be read, `ConfigError::ConfigInvalid` if it
    /// does not parse, and a pattern error if its filters do not compile.
    pub fn load_from_file(path: &Path) -> Result<LoadedConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_str(&content).map_err(|e| ConfigError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        // Reject bad patterns up front so a broken file falls back as a whole.
        config.filters.compile()?;

        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::debug!("loaded configuration from {}", path.display());

        Ok(LoadedConfig { config, id })
    }
}

/// Rules deciding which files a run leaves alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRules {
    /// Leave files whose name starts with "." in place. Defaults to false.
    #[serde(default)]
    pub skip_hidden: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the path relative to the target folder.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, with or without the dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterRules {
    /// Compiles the rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    skip_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                        pattern: pattern.clone(),
                        reason: e.msg.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(rules.exclude.patterns.as_slice())?,
            exclude_regexes,
            include_patterns: compile_globs(rules.include.patterns.as_slice())?,
        })
    }

    /// Checks whether a file should be organized.
    ///
    /// `relative_path` is the file's path relative to the target folder.
    /// Checks run in order with early exit:
    /// 1. Include patterns - if matched, always include
    /// 2. Hidden file filter
    /// 3. Exact filename match
    /// 4. File extension match
    /// 5. Glob pattern match
    /// 6. Regex match on the file name
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.include_patterns.iter().any(|p| p.matches_path(relative_path)) {
            return true;
        }

        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| p.matches_path(relative_path)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(&file_name))
    }
}
