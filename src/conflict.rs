//! Destination name-collision handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How to treat a destination path that already names an existing file.
///
/// Chosen once per run and applied to every file of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Pick the first free `{stem}_{n}{extension}` name, counting from 1.
    #[default]
    Rename,
    /// Keep the destination; the move replaces the existing file.
    Overwrite,
    /// Leave the source file where it is.
    Skip,
}

impl ConflictPolicy {
    /// Resolves `destination` under this policy.
    ///
    /// Returns `None` when the file must not be moved. A destination that does
    /// not exist yet is returned unchanged by every policy.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::conflict::ConflictPolicy;
    /// use std::path::Path;
    ///
    /// // With Images/a.jpg already present:
    /// let resolved = ConflictPolicy::Rename.resolve(Path::new("Images/a.jpg"));
    /// assert_eq!(resolved.as_deref(), Some(Path::new("Images/a_1.jpg")));
    /// ```
    pub fn resolve(&self, destination: &Path) -> Option<PathBuf> {
        if !destination.exists() {
            return Some(destination.to_path_buf());
        }

        match self {
            ConflictPolicy::Overwrite => Some(destination.to_path_buf()),
            ConflictPolicy::Skip => None,
            ConflictPolicy::Rename => Some(next_free_name(destination)),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictPolicy::Rename => "rename",
            ConflictPolicy::Overwrite => "overwrite",
            ConflictPolicy::Skip => "skip",
        };
        f.write_str(name)
    }
}

/// Probes `{stem}_1{ext}`, `{stem}_2{ext}`, ... next to `taken` until a free one
/// turns up. Unbounded: terminates because the directory holds finitely many
/// entries.
fn next_free_name(taken: &Path) -> PathBuf {
    let stem = taken
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = taken
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = taken.parent().unwrap_or_else(|| Path::new(""));

    (1u64..)
        .map(|counter| parent.join(format!("{}_{}{}", stem, counter, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| taken.to_path_buf())
}
