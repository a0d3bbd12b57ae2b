/// Extension-based file categorization.
///
/// A [`CategoryTable`] is an ordered list of named categories, each owning a set
/// of lowercase extensions (with the leading dot). Classification walks the table
/// in order and returns the first category that owns the file's extension, or
/// [`FALLBACK_CATEGORY`] when none does.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::CategoryTable;
/// use std::path::Path;
///
/// let table = CategoryTable::default();
/// assert_eq!(table.classify(Path::new("photo.JPG")), "Images");
/// assert_eq!(table.classify(Path::new("report.pdf")), "Documents");
/// assert_eq!(table.classify(Path::new("mystery.xyz")), "Others");
/// ```
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path};
use thiserror::Error;

/// Category assigned to files whose extension no table entry claims.
pub const FALLBACK_CATEGORY: &str = "Others";

/// Errors raised while building a category table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    /// The category name cannot be used as a single folder name.
    #[error("invalid category name '{0}': must be a single folder name")]
    InvalidName(String),
}

/// One named category and the extensions it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    /// Category name, also used as the destination folder name.
    pub name: String,
    /// Normalized extensions, lowercase with a leading dot.
    pub extensions: Vec<String>,
}

/// Ordered mapping from category name to the extensions it owns.
///
/// Table order is significant: when an extension is listed under several
/// categories, the first one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    entries: Vec<CategoryEntry>,
}

impl CategoryTable {
    /// Builds a table from `(name, extensions)` pairs, keeping their order.
    ///
    /// Extensions are lowercased and given a leading dot if they lack one, so
    /// `"JPG"`, `".jpg"` and `".JPG"` all end up as `".jpg"`.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::InvalidName`] if a name is empty, contains a path
    /// separator, or is `.`/`..`.
    pub fn new<I, N, E>(entries: I) -> Result<Self, CategoryError>
    where
        I: IntoIterator<Item = (N, Vec<E>)>,
        N: Into<String>,
        E: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, extensions)| {
                let name = name.into();
                if !is_plain_folder_name(&name) {
                    return Err(CategoryError::InvalidName(name));
                }
                let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());
                for ext in extensions {
                    let ext = normalize_extension(ext.as_ref());
                    if !normalized.contains(&ext) {
                        normalized.push(ext);
                    }
                }
                Ok(CategoryEntry {
                    name,
                    extensions: normalized,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    /// Returns the entries in table order.
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Returns the category owning `extension`, or the fallback category.
    ///
    /// The comparison is case-insensitive and includes the leading dot.
    ///
    /// ```
    /// use dirsort::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::default();
    /// assert_eq!(table.category_for_extension(".PNG"), "Images");
    /// assert_eq!(table.category_for_extension(""), "Others");
    /// ```
    pub fn category_for_extension(&self, extension: &str) -> &str {
        let extension = extension.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.extensions.contains(&extension))
            .map(|entry| entry.name.as_str())
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// Classifies a file by the last extension of its name.
    ///
    /// Files without an extension (including dotfiles like `.bashrc`) land in
    /// the fallback category.
    pub fn classify(&self, path: &Path) -> &str {
        match path.extension() {
            Some(ext) => self.category_for_extension(&format!(".{}", ext.to_string_lossy())),
            None => FALLBACK_CATEGORY,
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let entries = vec![
            CategoryEntry::from_static(
                "Images",
                &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp"],
            ),
            CategoryEntry::from_static(
                "Documents",
                &[
                    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".md",
                ],
            ),
            CategoryEntry::from_static(
                "Installers",
                &[".exe", ".msi", ".dmg", ".app", ".deb", ".rpm", ".pkg"],
            ),
            CategoryEntry::from_static("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
            CategoryEntry::from_static("Media", &[".mp3", ".mp4", ".avi", ".mkv", ".mov", ".wav"]),
            CategoryEntry::from_static(
                "Code",
                &[
                    ".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".json", ".xml",
                ],
            ),
            CategoryEntry::from_static(FALLBACK_CATEGORY, &[]),
        ];
        Self { entries }
    }
}

impl CategoryEntry {
    fn from_static(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn is_plain_folder_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

impl Serialize for CategoryTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.extensions)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = CategoryTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category names to extension lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, Vec<String>)> = Vec::new();
                while let Some((name, extensions)) = map.next_entry::<String, Vec<String>>()? {
                    entries.push((name, extensions));
                }
                CategoryTable::new(entries).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
