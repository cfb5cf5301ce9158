//! Folder and extension exclusion rules.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// How configured exclude folders are matched against paths.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExclusionMode {
    /// Literal string prefix. `/tmp/exclude` also matches `/tmp/excluded`.
    #[default]
    Prefix,
    /// Prefix that must end at a path separator.
    Segment,
}

/// Decides whether paths are excluded from hashing.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    folders: Vec<String>,
    extensions: HashSet<String>,
    mode: ExclusionMode,
}

impl PathFilter {
    /// Build a filter from raw configuration lists.
    ///
    /// Folder entries lose their trailing separators; empty entries are
    /// dropped. Extensions are lowercased with one leading dot removed.
    pub fn new<F, E>(folders: F, extensions: E, mode: ExclusionMode) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let folders = folders
            .into_iter()
            .filter(|f| !f.as_ref().is_empty())
            .map(|f| f.as_ref().trim_end_matches(['/', '\\']).to_string())
            .collect();

        let extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            folders,
            extensions,
            mode,
        }
    }

    /// Exclusion mode in use.
    pub fn mode(&self) -> ExclusionMode {
        self.mode
    }

    /// Check the folder rule for any entry, file or directory.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.folders
            .iter()
            .any(|folder| folder_matches(&path, folder, self.mode))
    }

    /// Check the extension rule. Files without an extension never match.
    pub fn is_extension_excluded(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return false;
        }
        match path.extension() {
            Some(ext) => self
                .extensions
                .contains(&ext.to_string_lossy().to_lowercase()),
            None => false,
        }
    }
}

/// Lowercase an extension and strip a single leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().strip_prefix('.').unwrap_or(ext.trim()).to_lowercase()
}

fn folder_matches(path: &str, folder: &str, mode: ExclusionMode) -> bool {
    if !path.starts_with(folder) {
        return false;
    }
    match mode {
        ExclusionMode::Prefix => true,
        ExclusionMode::Segment => {
            // Empty folder means the root itself was configured.
            folder.is_empty()
                || path.len() == folder.len()
                || matches!(path.as_bytes()[folder.len()], b'/' | b'\\')
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folders(list: &[&str], mode: ExclusionMode) -> PathFilter {
        PathFilter::new(list.iter().copied(), Vec::<&str>::new(), mode)
    }

    #[test]
    fn test_prefix_mode_is_literal() {
        let filter = folders(&["/tmp/exclude"], ExclusionMode::Prefix);

        assert!(filter.is_excluded(Path::new("/tmp/exclude")));
        assert!(filter.is_excluded(Path::new("/tmp/exclude/a.txt")));
        assert!(filter.is_excluded(Path::new("/tmp/excluded/a.txt")));
        assert!(!filter.is_excluded(Path::new("/tmp/other/a.txt")));
    }

    #[test]
    fn test_segment_mode_respects_boundaries() {
        let filter = folders(&["/tmp/exclude"], ExclusionMode::Segment);

        assert!(filter.is_excluded(Path::new("/tmp/exclude")));
        assert!(filter.is_excluded(Path::new("/tmp/exclude/a.txt")));
        assert!(!filter.is_excluded(Path::new("/tmp/excluded/a.txt")));
    }

    #[test]
    fn test_trailing_separators_stripped() {
        let filter = folders(&["/tmp/exclude///", "C:\\data\\skip\\"], ExclusionMode::Segment);

        assert!(filter.is_excluded(Path::new("/tmp/exclude/a.txt")));
        assert!(filter.is_excluded(Path::new("C:\\data\\skip\\a.txt")));
    }

    #[test]
    fn test_empty_entries_ignored() {
        let filter = folders(&[""], ExclusionMode::Prefix);
        assert!(!filter.is_excluded(Path::new("/tmp/a.txt")));
    }

    #[test]
    fn test_root_excludes_everything() {
        let filter = folders(&["/"], ExclusionMode::Segment);
        assert!(filter.is_excluded(Path::new("/tmp/a.txt")));
    }

    #[test]
    fn test_extension_rule() {
        let filter = PathFilter::new(Vec::<&str>::new(), [".JPG", "png", " pdf "], ExclusionMode::Prefix);

        assert!(filter.is_extension_excluded(Path::new("/x/photo.jpg")));
        assert!(filter.is_extension_excluded(Path::new("/x/photo.JPG")));
        assert!(filter.is_extension_excluded(Path::new("/x/doc.PdF")));
        assert!(!filter.is_extension_excluded(Path::new("/x/photo.jpeg")));
        assert!(!filter.is_extension_excluded(Path::new("/x/Makefile")));
        assert!(!filter.is_extension_excluded(Path::new("/x/.png")));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".TXT"), "txt");
        assert_eq!(normalize_extension("gz"), "gz");
        assert_eq!(normalize_extension(""), "");
    }
}
