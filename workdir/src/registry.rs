//! Provenance of custom members.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Records which file defined each custom member of a handle.
///
/// A name maps to the last file that wrote it, so after layered loading a
/// child directory's definition is the one on record.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use workdir::AttributeRegistry;
///
/// let mut registry = AttributeRegistry::new();
/// registry.record("name", Path::new("/repo/workdir.yml"));
/// registry.record("name", Path::new("/repo/sub/workdir.yml"));
///
/// assert_eq!(registry.source_of("name"), Some(Path::new("/repo/sub/workdir.yml")));
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRegistry {
    sources: IndexMap<String, PathBuf>,
}

impl AttributeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `source` as the definer of `name`, replacing any earlier
    /// record. A replaced name keeps its original position.
    pub fn record(&mut self, name: impl Into<String>, source: &Path) {
        self.sources.insert(name.into(), source.to_path_buf());
    }

    /// The full mapping from member name to defining file.
    #[must_use]
    pub const fn list(&self) -> &IndexMap<String, PathBuf> {
        &self.sources
    }

    /// The file that defined `name`.
    #[must_use]
    pub fn source_of(&self, name: &str) -> Option<&Path> {
        self.sources.get(name).map(PathBuf::as_path)
    }

    /// Returns true if `name` is a custom member.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Number of custom members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no custom member was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Iterates over `(name, source)` pairs in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.sources
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }
}
