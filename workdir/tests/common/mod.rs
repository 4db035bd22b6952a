//! Common test utilities for integration tests.
//!
//! This module provides a directory tree fixture for laying out layered
//! `workdir.js` / `workdir.yml` files, plus small argument helpers.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;
use tempfile::TempDir;

/// A temporary directory tree that is removed when dropped.
///
/// Paths are canonical, so they compare equal to handle paths even where
/// the temp directory sits behind a symlink.
pub struct Tree {
    _root: TempDir,
    path: PathBuf,
}

#[allow(dead_code)]
impl Tree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().canonicalize().unwrap();
        Self { _root: root, path }
    }

    /// The canonical root of the tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates `relative` (and its parents) as a directory.
    pub fn dir(&self, relative: &str) -> PathBuf {
        let dir = self.path.join(relative);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let file = self.path.join(relative);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file, content).unwrap();
        file
    }
}

/// An empty keyword argument map.
#[allow(dead_code)]
pub fn no_keywords() -> IndexMap<String, Value> {
    IndexMap::new()
}

/// Builds a keyword argument map from pairs.
#[allow(dead_code)]
pub fn keywords(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}
