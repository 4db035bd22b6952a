//! Layered discovery of candidate files.
//!
//! A work directory inherits definitions from its ancestors. The locator
//! enumerates where those definitions may live: one candidate per file name
//! per directory level, ordered from the most general (root-most) level to
//! the most specific (the target directory). Later entries take precedence
//! over earlier ones when loaded.

use std::fmt;
use std::path::{Path, PathBuf};

/// How many parent directories to include above the target directory.
///
/// # Examples
///
/// ```
/// use workdir::path::Recursion;
///
/// assert_eq!(Recursion::from(-1), Recursion::Unbounded);
/// assert_eq!(Recursion::from(2), Recursion::Levels(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recursion {
    /// Walk up to the filesystem root.
    #[default]
    Unbounded,
    /// Include this many ancestors; `Levels(0)` is the target directory only.
    Levels(usize),
}

impl Recursion {
    /// Returns true once `depth` ancestors have been visited.
    #[must_use]
    pub const fn reached(self, depth: usize) -> bool {
        match self {
            Self::Unbounded => false,
            Self::Levels(max) => depth >= max,
        }
    }
}

impl From<i32> for Recursion {
    /// Negative depths mean unbounded recursion.
    fn from(depth: i32) -> Self {
        usize::try_from(depth).map_or(Self::Unbounded, Self::Levels)
    }
}

impl fmt::Display for Recursion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "-1"),
            Self::Levels(n) => write!(f, "{n}"),
        }
    }
}

/// Enumerate candidate files for `names` in `path` and its ancestors.
///
/// The returned paths need not exist. Within one directory level the
/// candidates keep the order of `names`.
///
/// # Examples
///
/// ```
/// use workdir::path::{locate, Recursion};
/// use std::path::{Path, PathBuf};
///
/// let found = locate(Path::new("/a/b"), &["workdir.js"], Recursion::Unbounded);
/// assert_eq!(
///     found,
///     vec![
///         PathBuf::from("/workdir.js"),
///         PathBuf::from("/a/workdir.js"),
///         PathBuf::from("/a/b/workdir.js"),
///     ]
/// );
///
/// let found = locate(Path::new("/a/b"), &["workdir.js"], Recursion::Levels(0));
/// assert_eq!(found, vec![PathBuf::from("/a/b/workdir.js")]);
/// ```
pub fn locate<S: AsRef<str>>(path: &Path, names: &[S], recursion: Recursion) -> Vec<PathBuf> {
    let mut levels = Vec::new();
    let mut current = Some(path);
    let mut depth = 0;

    while let Some(dir) = current {
        levels.push(dir);
        if recursion.reached(depth) {
            break;
        }
        current = dir.parent();
        depth += 1;
    }

    levels
        .iter()
        .rev()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name.as_ref())))
        .collect()
}
