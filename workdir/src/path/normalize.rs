//! Lexical normalization of directory arguments.
//!
//! A directory may be given relative to the current directory or to the
//! home directory (`~`, `~/src`). Normalization makes it absolute and folds
//! `.` and `..` segments without touching the filesystem, so the directory
//! need not exist yet.

use std::env;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Make `path` absolute and fold its `.` and `..` segments.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] for `~user` paths, when the home
/// directory is unknown, or when the current directory cannot be read.
///
/// # Examples
///
/// ```
/// use workdir::path::normalize::normalize;
/// use std::path::Path;
///
/// assert_eq!(normalize(Path::new("/srv/app/./logs/..")).unwrap(), Path::new("/srv/app"));
/// assert!(normalize(Path::new("~/src")).unwrap().ends_with("src"));
/// ```
pub fn normalize(path: &Path) -> Result<PathBuf> {
    Ok(fold_dots(&absolute(path)?))
}

/// Make `path` absolute by expanding `~` or joining it to the current
/// directory. `.` and `..` segments are kept.
///
/// # Errors
///
/// Same as [`normalize`].
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let invalid = |reason: String| Error::InvalidPath {
        path: path.to_path_buf(),
        reason,
    };

    let mut components = path.components();
    let base = match components.clone().next() {
        Some(Component::Normal(first)) if first == OsStr::new("~") => {
            components.next();
            home::home_dir().ok_or_else(|| invalid("cannot determine home directory".into()))?
        }
        Some(Component::Normal(first)) if first.to_string_lossy().starts_with('~') => {
            return Err(invalid("only ~ and ~/path are expanded".into()));
        }
        _ if path.is_absolute() => PathBuf::new(),
        _ => env::current_dir().map_err(|e| invalid(format!("cannot read current directory: {e}")))?,
    };

    Ok(base.join(components.as_path()))
}

/// Fold `.` and `..` segments of an absolute path.
///
/// `..` never climbs above the root.
///
/// ```
/// use workdir::path::normalize::fold_dots;
/// use std::path::Path;
///
/// assert_eq!(fold_dots(Path::new("/a/./b/../c")), Path::new("/a/c"));
/// assert_eq!(fold_dots(Path::new("/../a")), Path::new("/a"));
/// ```
#[must_use]
pub fn fold_dots(path: &Path) -> PathBuf {
    path.components().fold(PathBuf::new(), |mut folded, component| {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if folded.parent().is_some() {
                    folded.pop();
                }
            }
            other => folded.push(other.as_os_str()),
        }
        folded
    })
}
