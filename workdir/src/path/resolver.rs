//! Resolution of the directory a handle is rooted at.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::normalize;

/// Resolve a directory argument to a canonical absolute location.
///
/// The path is made absolute (tilde, relative paths), then resolved the
/// way `realpath` does: symlinks are followed in the existing part, and
/// `..` steps out of a symlink's target rather than the link's directory. When `create` is true the
/// directory and any missing parents are created; a regular file at that
/// location is a [`Error::Configuration`]. When `create` is false nothing on
/// the filesystem is touched and the directory may not exist.
///
/// # Errors
///
/// Returns an error if normalization fails, the path is an existing file
/// while `create` is set, or the directory cannot be created.
///
/// # Examples
///
/// ```
/// use workdir::path::resolve_directory;
///
/// let tmp = tempfile::tempdir().unwrap();
/// let target = tmp.path().join("new");
/// let resolved = resolve_directory(&target, true).unwrap();
/// assert!(resolved.is_dir());
/// assert!(resolved.is_absolute());
/// ```
pub fn resolve_directory(directory: &Path, create: bool) -> Result<PathBuf> {
    let absolute = normalize::absolute(directory)?;
    let resolved = real_path(&absolute)?;

    if !create {
        return Ok(resolved);
    }

    if resolved.is_file() {
        return Err(Error::Configuration {
            path: resolved,
            reason: "path is a file".to_string(),
        });
    }

    if !resolved.is_dir() {
        log::debug!("creating work directory {}", resolved.display());
        fs::create_dir_all(&resolved).map_err(|e| Error::Configuration {
            path: resolved.clone(),
            reason: e.to_string(),
        })?;
        // A freshly created directory may sit below a symlinked parent.
        return real_path(&resolved);
    }

    Ok(resolved)
}

/// Resolve an absolute path one component at a time, following symlinks
/// in every prefix that exists.
///
/// `..` is applied to the prefix resolved so far, so `link/..` is the
/// parent of the link's target. Components below the deepest existing
/// prefix are kept as written.
fn real_path(path: &Path) -> Result<PathBuf> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => {
                resolved.push(other.as_os_str());
                match fs::canonicalize(&resolved) {
                    Ok(real) => resolved = real,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                        return Err(Error::InvalidPath {
                            path: path.to_path_buf(),
                            reason: format!(
                                "cannot access {}: permission denied",
                                resolved.display()
                            ),
                        });
                    }
                    Err(e) => return Err(Error::Io(e)),
                }
            }
        }
    }

    Ok(resolved)
}
