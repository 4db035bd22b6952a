//! Scoped process state.
//!
//! Entering a work directory changes the process working directory and
//! overlays environment variables; leaving restores both. Both are
//! process-global, so one thread at a time may hold scopes. The owning
//! thread may nest scopes freely (of the same handle or of different
//! handles); each [`Scope`] guard carries its own restore frame, so nested
//! scopes unwind strictly last-in first-out.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::handle::WorkDir;

#[derive(Debug)]
struct Owner {
    thread: ThreadId,
    depth: usize,
}

static PROCESS_CONTEXT: Mutex<Option<Owner>> = Mutex::new(None);

/// The process-wide record of which thread holds scopes.
#[derive(Debug)]
pub struct ProcessContext;

impl ProcessContext {
    /// Claims the process context for the current thread and returns the
    /// new nesting depth.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScopeConflict`] if another thread holds it.
    pub fn acquire() -> Result<usize> {
        let mut owner = PROCESS_CONTEXT
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let current = thread::current().id();

        match owner.as_mut() {
            Some(owner) if owner.thread != current => Err(Error::ScopeConflict),
            Some(owner) => {
                owner.depth += 1;
                Ok(owner.depth)
            }
            None => {
                *owner = Some(Owner {
                    thread: current,
                    depth: 1,
                });
                Ok(1)
            }
        }
    }

    /// Releases the innermost claim made by the current thread.
    pub fn release(depth: usize) {
        let mut owner = PROCESS_CONTEXT
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = owner.as_mut() {
            if current.depth != depth {
                log::warn!(
                    "Scope at depth {depth} released while depth is {}",
                    current.depth
                );
            }
            current.depth = current.depth.saturating_sub(1);
            if current.depth == 0 {
                *owner = None;
            }
        }
    }

    /// Current nesting depth, zero when no scope is active.
    #[must_use]
    pub fn depth() -> usize {
        PROCESS_CONTEXT
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |owner| owner.depth)
    }
}

/// Checks that an environment variable can be set in the process.
///
/// # Errors
///
/// Returns the reason when `name` is empty or contains `=` or NUL, or when
/// `value` contains NUL.
///
/// # Examples
///
/// ```
/// use workdir::scope::check_variable;
///
/// assert!(check_variable("STAGE", "test").is_ok());
/// assert!(check_variable("A=B", "x").is_err());
/// ```
pub fn check_variable(name: &str, value: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("environment variable name is empty".to_string());
    }
    if name.contains(|c| c == '=' || c == '\0') {
        return Err(format!(
            "environment variable name '{}' contains '=' or NUL",
            name.escape_debug()
        ));
    }
    if value.contains('\0') {
        return Err(format!("value of environment variable '{name}' contains NUL"));
    }
    Ok(())
}

/// An active work directory scope.
///
/// Created by [`WorkDir::enter`]. Call [`Scope::exit`] to leave and observe
/// restore errors; dropping the guard restores as well, logging any error.
#[derive(Debug)]
#[must_use = "the scope is left as soon as the guard is dropped"]
pub struct Scope<'a> {
    workdir: &'a WorkDir,
    previous_dir: PathBuf,
    saved_environment: IndexMap<String, Option<OsString>>,
    depth: usize,
    restored: bool,
}

impl<'a> Scope<'a> {
    pub(crate) fn enter(workdir: &'a WorkDir) -> Result<Self> {
        let depth = ProcessContext::acquire()?;
        let previous_dir = match env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                ProcessContext::release(depth);
                return Err(e.into());
            }
        };

        // From here on, an early return drops the guard, which undoes
        // whatever was already changed and releases the context.
        let mut scope = Self {
            workdir,
            previous_dir,
            saved_environment: IndexMap::new(),
            depth,
            restored: false,
        };

        env::set_current_dir(workdir.path())?;
        for (name, value) in workdir.environment() {
            check_variable(name, value).map_err(|reason| Error::Configuration {
                path: workdir.path().to_path_buf(),
                reason,
            })?;
            scope
                .saved_environment
                .entry(name.clone())
                .or_insert_with(|| env::var_os(name));
            env::set_var(name, value);
        }

        log::debug!(
            "Entered {} (depth {depth}, {} variable(s))",
            workdir.path().display(),
            scope.saved_environment.len()
        );
        Ok(scope)
    }

    /// The handle this scope belongs to.
    #[must_use]
    pub const fn workdir(&self) -> &'a WorkDir {
        self.workdir
    }

    /// The working directory that was active before entry.
    #[must_use]
    pub const fn previous_dir(&self) -> &PathBuf {
        &self.previous_dir
    }

    /// Leaves the scope.
    ///
    /// The environment is restored even if the previous working directory
    /// can no longer be entered.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if changing back to the previous working
    /// directory fails.
    pub fn exit(mut self) -> Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        let changed_back = env::set_current_dir(&self.previous_dir);
        for (name, value) in self.saved_environment.drain(..) {
            match value {
                Some(value) => env::set_var(&name, value),
                None => env::remove_var(&name),
            }
        }
        ProcessContext::release(self.depth);

        log::debug!("Left {} (depth {})", self.workdir.path().display(), self.depth);
        changed_back.map_err(Error::from)
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::warn!("Failed to leave {}: {e}", self.workdir.path().display());
        }
    }
}
