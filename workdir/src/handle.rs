//! The work directory handle.

use std::fmt;
use std::fs::{self, ReadDir};
use std::ops::Div;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use log::Level;
use serde_json::{json, Value};

use crate::adapter::BoundFunction;
use crate::builder::WorkDirBuilder;
use crate::config::ShellCommand;
use crate::error::{Error, Result};
use crate::logging::{LazySink, LogSettings};
use crate::member::{Callable, FunctionDescriptor, Member};
use crate::registry::AttributeRegistry;
use crate::scope::Scope;
use crate::script::ScriptClass;

/// A handle to a directory, carrying everything its customization files
/// define.
///
/// Constructing a handle resolves the directory, then loads `workdir.js`
/// and `workdir.yml` files from it and its ancestors (see
/// [`WorkDirBuilder`]). Construction never changes the working directory
/// or the environment; [`WorkDir::enter`] and [`WorkDir::scoped`] do.
///
/// # Examples
///
/// ```
/// use workdir::WorkDir;
///
/// let tmp = tempfile::tempdir().unwrap();
/// let wd = WorkDir::new(tmp.path().join("build")).unwrap();
///
/// assert!(wd.path().is_dir());
/// assert_eq!(&wd / "out.txt", wd.path().join("out.txt"));
/// assert!(wd.is_empty().unwrap());
/// ```
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    members: IndexMap<String, Member>,
    registry: AttributeRegistry,
    environment: IndexMap<String, String>,
    commands: IndexMap<String, ShellCommand>,
    script_files: Vec<PathBuf>,
    config_files: Vec<PathBuf>,
    sink: LazySink,
}

impl WorkDir {
    /// Opens `directory` with default settings, creating it if needed.
    ///
    /// # Errors
    ///
    /// See [`WorkDirBuilder::build`].
    pub fn new(directory: impl AsRef<Path>) -> Result<Self> {
        Self::builder(directory).build()
    }

    /// Starts configuring a handle for `directory`.
    #[must_use]
    pub fn builder(directory: impl AsRef<Path>) -> WorkDirBuilder {
        WorkDirBuilder::new(directory)
    }

    pub(crate) fn empty(path: PathBuf, log_settings: LogSettings) -> Self {
        let sink = LazySink::new(path.clone(), log_settings);
        Self {
            path,
            members: IndexMap::new(),
            registry: AttributeRegistry::new(),
            environment: IndexMap::new(),
            commands: IndexMap::new(),
            script_files: Vec::new(),
            config_files: Vec::new(),
            sink,
        }
    }

    /// The absolute, canonical directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `path` joined with `name`.
    #[must_use]
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Number of entries directly inside the directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be listed.
    pub fn len(&self) -> Result<usize> {
        count_entries(&self.path)
    }

    /// Returns true if the directory has no entries.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be listed.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(fs::read_dir(&self.path)?.next().is_none())
    }

    /// Lazily lists the regular files directly inside the directory.
    ///
    /// Yields bare file names, or absolute paths when `absolute` is set.
    /// Subdirectories are skipped. Call again to restart.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be listed.
    pub fn files(&self, absolute: bool) -> Result<Files> {
        Files::open(&self.path, absolute)
    }

    /// Looks up a member.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// All members in definition order.
    #[must_use]
    pub const fn members(&self) -> &IndexMap<String, Member> {
        &self.members
    }

    /// The data of a value member.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.member(name).and_then(Member::as_value)
    }

    /// Returns true if `name` is a function or class member.
    #[must_use]
    pub fn is_callable(&self, name: &str) -> bool {
        self.member(name).is_some_and(Member::is_callable)
    }

    /// Calls the member `name`.
    ///
    /// Functions go through the method adapter; classes are instantiated
    /// with the positional arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemberNotFound`] or [`Error::NotCallable`] if `name`
    /// cannot be called, an argument error if the arguments do not fit, or
    /// whatever the function raises.
    pub fn call(
        &self,
        name: &str,
        positional: Vec<Value>,
        keywords: IndexMap<String, Value>,
    ) -> Result<Value> {
        match self.member(name) {
            None => Err(Error::MemberNotFound {
                name: name.to_string(),
            }),
            Some(Member::Value(_)) => Err(Error::NotCallable {
                name: name.to_string(),
            }),
            Some(Member::Function(function)) => function.call(self, positional, keywords),
            Some(Member::Type(class)) => match keywords.into_keys().next() {
                Some(keyword) => Err(Error::UnexpectedArgument {
                    function: name.to_string(),
                    name: keyword,
                }),
                None => class.instantiate(positional),
            },
        }
    }

    /// Attaches a value member defined by `source`.
    pub fn register_value(&mut self, name: impl Into<String>, value: Value, source: &Path) {
        self.install(name.into(), Member::Value(value), source);
    }

    /// Adapts `callable` and attaches it as a function member defined by
    /// `source`.
    ///
    /// The handle is passed as `self_param` on every call, and each
    /// substitution is passed for its parameter; neither appears in the
    /// function's signature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameter`] if `self_param` or a
    /// substitution does not name a parameter of `descriptor`.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        callable: Rc<dyn Callable>,
        descriptor: FunctionDescriptor,
        self_param: Option<&str>,
        substitutions: IndexMap<String, Value>,
        source: &Path,
    ) -> Result<()> {
        let name = name.into();
        let bound = BoundFunction::adapt(name.as_str(), callable, descriptor, self_param, substitutions)?;
        self.install(name, Member::Function(bound), source);
        Ok(())
    }

    pub(crate) fn register_type(&mut self, name: String, class: ScriptClass, source: &Path) {
        self.install(name, Member::Type(class), source);
    }

    fn install(&mut self, name: String, member: Member, source: &Path) {
        log::debug!("Attaching {} '{name}' from {}", member.kind(), source.display());
        self.registry.record(name.as_str(), source);
        self.members.insert(name, member);
    }

    /// Where each custom member was defined.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeRegistry {
        &self.registry
    }

    /// Variables overlaid while the handle is entered.
    #[must_use]
    pub const fn environment(&self) -> &IndexMap<String, String> {
        &self.environment
    }

    pub(crate) fn extend_environment(&mut self, entries: impl IntoIterator<Item = (String, String)>) {
        self.environment.extend(entries);
    }

    /// Shell commands from config files.
    #[must_use]
    pub const fn commands(&self) -> &IndexMap<String, ShellCommand> {
        &self.commands
    }

    pub(crate) fn insert_command(&mut self, name: String, command: ShellCommand) {
        self.commands.insert(name, command);
    }

    /// Candidate script files, general to specific. They need not exist.
    #[must_use]
    pub fn script_files(&self) -> &[PathBuf] {
        &self.script_files
    }

    /// Candidate config files, general to specific. They need not exist.
    #[must_use]
    pub fn config_files(&self) -> &[PathBuf] {
        &self.config_files
    }

    pub(crate) fn set_candidates(&mut self, script_files: Vec<PathBuf>, config_files: Vec<PathBuf>) {
        self.script_files = script_files;
        self.config_files = config_files;
    }

    /// Path of the log file.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.sink.file_path()
    }

    /// Logs `message` to stderr and the log file.
    ///
    /// The log file is opened on first use.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the log file cannot be opened or written.
    pub fn log(&self, message: &str, level: Level) -> Result<()> {
        self.sink.log(message, level)
    }

    /// The handle's log sink. Clones write to the same file.
    #[must_use]
    pub fn log_sink(&self) -> &LazySink {
        &self.sink
    }

    /// Enters the directory: changes the working directory to `path` and
    /// overlays the environment until the returned guard is dropped or
    /// exited.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScopeConflict`] if another thread holds a scope, or
    /// an I/O error if the directory cannot be entered.
    pub fn enter(&self) -> Result<Scope<'_>> {
        Scope::enter(self)
    }

    /// Runs `f` inside the directory's scope.
    ///
    /// State is restored before returning. An error from `f` is written to
    /// the log sink if it is already open, then returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or an error entering or leaving the scope.
    ///
    /// # Examples
    ///
    /// ```
    /// use workdir::WorkDir;
    ///
    /// let tmp = tempfile::tempdir().unwrap();
    /// let wd = WorkDir::new(tmp.path()).unwrap();
    ///
    /// let inside = wd
    ///     .scoped(|_| Ok::<_, workdir::Error>(std::env::current_dir()?))
    ///     .unwrap();
    /// assert_eq!(inside, wd.path());
    /// ```
    pub fn scoped<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Self) -> std::result::Result<T, E>,
        E: From<Error> + fmt::Display,
    {
        let scope = self.enter()?;
        let result = f(self);
        let exited = scope.exit();

        match result {
            Err(error) => {
                if let Err(exit_error) = exited {
                    log::warn!("Failed to leave {}: {exit_error}", self.path.display());
                }
                self.sink.log_if_open(&error.to_string(), Level::Error);
                Err(error)
            }
            Ok(value) => {
                exited?;
                Ok(value)
            }
        }
    }

    /// JSON view of the handle given to script functions.
    pub(crate) fn snapshot(&self) -> Value {
        let attributes: serde_json::Map<String, Value> = self
            .members
            .iter()
            .filter_map(|(name, member)| member.as_value().map(|v| (name.clone(), v.clone())))
            .collect();

        json!({
            "path": self.path.display().to_string(),
            "attributes": attributes,
            "environment": self.environment,
        })
    }
}

impl fmt::Display for WorkDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl<P: AsRef<Path>> Div<P> for &WorkDir {
    type Output = PathBuf;

    fn div(self, name: P) -> PathBuf {
        self.join(name)
    }
}

pub(crate) fn count_entries(directory: &Path) -> Result<usize> {
    Ok(fs::read_dir(directory)?.count())
}

/// Iterator over the regular files of a directory. See [`WorkDir::files`].
#[derive(Debug)]
pub struct Files {
    entries: ReadDir,
    absolute: bool,
}

impl Files {
    pub(crate) fn open(directory: &Path, absolute: bool) -> Result<Self> {
        Ok(Self {
            entries: fs::read_dir(directory)?,
            absolute,
        })
    }
}

impl Iterator for Files {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.path().is_file() {
                continue;
            }
            return Some(if self.absolute {
                entry.path()
            } else {
                PathBuf::from(entry.file_name())
            });
        }
        None
    }
}
