//! Builder for [`WorkDir`] handles.
//!
//! Construction resolves the directory, then loads customizations in two
//! passes, each from the most general candidate (nearest the filesystem
//! root) to the most specific (the directory itself):
//!
//! 1. script files (`workdir.js`);
//! 2. config files (`workdir.yml`).
//!
//! A later definition of a name replaces an earlier one, so a child
//! directory overrides its parents and config attributes override script
//! exports of the same name.
//!
//! # Examples
//!
//! ```
//! use workdir::{Recursion, WorkDir};
//!
//! let tmp = tempfile::tempdir().unwrap();
//! std::fs::write(tmp.path().join("workdir.yml"), "attributes:\n  jobs: 4\n").unwrap();
//!
//! let wd = WorkDir::builder(tmp.path())
//!     .config_recursion(Recursion::Levels(0))
//!     .env("MODE", "ci")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(wd.value("jobs"), Some(&serde_json::json!(4)));
//! assert_eq!(wd.environment()["MODE"], "ci");
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::LevelFilter;

use crate::config::ConfigLoader;
use crate::error::{Error, Result};
use crate::handle::WorkDir;
use crate::loader;
use crate::logging::LogSettings;
use crate::path::{locate, resolve_directory, Recursion};
use crate::scope::check_variable;
use crate::script::ScriptHost;

/// Default script file name.
pub const DEFAULT_SCRIPT_FILE: &str = "workdir.js";

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "workdir.yml";

/// Configures and constructs a [`WorkDir`].
#[derive(Debug, Clone)]
pub struct WorkDirBuilder {
    directory: PathBuf,
    create: bool,
    script_files: Vec<String>,
    config_files: Vec<String>,
    script_recursion: Recursion,
    config_recursion: Recursion,
    environment: IndexMap<String, String>,
    log_settings: LogSettings,
}

impl WorkDirBuilder {
    /// Starts a builder for `directory` with default settings.
    #[must_use]
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            create: true,
            script_files: vec![DEFAULT_SCRIPT_FILE.to_string()],
            config_files: vec![DEFAULT_CONFIG_FILE.to_string()],
            script_recursion: Recursion::Unbounded,
            config_recursion: Recursion::Unbounded,
            environment: IndexMap::new(),
            log_settings: LogSettings::default(),
        }
    }

    /// Whether to create the directory if it does not exist (default: yes).
    #[must_use]
    pub const fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Script file names looked up at each level.
    #[must_use]
    pub fn script_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script_files = names.into_iter().map(Into::into).collect();
        self
    }

    /// Config file names looked up at each level.
    #[must_use]
    pub fn config_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_files = names.into_iter().map(Into::into).collect();
        self
    }

    /// How many parent levels to search for script files.
    #[must_use]
    pub const fn script_recursion(mut self, recursion: Recursion) -> Self {
        self.script_recursion = recursion;
        self
    }

    /// How many parent levels to search for config files.
    #[must_use]
    pub const fn config_recursion(mut self, recursion: Recursion) -> Self {
        self.config_recursion = recursion;
        self
    }

    /// Adds an environment variable to overlay. Takes precedence over config
    /// files.
    #[must_use]
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(name.into(), value.into());
        self
    }

    /// Adds several environment variables to overlay.
    #[must_use]
    pub fn environment<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Log file name, relative to the directory (default: `workdir.log`).
    #[must_use]
    pub fn log_file(mut self, name: impl Into<PathBuf>) -> Self {
        self.log_settings.file_name = name.into();
        self
    }

    /// Minimum level printed to stderr by [`WorkDir::log`].
    #[must_use]
    pub const fn console_level(mut self, level: LevelFilter) -> Self {
        self.log_settings.console_level = level;
        self
    }

    /// Minimum level written to the log file by [`WorkDir::log`].
    #[must_use]
    pub const fn file_level(mut self, level: LevelFilter) -> Self {
        self.log_settings.file_level = level;
        self
    }

    /// Constructs the handle.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`](crate::Error::Configuration) if the
    ///   directory is a file or cannot be created, or if an environment
    ///   entry cannot be set in the process;
    /// - [`Error::SourceLoad`](crate::Error::SourceLoad) if a script file
    ///   fails to evaluate;
    /// - [`Error::ConfigParse`](crate::Error::ConfigParse) if a config file
    ///   fails to render or parse.
    pub fn build(self) -> Result<WorkDir> {
        for (name, value) in &self.environment {
            check_variable(name, value).map_err(|reason| Error::Configuration {
                path: self.directory.clone(),
                reason,
            })?;
        }

        let path = resolve_directory(&self.directory, self.create)?;
        log::debug!("Building work directory {}", path.display());

        let script_files = locate(&path, &self.script_files, self.script_recursion);
        let config_files = locate(&path, &self.config_files, self.config_recursion);

        let mut workdir = WorkDir::empty(path, self.log_settings);

        let scripts: Vec<&PathBuf> = script_files.iter().filter(|p| p.is_file()).collect();
        if !scripts.is_empty() {
            let host = ScriptHost::new()?;
            for file in scripts {
                loader::load_script(&mut workdir, &host, file)?;
            }
        }

        let configs: Vec<&PathBuf> = config_files.iter().filter(|p| p.is_file()).collect();
        if !configs.is_empty() {
            let config_loader = ConfigLoader::new()?;
            for file in configs {
                loader::load_config(&mut workdir, &config_loader, file)?;
            }
        }

        workdir.extend_environment(self.environment);
        workdir.set_candidates(script_files, config_files);
        Ok(workdir)
    }
}
