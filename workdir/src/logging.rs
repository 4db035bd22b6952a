//! Logging infrastructure for work directories.
//!
//! Two pieces live here:
//!
//! - [`LogLevel`] and [`init_logger`], which pick the console verbosity from
//!   command-line flags and the `WORKDIR_LOG_MODE` environment variable.
//! - [`LogSink`], the per-handle sink behind [`WorkDir::log`](crate::WorkDir::log).
//!   It writes every message to stderr and to a log file inside the work
//!   directory, each with its own minimum level. [`LazySink`] opens it on
//!   first use and can be shared with script host functions.

use std::cell::RefCell;
use std::env;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{Level, LevelFilter};

use crate::error::Result;

/// Default name of the log file inside a work directory.
pub const DEFAULT_LOG_FILE: &str = "workdir.log";

/// Console verbosity selected on the command line.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose (Verbose).
///
/// # Examples
///
/// ```
/// use workdir::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Suppress all console log output.
    Quiet,
    /// Informational messages and above.
    Normal,
    /// Everything, including debug messages.
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use workdir::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("invalid").is_err());
    /// ```
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }

    /// The console threshold this verbosity corresponds to.
    #[must_use]
    pub const fn console_filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Off,
            Self::Normal => LevelFilter::Info,
            Self::Verbose => LevelFilter::Debug,
        }
    }
}

/// Picks the console verbosity from CLI flags and the environment.
///
/// The priority order is:
/// 1. CLI flags (verbose/quiet, verbose wins if both are set)
/// 2. `WORKDIR_LOG_MODE` environment variable
/// 3. Default (Normal)
///
/// # Examples
///
/// ```
/// use workdir::{init_logger, LogLevel};
///
/// assert_eq!(init_logger(true, false), LogLevel::Verbose);
/// assert_eq!(init_logger(false, true), LogLevel::Quiet);
/// ```
#[must_use]
pub fn init_logger(verbose: bool, quiet: bool) -> LogLevel {
    if verbose {
        return LogLevel::Verbose;
    }
    if quiet {
        return LogLevel::Quiet;
    }

    if let Ok(env_value) = env::var("WORKDIR_LOG_MODE") {
        if let Ok(level) = LogLevel::parse(&env_value) {
            return level;
        }
    }

    LogLevel::Normal
}

/// Settings for a handle's log sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Log file name, relative to the work directory.
    pub file_name: PathBuf,
    /// Minimum level printed to stderr.
    pub console_level: LevelFilter,
    /// Minimum level appended to the log file.
    pub file_level: LevelFilter,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file_name: PathBuf::from(DEFAULT_LOG_FILE),
            console_level: LevelFilter::Info,
            file_level: LevelFilter::Debug,
        }
    }
}

/// A console plus file log sink for one work directory.
///
/// Created lazily by the handle on first use; the log file is opened in
/// append mode at that point.
#[derive(Debug)]
pub struct LogSink {
    file: File,
    file_path: PathBuf,
    console_level: LevelFilter,
    file_level: LevelFilter,
}

impl LogSink {
    /// Opens the sink for the work directory at `directory`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the log file cannot be opened.
    pub fn open(directory: &Path, settings: &LogSettings) -> Result<Self> {
        let file_path = directory.join(&settings.file_name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        Ok(Self {
            file,
            file_path,
            console_level: settings.console_level,
            file_level: settings.file_level,
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Writes `message` to every output whose threshold admits `level`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the log file cannot be written.
    pub fn log(&mut self, message: &str, level: Level) -> Result<()> {
        if level <= self.console_level {
            eprintln!("{message}");
        }
        if level <= self.file_level {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
            writeln!(self.file, "{timestamp} - {level} - {message}")?;
        }
        Ok(())
    }
}

/// A [`LogSink`] that is opened on first use. Clones share one sink.
#[derive(Debug, Clone)]
pub struct LazySink {
    directory: PathBuf,
    settings: LogSettings,
    sink: Rc<RefCell<Option<LogSink>>>,
}

impl LazySink {
    /// A sink for the work directory at `directory`, not yet opened.
    #[must_use]
    pub fn new(directory: PathBuf, settings: LogSettings) -> Self {
        Self {
            directory,
            settings,
            sink: Rc::new(RefCell::new(None)),
        }
    }

    /// Path of the log file.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(&self.settings.file_name)
    }

    /// Returns true once the log file has been opened.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.sink.borrow().is_some()
    }

    /// Writes `message`, opening the log file if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the log file cannot be opened or written.
    pub fn log(&self, message: &str, level: Level) -> Result<()> {
        let mut sink = self.sink.borrow_mut();
        if sink.is_none() {
            *sink = Some(LogSink::open(&self.directory, &self.settings)?);
        }
        match sink.as_mut() {
            Some(sink) => sink.log(message, level),
            None => Ok(()),
        }
    }

    /// Writes `message` only if the log file is already open.
    pub fn log_if_open(&self, message: &str, level: Level) {
        if let Some(sink) = self.sink.borrow_mut().as_mut() {
            if let Err(e) = sink.log(message, level) {
                log::warn!("Failed to write log file: {e}");
            }
        }
    }
}
