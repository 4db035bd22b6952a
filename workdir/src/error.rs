//! Error types for the workdir library.
//!
//! This module provides the error hierarchy for every operation in the
//! workdir library, using `thiserror` for ergonomic error handling.
//! Construction-time failures (`Configuration`, `SourceLoad`, `ConfigParse`)
//! abort construction of a [`WorkDir`](crate::WorkDir) entirely.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a workdir error.
///
/// # Examples
///
/// ```
/// use workdir::{Error, Result};
///
/// fn example_operation() -> Result<usize> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the workdir library.
#[derive(Debug, Error)]
pub enum Error {
    /// The directory could not be set up, e.g. it resolves to a regular file.
    #[error("workdir could not be created at {}: {reason}", path.display())]
    Configuration {
        /// The offending path.
        path: PathBuf,
        /// Why the directory could not be used.
        reason: String,
    },

    /// An invalid filesystem path was provided.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },

    /// A customization source file raised during its top-level evaluation.
    #[error("failed to load {}: {message}", path.display())]
    SourceLoad {
        /// The source file that failed.
        path: PathBuf,
        /// The interpreter's error message, unmodified.
        message: String,
    },

    /// A structured config file failed to render or parse.
    #[error("invalid config file {}: {message}", path.display())]
    ConfigParse {
        /// The config file that failed.
        path: PathBuf,
        /// The renderer's or parser's error message.
        message: String,
    },

    /// A script function failed while it was being called.
    ///
    /// Names a customization function references but never defines surface
    /// here, at call time rather than at load time.
    #[error("error in '{name}': {message}")]
    Script {
        /// The member that was called.
        name: String,
        /// The interpreter's error message, unmodified.
        message: String,
    },

    /// A value could not be converted between Rust and the script engine.
    #[error("type conversion error: {message}")]
    Conversion {
        /// Details of the failed conversion.
        message: String,
    },

    /// No member with the given name is attached to the handle.
    #[error("no member named '{name}'")]
    MemberNotFound {
        /// The requested member name.
        name: String,
    },

    /// The member exists but cannot be called.
    #[error("member '{name}' is not callable")]
    NotCallable {
        /// The member name.
        name: String,
    },

    /// More positional arguments than the function accepts.
    #[error("{function}() takes {expected} positional argument(s) but {given} were given")]
    TooManyArguments {
        /// The function name.
        function: String,
        /// Number of positional parameters accepted.
        expected: usize,
        /// Number of positional arguments supplied.
        given: usize,
    },

    /// A keyword argument that is not part of the visible signature.
    #[error("{function}() got an unexpected argument '{name}'")]
    UnexpectedArgument {
        /// The function name.
        function: String,
        /// The argument name.
        name: String,
    },

    /// The same parameter was supplied positionally and by keyword.
    #[error("{function}() got multiple values for argument '{name}'")]
    DuplicateArgument {
        /// The function name.
        function: String,
        /// The parameter name.
        name: String,
    },

    /// A parameter without a default value was not supplied.
    #[error("{function}() missing required argument '{name}'")]
    MissingArgument {
        /// The function name.
        function: String,
        /// The parameter name.
        name: String,
    },

    /// A parameter named for substitution or as `self` does not exist.
    #[error("{function}() has no parameter '{name}'")]
    UnknownParameter {
        /// The function name.
        function: String,
        /// The parameter name.
        name: String,
    },

    /// A scope was entered while another thread holds the process context.
    #[error("a work directory scope is already active on another thread")]
    ScopeConflict,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The JavaScript grammar used to read parameter lists failed to load.
    #[error("JavaScript grammar error: {message}")]
    Grammar {
        /// The parser's error message.
        message: String,
    },

    /// The embedded script engine reported an error outside of any script.
    #[error("script engine error: {0}")]
    Engine(#[from] rquickjs::Error),
}

impl Error {
    /// Returns true for errors raised while constructing a handle.
    #[must_use]
    pub const fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::SourceLoad { .. } | Self::ConfigParse { .. }
        )
    }
}
