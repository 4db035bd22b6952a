//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands:
//! opening the work directory from the global options, option naming, and
//! YAML conversion of values in both directions.

use crate::cli::Cli;
use crate::error::CliError;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use workdir::{init_logger, LogLevel, Recursion, WorkDir};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Console verbosity picked from the flags and `WORKDIR_LOG_MODE`.
    pub log_level: LogLevel,

    /// The directory to open.
    pub directory: PathBuf,

    /// Parent levels searched for customization files.
    pub recursion: Recursion,

    /// Create the directory if it does not exist.
    pub create: bool,
}

impl From<&Cli> for GlobalOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            log_level: init_logger(cli.verbose, cli.quiet),
            directory: cli.directory.clone(),
            recursion: Recursion::from(cli.recursion),
            create: !cli.no_create,
        }
    }
}

/// Open the work directory described by the global options.
///
/// Script and config files share the same recursion depth on the command
/// line.
pub fn open_workdir(global: &GlobalOptions) -> Result<WorkDir, CliError> {
    log::debug!(
        "Opening {} (recursion {})",
        global.directory.display(),
        global.recursion
    );

    WorkDir::builder(&global.directory)
        .create(global.create)
        .script_recursion(global.recursion)
        .config_recursion(global.recursion)
        .console_level(global.log_level.console_filter())
        .build()
        .map_err(CliError::from)
}

/// The long option name for a parameter: underscores become dashes and
/// leading ones are dropped, since clap adds the `--` itself.
pub fn option_name(parameter: &str) -> String {
    let name = parameter.replace('_', "-");
    match name.trim_start_matches('-') {
        "" => "arg".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Parse a command-line value as a YAML scalar.
///
/// Text that is not valid YAML is passed through as a string.
pub fn parse_value(text: &str) -> Value {
    serde_yaml::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Render a value as a YAML document.
pub fn to_yaml<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_yaml::to_string(value).map_err(CliError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_name() {
        assert_eq!(option_name("dry_run"), "dry-run");
        assert_eq!(option_name("name"), "name");
        assert_eq!(option_name("_private"), "private");
        assert_eq!(option_name("__"), "arg");
    }

    #[test]
    fn test_parse_value_scalars() {
        assert_eq!(parse_value("5"), json!(5));
        assert_eq!(parse_value("2.5"), json!(2.5));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("null"), json!(null));
        assert_eq!(parse_value("hello"), json!("hello"));
        assert_eq!(parse_value("'5'"), json!("5"));
    }

    #[test]
    fn test_parse_value_falls_back_to_text() {
        assert_eq!(parse_value("a: b: c"), json!("a: b: c"));
    }

    #[test]
    fn test_to_yaml() {
        let yaml = to_yaml(&json!({"answer": 42})).unwrap();
        assert_eq!(yaml, "answer: 42\n");
    }
}
