//! Structured config file schema.
//!
//! A `workdir.yml` file may contain three optional top-level keys:
//!
//! ```yaml
//! attributes:
//!   my_number: 1
//!   my_tmpdir: "{{ here }}/tmpdir"
//! environment:
//!   VAR_ONE: "a"
//! commands:
//!   hello: "echo hello // Say hello"
//! ```
//!
//! Any other key is ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Token separating the shell text of a command from its description.
pub const COMMAND_SEPARATOR: &str = "//";

/// The parsed contents of one structured config file.
///
/// # Examples
///
/// ```
/// use workdir::config::ConfigFile;
///
/// let config: ConfigFile = serde_yaml::from_str("attributes:\n  n: 5\n").unwrap();
/// assert_eq!(config.attributes()["n"], serde_json::json!(5));
/// assert!(config.environment().is_empty());
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ConfigFile {
    /// Values attached to the handle as members.
    attributes: Option<IndexMap<String, serde_json::Value>>,

    /// Environment variables overlaid while the handle's scope is active.
    environment: Option<IndexMap<String, serde_json::Value>>,

    /// Shell commands, each `"<shell text> // <description>"`.
    commands: Option<IndexMap<String, String>>,
}

impl ConfigFile {
    /// Attribute entries in file order.
    #[must_use]
    pub fn attributes(&self) -> IndexMap<String, serde_json::Value> {
        self.attributes.clone().unwrap_or_default()
    }

    /// Environment entries in file order, values stringified.
    #[must_use]
    pub fn environment(&self) -> IndexMap<String, String> {
        self.environment
            .iter()
            .flatten()
            .map(|(name, value)| (name.clone(), stringify(value)))
            .collect()
    }

    /// Command definitions in file order, exactly as written.
    #[must_use]
    pub fn commands(&self) -> IndexMap<String, String> {
        self.commands.clone().unwrap_or_default()
    }
}

/// Converts an environment value to the string that is exported.
///
/// Strings are used verbatim, `null` becomes the empty string, and any other
/// value uses its JSON representation.
///
/// # Examples
///
/// ```
/// use workdir::config::schema::stringify;
/// use serde_json::json;
///
/// assert_eq!(stringify(&json!("BAR")), "BAR");
/// assert_eq!(stringify(&json!(42)), "42");
/// assert_eq!(stringify(&json!(true)), "true");
/// ```
#[must_use]
pub fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A shell command defined under the `commands` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellCommand {
    definition: String,
    source: PathBuf,
}

impl ShellCommand {
    /// Wraps a command definition read from `source`.
    #[must_use]
    pub fn new(definition: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            definition: definition.into(),
            source: source.into(),
        }
    }

    /// The definition exactly as written in the config file.
    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// The config file that defined this command.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The shell text, i.e. everything before the last separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use workdir::config::ShellCommand;
    ///
    /// let cmd = ShellCommand::new("curl http://example.com // Fetch the page", "/w.yml");
    /// assert_eq!(cmd.command(), "curl http://example.com");
    /// assert_eq!(cmd.description(), "Fetch the page");
    /// ```
    #[must_use]
    pub fn command(&self) -> &str {
        self.split().0
    }

    /// The human-readable description after the last separator, if any.
    #[must_use]
    pub fn description(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        match self.definition.rsplit_once(COMMAND_SEPARATOR) {
            Some((command, description)) => (command.trim(), description.trim()),
            None => (self.definition.trim(), ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_all_keys() {
        let yaml = r#"
attributes:
  my_number: 1
  my_list: [1, 2, 3]
environment:
  VAR_ONE: a
  VAR_TWO: 2
commands:
  hello: "echo hello // Say hello"
"#;
        let config: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.attributes()["my_list"], json!([1, 2, 3]));
        assert_eq!(config.environment()["VAR_TWO"], "2");
        assert_eq!(config.commands()["hello"], "echo hello // Say hello");
    }

    #[test]
    fn test_empty_sections() {
        let config: ConfigFile = serde_yaml::from_str("attributes:\nenvironment:\n").unwrap();
        assert!(config.attributes().is_empty());
        assert!(config.environment().is_empty());
        assert!(config.commands().is_empty());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config: ConfigFile = serde_yaml::from_str("something_else: 3\n").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_attribute_order_preserved() {
        let config: ConfigFile = serde_yaml::from_str("attributes:\n  z: 1\n  a: 2\n").unwrap();
        let names: Vec<_> = config.attributes().keys().cloned().collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn test_command_without_description() {
        let cmd = ShellCommand::new("  ls -la  ", "/w.yml");
        assert_eq!(cmd.command(), "ls -la");
        assert_eq!(cmd.description(), "");
        assert_eq!(cmd.definition(), "  ls -la  ");
    }

    #[test]
    fn test_stringify_null_and_structures() {
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!([1, 2])), "[1,2]");
    }
}
