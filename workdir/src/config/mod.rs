//! Structured config files (`workdir.yml`).
//!
//! Each file is rendered as a liquid template and then parsed as YAML. The
//! recognised keys are `attributes`, `environment` and `commands`; see
//! [`ConfigFile`].
//!
//! # Examples
//!
//! ```
//! use workdir::config::ConfigLoader;
//!
//! let tmp = tempfile::tempdir().unwrap();
//! let file = tmp.path().join("workdir.yml");
//! std::fs::write(&file, "environment:\n  FOO: BAR\n").unwrap();
//!
//! let config = ConfigLoader::new().unwrap().load_file(&file, tmp.path()).unwrap();
//! assert_eq!(config.environment()["FOO"], "BAR");
//! ```

pub mod loader;
pub mod schema;
pub mod template;

pub use loader::ConfigLoader;
pub use schema::{ConfigFile, ShellCommand};
pub use template::TemplateRenderer;
