#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # workdir
//!
//! Directory-scoped configuration and extension.
//!
//! A [`WorkDir`] is a handle to a directory that
//!
//! - changes the process working directory to it for the duration of a
//!   scope, and restores it afterwards;
//! - overlays environment variables for the duration of a scope;
//! - picks up functions, values and classes from `workdir.js` and
//!   `workdir.yml` files in the directory and its ancestors, with files
//!   closer to the directory overriding those further up.
//!
//! ## Core Types
//!
//! - [`WorkDir`] and [`WorkDirBuilder`]: the handle and its configuration
//! - [`Member`], [`BoundFunction`] and [`FunctionDescriptor`]: what a handle
//!   exposes and how functions are called
//! - [`Scope`]: an active working directory and environment overlay
//! - [`AttributeRegistry`]: which file defined each member
//! - [`Error`] and [`Result`]: error handling types
//! - [`LogLevel`] and [`LogSink`]: logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use indexmap::IndexMap;
//! use serde_json::json;
//! use workdir::WorkDir;
//!
//! let tmp = tempfile::tempdir().unwrap();
//! std::fs::write(
//!     tmp.path().join("workdir.js"),
//!     "export function double(n, workdir) { return n * 2; }\n",
//! )
//! .unwrap();
//!
//! let wd = WorkDir::new(tmp.path()).unwrap();
//! assert_eq!(wd.call("double", vec![json!(5)], IndexMap::new()).unwrap(), json!(10));
//! ```

pub mod adapter;
pub mod builder;
pub mod config;
pub mod error;
pub mod handle;
pub mod loader;
pub mod logging;
pub mod member;
pub mod path;
pub mod registry;
pub mod scope;
pub mod script;

// Re-export key types at crate root for convenience
pub use adapter::BoundFunction;
pub use builder::WorkDirBuilder;
pub use config::{ConfigFile, ShellCommand};
pub use error::{Error, Result};
pub use handle::{Files, WorkDir};
pub use logging::{init_logger, LazySink, LogLevel, LogSettings, LogSink};
pub use member::{
    Argument, Callable, CommandSpec, FunctionDescriptor, Member, NativeFunction, OptionSpec,
    ParamDefault, Parameter,
};
pub use path::Recursion;
pub use registry::AttributeRegistry;
pub use scope::{ProcessContext, Scope};
pub use script::{ScriptClass, ScriptFunction};
