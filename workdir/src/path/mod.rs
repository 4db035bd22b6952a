//! Path handling for work directories.
//!
//! - [`resolve_directory`] turns a directory argument into the canonical
//!   absolute root of a handle, optionally creating it.
//! - [`locate`] enumerates the layered candidate files for that root, from
//!   the filesystem root down to the directory itself.
//!
//! # Examples
//!
//! ```
//! use workdir::path::{locate, Recursion};
//! use std::path::Path;
//!
//! let candidates = locate(Path::new("/srv/app"), &["workdir.yml"], Recursion::Levels(1));
//! assert_eq!(candidates.len(), 2);
//! assert!(candidates[1].starts_with("/srv/app"));
//! ```

pub mod locate;
pub mod normalize;
pub mod resolver;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use locate::{locate, Recursion};
pub use resolver::resolve_directory;
