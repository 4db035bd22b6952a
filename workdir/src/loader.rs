//! Turns customization files into members of a handle.
//!
//! Script exports are filtered before they are attached: names starting
//! with `_` are private, module namespace objects are skipped, and so are
//! functions and classes that merely pass through from an imported module
//! (unless marked with `command()`).
//!
//! A script function's parameters decide how it is adapted:
//!
//! | parameters          | attached as                                    |
//! |---------------------|------------------------------------------------|
//! | `workdir` (+`here`) | method; handle and file directory injected     |
//! | `here`              | function; file directory injected              |
//! | neither             | function                                       |

use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::{ConfigLoader, ShellCommand};
use crate::error::Result;
use crate::handle::WorkDir;
use crate::script::{ExportKind, ScriptExport, ScriptHost};

/// Parameter that receives the handle.
pub const WORKDIR_PARAMETER: &str = "workdir";

/// Parameter that receives the directory of the defining file.
pub const HERE_PARAMETER: &str = "here";

/// Loads the script at `path` and attaches its public exports.
///
/// # Errors
///
/// Returns [`Error::SourceLoad`](crate::Error::SourceLoad) if the script
/// fails to evaluate.
pub fn load_script(workdir: &mut WorkDir, host: &ScriptHost, path: &Path) -> Result<()> {
    let here = path.parent().unwrap_or(path).display().to_string();

    for export in host.load(path)? {
        if !is_attachable(&export) {
            log::debug!("Skipping export '{}' of {}", export.name, path.display());
            continue;
        }

        match export.kind {
            ExportKind::Value(value) => workdir.register_value(export.name, value, path),
            ExportKind::Class(class) => workdir.register_type(export.name, class, path),
            ExportKind::Function(function) => {
                let descriptor = function.descriptor().clone();
                let self_param = descriptor
                    .has_parameter(WORKDIR_PARAMETER)
                    .then_some(WORKDIR_PARAMETER);
                let mut substitutions = IndexMap::new();
                if descriptor.has_parameter(HERE_PARAMETER) {
                    substitutions.insert(HERE_PARAMETER.to_string(), Value::String(here.clone()));
                }
                workdir.register_function(
                    export.name,
                    Rc::new(function),
                    descriptor,
                    self_param,
                    substitutions,
                    path,
                )?;
            }
            ExportKind::Namespace => {}
        }
    }

    Ok(())
}

fn is_attachable(export: &ScriptExport) -> bool {
    if export.name.starts_with('_') {
        return false;
    }
    match &export.kind {
        ExportKind::Namespace => false,
        ExportKind::Function(function) => !export.imported || function.is_marked(),
        ExportKind::Class(_) => !export.imported,
        ExportKind::Value(_) => true,
    }
}

/// Loads the config file at `path` into `workdir`.
///
/// Attributes become value members, environment entries are merged, and
/// each command replaces any earlier command of the same name.
///
/// # Errors
///
/// Returns [`Error::ConfigParse`](crate::Error::ConfigParse) if the file
/// fails to render or parse.
pub fn load_config(workdir: &mut WorkDir, loader: &ConfigLoader, path: &Path) -> Result<()> {
    log::debug!("Loading config {}", path.display());
    let config = loader.load_file(path, workdir.path())?;

    for (name, value) in config.attributes() {
        workdir.register_value(name, value, path);
    }
    workdir.extend_environment(config.environment());
    for (name, definition) in config.commands() {
        workdir.insert_command(name, ShellCommand::new(definition, path));
    }

    Ok(())
}
