//! Module resolution for script imports.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use rquickjs::loader::Resolver;
use rquickjs::Ctx;

/// Resolves import specifiers against the importing file's directory.
///
/// `./lib.js`, `../lib.js` and bare `lib.js` are all relative to the
/// directory of the importing module; absolute paths are used as given.
/// Imports are not confined to any directory.
///
/// Every resolved module name is recorded so the host can later tell which
/// exports of a file were defined elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    resolved: Rc<RefCell<Vec<String>>>,
}

impl ImportResolver {
    /// Creates a resolver with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the resolved module names.
    #[must_use]
    pub fn record(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.resolved)
    }
}

impl Resolver for ImportResolver {
    fn resolve<'js>(&mut self, _ctx: &Ctx<'js>, base: &str, name: &str) -> rquickjs::Result<String> {
        let requested = Path::new(name);
        let candidate = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            Path::new(base)
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(requested)
        };

        let resolved = candidate
            .canonicalize()
            .map_err(|_| rquickjs::Error::new_resolving(base, name))?
            .to_string_lossy()
            .into_owned();

        log::debug!("Resolved import '{name}' from {base} to {resolved}");
        self.resolved.borrow_mut().push(resolved.clone());
        Ok(resolved)
    }
}
