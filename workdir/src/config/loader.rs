//! Reading structured config files.

use crate::config::schema::ConfigFile;
use crate::config::template::TemplateRenderer;
use crate::error::{Error, Result};
use crate::scope::check_variable;
use std::fs;
use std::path::Path;

/// Loads structured config files for a work directory.
///
/// # Examples
///
/// ```
/// use workdir::config::ConfigLoader;
///
/// let tmp = tempfile::tempdir().unwrap();
/// let file = tmp.path().join("workdir.yml");
/// std::fs::write(&file, "attributes:\n  dir: \"{{ here }}\"\n").unwrap();
///
/// let loader = ConfigLoader::new().unwrap();
/// let config = loader.load_file(&file, tmp.path()).unwrap();
/// assert_eq!(config.attributes()["dir"], tmp.path().display().to_string());
/// ```
pub struct ConfigLoader {
    renderer: TemplateRenderer,
}

impl ConfigLoader {
    /// Creates a loader with a fresh template renderer.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigParse` if the template engine cannot be set up.
    pub fn new() -> Result<Self> {
        let renderer = TemplateRenderer::new().map_err(|e| Error::ConfigParse {
            path: Path::new("").to_path_buf(),
            message: format!("Cannot initialize template engine: {e}"),
        })?;
        Ok(Self { renderer })
    }

    /// Read, render and parse one config file.
    ///
    /// `workdir` is the root of the handle being constructed; the directory
    /// containing `path` is available to the template as `here`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and
    /// `Error::ConfigParse` if rendering or YAML parsing fails, or if an
    /// `environment` entry cannot be set in the process.
    pub fn load_file(&self, path: &Path, workdir: &Path) -> Result<ConfigFile> {
        let contents = fs::read_to_string(path)?;
        let here = path.parent().unwrap_or(workdir);

        let rendered = self
            .renderer
            .render(&contents, workdir, here)
            .map_err(|e| Error::ConfigParse {
                path: path.to_path_buf(),
                message: format!("Template error: {e}"),
            })?;

        let config = Self::parse(&rendered).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: format!("Invalid YAML: {e}"),
        })?;

        for (name, value) in config.environment() {
            check_variable(&name, &value).map_err(|reason| Error::ConfigParse {
                path: path.to_path_buf(),
                message: reason,
            })?;
        }
        Ok(config)
    }

    /// Parse rendered config text. Blank documents yield an empty config.
    fn parse(rendered: &str) -> std::result::Result<ConfigFile, serde_yaml::Error> {
        if rendered.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        let config: Option<ConfigFile> = serde_yaml::from_str(rendered)?;
        Ok(config.unwrap_or_default())
    }
}
