//! Template rendering for structured config files.
//!
//! Config files are liquid templates. Before parsing, each file is rendered
//! with these variables:
//!
//! - `workdir`: the absolute path of the handle's directory
//! - `here`: the absolute path of the directory containing the config file
//! - `env`: the process environment at load time

use std::env;
use std::path::Path;

/// Renders config file text with the work directory variables.
pub struct TemplateRenderer {
    parser: liquid::Parser,
}

impl TemplateRenderer {
    /// Creates a renderer with the liquid standard library of filters.
    ///
    /// # Errors
    ///
    /// Returns the liquid error if the parser cannot be built.
    pub fn new() -> Result<Self, liquid::Error> {
        let parser = liquid::ParserBuilder::with_stdlib().build()?;
        Ok(Self { parser })
    }

    /// Renders `text` for the handle rooted at `workdir`, read from `here`.
    ///
    /// # Errors
    ///
    /// Returns the liquid error if the template is malformed or references
    /// an undefined variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use workdir::config::TemplateRenderer;
    /// use std::path::Path;
    ///
    /// let renderer = TemplateRenderer::new().unwrap();
    /// let text = renderer
    ///     .render("tmp: {{ workdir }}/tmp", Path::new("/w"), Path::new("/"))
    ///     .unwrap();
    /// assert_eq!(text, "tmp: /w/tmp");
    /// ```
    pub fn render(&self, text: &str, workdir: &Path, here: &Path) -> Result<String, liquid::Error> {
        let mut environment = liquid::Object::new();
        for (key, value) in env::vars() {
            environment.insert(key.into(), liquid::model::Value::scalar(value));
        }

        let mut globals = liquid::Object::new();
        globals.insert(
            "workdir".into(),
            liquid::model::Value::scalar(workdir.display().to_string()),
        );
        globals.insert(
            "here".into(),
            liquid::model::Value::scalar(here.display().to_string()),
        );
        globals.insert("env".into(), liquid::model::Value::Object(environment));

        self.parser.parse(text)?.render(&globals)
    }
}
