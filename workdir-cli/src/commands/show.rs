//! Built-in `show` command.
//!
//! Prints what a directory defines as one YAML document. Each flag selects a
//! section; with no flags every section is printed.

use crate::error::CliError;
use crate::utils::to_yaml;
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use workdir::{Member, WorkDir};

/// Show the variables, functions and commands defined for the directory.
#[derive(Args, Debug, Default)]
pub struct ShowCommand {
    /// Show value members
    #[arg(long)]
    pub variables: bool,

    /// Show functions and classes with their parameters
    #[arg(long)]
    pub functions: bool,

    /// Show the file each member was defined in
    #[arg(long)]
    pub sources: bool,

    /// Show the environment overlay
    #[arg(long)]
    pub environment: bool,

    /// Show shell commands
    #[arg(long)]
    pub commands: bool,
}

/// A callable member as printed by `show`.
#[derive(Debug, Serialize)]
struct FunctionInfo {
    kind: &'static str,
    parameters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

/// A shell command as printed by `show`.
#[derive(Debug, Serialize)]
struct CommandInfo {
    command: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
}

/// The document printed by `show`. Unselected sections are omitted.
#[derive(Debug, Default, Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<BTreeMap<String, FunctionInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commands: Option<BTreeMap<String, CommandInfo>>,
}

impl ShowCommand {
    pub fn execute(self, workdir: &WorkDir) -> Result<(), CliError> {
        print!("{}", to_yaml(&self.report(workdir))?);
        Ok(())
    }

    fn all(&self) -> bool {
        !(self.variables || self.functions || self.sources || self.environment || self.commands)
    }

    fn report(&self, workdir: &WorkDir) -> Report {
        let all = self.all();
        let mut report = Report::default();

        if all || self.variables {
            report.variables = Some(
                workdir
                    .members()
                    .iter()
                    .filter_map(|(name, member)| member.as_value().map(|v| (name.clone(), v.clone())))
                    .collect(),
            );
        }

        if all || self.functions {
            report.functions = Some(
                workdir
                    .members()
                    .iter()
                    .filter_map(|(name, member)| function_info(member).map(|f| (name.clone(), f)))
                    .collect(),
            );
        }

        if all || self.sources {
            report.sources = Some(
                workdir
                    .attributes()
                    .iter()
                    .map(|(name, path)| (name.to_string(), path.display().to_string()))
                    .collect(),
            );
        }

        if all || self.environment {
            report.environment = Some(
                workdir
                    .environment()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            );
        }

        if all || self.commands {
            report.commands = Some(
                workdir
                    .commands()
                    .iter()
                    .map(|(name, command)| {
                        let info = CommandInfo {
                            command: command.command().to_string(),
                            description: command.description().to_string(),
                        };
                        (name.clone(), info)
                    })
                    .collect(),
            );
        }

        report
    }
}

fn function_info(member: &Member) -> Option<FunctionInfo> {
    match member {
        Member::Value(_) => None,
        Member::Function(function) => Some(FunctionInfo {
            kind: member.kind(),
            parameters: function.signature().map(|p| p.name().to_string()).collect(),
            help: function
                .descriptor()
                .command()
                .and_then(|spec| spec.help.clone()),
        }),
        Member::Type(class) => Some(FunctionInfo {
            kind: member.kind(),
            parameters: class
                .descriptor()
                .parameters()
                .iter()
                .map(|p| p.name().to_string())
                .collect(),
            help: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;
    use std::rc::Rc;
    use workdir::{Argument, Callable, FunctionDescriptor, NativeFunction, Parameter};

    fn sample(dir: &std::path::Path) -> WorkDir {
        let mut wd = WorkDir::new(dir).unwrap();
        let source = dir.join("workdir.js");
        wd.register_value("jobs", json!(4), &source);

        let callable: Rc<dyn Callable> = Rc::new(NativeFunction::new(
            |_: &WorkDir, _: &[Argument]| Ok(Value::Null),
        ));
        let descriptor = FunctionDescriptor::new(
            "build",
            vec![Parameter::required("target"), Parameter::required("workdir")],
        );
        wd.register_function("build", callable, descriptor, Some("workdir"), IndexMap::new(), &source)
            .unwrap();
        wd
    }

    #[test]
    fn test_no_flags_selects_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let wd = sample(tmp.path());
        let report = ShowCommand::default().report(&wd);

        assert!(report.variables.is_some());
        assert!(report.functions.is_some());
        assert!(report.sources.is_some());
        assert!(report.environment.is_some());
        assert!(report.commands.is_some());
    }

    #[test]
    fn test_single_section() {
        let tmp = tempfile::tempdir().unwrap();
        let wd = sample(tmp.path());
        let command = ShowCommand {
            functions: true,
            ..ShowCommand::default()
        };
        let report = command.report(&wd);

        assert!(report.variables.is_none());
        let functions = report.functions.unwrap();
        assert_eq!(functions["build"].parameters, ["target"]);
        assert_eq!(functions["build"].kind, "function");

        let yaml = to_yaml(&command.report(&wd)).unwrap();
        assert!(yaml.starts_with("functions:"));
        assert!(!yaml.contains("jobs"));
    }
}
