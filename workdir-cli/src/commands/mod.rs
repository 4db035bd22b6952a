//! CLI command implementations.
//!
//! The subcommands of `workdir` depend on the directory it is run in, so
//! the command tree is built from the loaded handle:
//! - `show`: built in, prints what the directory defines
//! - one subcommand per script function (see [`function`])
//! - one subcommand per config `commands` entry (see [`shell`])
//!
//! When names collide, the built-in wins over functions, and functions win
//! over shell commands.

pub mod function;
pub mod shell;
pub mod show;

pub use show::ShowCommand;

use crate::error::CliError;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use std::collections::HashSet;
use workdir::{Member, WorkDir};

/// Name of the built-in subcommand.
pub const SHOW: &str = "show";

/// What a subcommand name refers to.
enum Target {
    Show,
    Function,
    Shell,
}

/// Build the second-phase command tree for `workdir`.
pub fn build_command(workdir: &WorkDir) -> Command {
    let mut command = Command::new("workdir")
        .about(format!("Functions and commands defined for {workdir}"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(ShowCommand::augment_args(
            Command::new(SHOW).about("Show what the directory defines"),
        ));

    let mut taken: HashSet<&str> = HashSet::from([SHOW]);

    for (name, member) in workdir.members() {
        let Member::Function(function) = member else {
            continue;
        };
        if !taken.insert(name.as_str()) {
            log::warn!("Function '{name}' is shadowed by a built-in command");
            continue;
        }
        command = command.subcommand(function::function_command(name, function));
    }

    for (name, shell_command) in workdir.commands() {
        if !taken.insert(name.as_str()) {
            log::warn!("Command '{name}' is shadowed by a function or built-in command");
            continue;
        }
        command = command.subcommand(shell::shell_command(name, shell_command));
    }

    command
}

/// Parse `args` (without the program name) against the tree built for
/// `workdir` and run the selected subcommand.
///
/// Returns the process exit code. Usage errors and help requests exit
/// through clap.
pub fn dispatch(workdir: &WorkDir, args: &[String]) -> Result<i32, CliError> {
    let command = build_command(workdir);
    let argv = std::iter::once("workdir".to_string()).chain(args.iter().cloned());
    let matches = command.get_matches_from(argv);

    let Some((name, sub_matches)) = matches.subcommand() else {
        return Err(CliError::InvalidArguments("no command given".to_string()));
    };

    match resolve(workdir, name) {
        Some(Target::Show) => {
            run_show(workdir, sub_matches)?;
            Ok(0)
        }
        Some(Target::Function) => {
            let Some(Member::Function(bound)) = workdir.member(name) else {
                return Err(CliError::InvalidArguments(format!("unknown command '{name}'")));
            };
            function::run_function(workdir, name, bound, sub_matches)?;
            Ok(0)
        }
        Some(Target::Shell) => {
            let shell_command = &workdir.commands()[name];
            shell::run_shell(workdir, name, shell_command, sub_matches)
        }
        None => Err(CliError::InvalidArguments(format!("unknown command '{name}'"))),
    }
}

fn resolve(workdir: &WorkDir, name: &str) -> Option<Target> {
    if name == SHOW {
        return Some(Target::Show);
    }
    if matches!(workdir.member(name), Some(Member::Function(_))) {
        return Some(Target::Function);
    }
    workdir.commands().contains_key(name).then_some(Target::Shell)
}

fn run_show(workdir: &WorkDir, matches: &ArgMatches) -> Result<(), CliError> {
    let command = ShowCommand::from_arg_matches(matches)
        .map_err(|e| CliError::InvalidArguments(e.to_string()))?;
    command.execute(workdir)
}
