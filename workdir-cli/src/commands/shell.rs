//! Subcommands generated from config `commands` entries.

use crate::error::CliError;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::process;
use workdir::{ShellCommand, WorkDir};

const ARGS: &str = "args";

/// Build the subcommand for a shell command.
pub fn shell_command(name: &str, command: &ShellCommand) -> Command {
    let about = if command.description().is_empty() {
        command.command().to_string()
    } else {
        command.description().to_string()
    };

    Command::new(name.to_string()).about(about).arg(
        Arg::new(ARGS)
            .value_name("ARGS")
            .help("Arguments passed to the command as $1, $2, ...")
            .num_args(0..)
            .action(ArgAction::Append)
            .trailing_var_arg(true)
            .allow_hyphen_values(true),
    )
}

/// Run the command with `sh -c` inside the handle's scope and return the
/// shell's exit code.
pub fn run_shell(
    workdir: &WorkDir,
    name: &str,
    command: &ShellCommand,
    matches: &ArgMatches,
) -> Result<i32, CliError> {
    let args: Vec<&String> = matches
        .get_many::<String>(ARGS)
        .map(Iterator::collect)
        .unwrap_or_default();

    log::debug!("Running '{name}': {}", command.command());

    let status = workdir.scoped(|_| {
        process::Command::new("sh")
            .arg("-c")
            .arg(command.command())
            .arg(name)
            .args(args)
            .status()
            .map_err(CliError::from)
    })?;

    // Killed by a signal: report failure like the shell would.
    Ok(status.code().unwrap_or(1))
}
