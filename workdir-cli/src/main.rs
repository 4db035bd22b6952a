//! Main entry point for the workdir CLI.
//!
//! The command line is parsed in two phases:
//! - global options (`-C`, `--recursion`, `--no-create`, `--verbose`,
//!   `--quiet`) select and open the work directory;
//! - the rest is parsed against subcommands built from what that directory
//!   defines: its script functions, its shell commands, and `show`.

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use error::CliError;
use utils::{open_workdir, GlobalOptions};

fn run(cli: &Cli) -> Result<i32, CliError> {
    let global = GlobalOptions::from(cli);
    let workdir = open_workdir(&global)?;
    commands::dispatch(&workdir, &cli.args)
}

fn main() {
    // Parse global options; everything else is parsed once the directory
    // is loaded.
    let cli = Cli::parse();

    // Handle errors and set exit code
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
