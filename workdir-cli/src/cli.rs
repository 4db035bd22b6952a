//! Global CLI structure.
//!
//! Parsing happens in two phases. This module defines the first: the global
//! options that say which directory to open, with everything after them
//! captured untouched. The subcommands only exist once the directory's
//! customization files are loaded (see [`crate::commands`]).

use clap::Parser;
use std::path::PathBuf;

/// Run the functions and commands defined for a directory.
#[derive(Parser, Debug)]
#[command(name = "workdir")]
#[command(version, about = "Run functions and commands defined for a directory", long_about = None)]
#[command(disable_help_flag = true, disable_help_subcommand = true)]
pub struct Cli {
    /// The directory to work in
    #[arg(
        short = 'C',
        long,
        value_name = "PATH",
        default_value = ".",
        env = "WORKDIR_DIRECTORY"
    )]
    pub directory: PathBuf,

    /// Parent levels searched for customization files (negative: all)
    #[arg(
        long,
        value_name = "LEVELS",
        default_value_t = -1,
        allow_negative_numbers = true,
        env = "WORKDIR_RECURSION"
    )]
    pub recursion: i32,

    /// Fail instead of creating a missing directory
    #[arg(long)]
    pub no_create: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long)]
    pub quiet: bool,

    /// The subcommand and its arguments
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub args: Vec<String>,
}
