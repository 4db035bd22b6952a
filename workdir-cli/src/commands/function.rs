//! Subcommands generated from script functions.
//!
//! Each visible parameter of a function becomes a `--long` option, and a
//! rest parameter becomes trailing positional arguments. Help text and
//! short flags come from the function's `command(fn, spec)` marker when it
//! has one.

use crate::error::CliError;
use crate::utils::{option_name, parse_value, to_yaml};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use workdir::{BoundFunction, Parameter, WorkDir};

/// Build the subcommand for `function`.
pub fn function_command(name: &str, function: &BoundFunction) -> Command {
    let spec = function.descriptor().command();
    let about = spec
        .and_then(|s| s.help.clone())
        .unwrap_or_else(|| format!("Call the function '{name}'"));

    let mut command = Command::new(name.to_string()).about(about);
    let mut shorts = HashSet::new();
    let mut longs = HashSet::new();

    for parameter in function.signature() {
        let option = spec.and_then(|s| s.options.get(parameter.name()));
        let mut arg = Arg::new(parameter.name().to_string()).value_name(parameter.name().to_uppercase());

        if parameter.is_variadic() {
            arg = arg.num_args(0..).action(ArgAction::Append).allow_hyphen_values(true);
        } else {
            let mut long = option_name(parameter.name());
            let base = long.clone();
            let mut suffix = 1;
            while !longs.insert(long.clone()) {
                suffix += 1;
                long = format!("{base}-{suffix}");
            }
            if long != base {
                log::warn!("'{name}': option --{base} is already taken, using --{long}");
            }
            if long == "help" {
                command = command.disable_help_flag(true);
            }
            arg = arg.long(long).required(!parameter.has_default());

            if let Some(short) = option.and_then(|o| o.short) {
                if shorts.insert(short) {
                    if short == 'h' {
                        command = command.disable_help_flag(true);
                    }
                    arg = arg.short(short);
                } else {
                    log::warn!("'{name}': short flag -{short} is already taken");
                }
            }
        }

        if let Some(help) = option.and_then(|o| o.help.clone()) {
            arg = arg.help(help);
        }

        command = command.arg(arg);
    }

    command
}

/// Call `name` with the values parsed from `matches`, inside the handle's
/// scope, and print a non-null result as YAML.
pub fn run_function(
    workdir: &WorkDir,
    name: &str,
    function: &BoundFunction,
    matches: &ArgMatches,
) -> Result<(), CliError> {
    let (positional, keywords) = collect_arguments(function, matches)?;
    log::debug!(
        "Calling '{name}' with {} positional and {} keyword argument(s)",
        positional.len(),
        keywords.len()
    );

    let result = workdir.scoped(|wd| wd.call(name, positional, keywords).map_err(CliError::from))?;

    if !result.is_null() {
        print!("{}", to_yaml(&result)?);
    }
    Ok(())
}

/// Split the parsed options into call arguments.
///
/// Named options are passed by keyword. When rest values are given, the
/// named parameters must be passed positionally ahead of them, so every one
/// of them is then required.
fn collect_arguments(
    function: &BoundFunction,
    matches: &ArgMatches,
) -> Result<(Vec<Value>, IndexMap<String, Value>), CliError> {
    let mut named: Vec<(&Parameter, Option<Value>)> = Vec::new();
    let mut rest = Vec::new();

    for parameter in function.signature() {
        if parameter.is_variadic() {
            if let Some(values) = matches.get_many::<String>(parameter.name()) {
                rest.extend(values.map(|v| parse_value(v)));
            }
        } else {
            let value = matches
                .get_one::<String>(parameter.name())
                .map(|v| parse_value(v));
            named.push((parameter, value));
        }
    }

    if rest.is_empty() {
        let keywords = named
            .into_iter()
            .filter_map(|(p, v)| v.map(|v| (p.name().to_string(), v)))
            .collect();
        return Ok((Vec::new(), keywords));
    }

    let mut positional = Vec::with_capacity(named.len() + rest.len());
    for (parameter, value) in named {
        match value {
            Some(value) => positional.push(value),
            None => {
                return Err(CliError::InvalidArguments(format!(
                    "--{} is required when extra arguments are given",
                    option_name(parameter.name())
                )))
            }
        }
    }
    positional.extend(rest);
    Ok((positional, IndexMap::new()))
}
