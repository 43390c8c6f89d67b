//! Binding raw argv to a command's flags, positionals and trailing tokens.

use std::collections::{BTreeMap, BTreeSet};

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches};
use command_kit_core::{FlagDefinition, FlagKind, FlagValue, FlagValueError};
use thiserror::Error;
use tracing::debug;

use crate::descriptor::CommandDescriptor;

const VARARGS_ID: &str = "__varargs";

/// Typed result of binding argv.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgv {
    /// Every flag with a value: supplied ones plus defaults.
    pub flags: BTreeMap<String, FlagValue>,
    /// Names of flags given on the command line.
    pub supplied: BTreeSet<String>,
    pub args: BTreeMap<String, String>,
    /// Tokens not bound to a flag or positional, in order.
    pub leftover: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Unknown flag, missing value, missing required flag and the like.
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Value(#[from] FlagValueError),
}

/// Argument-parsing service used by the lifecycle.
pub trait ArgvParser {
    fn parse(
        &self,
        descriptor: &CommandDescriptor,
        argv: &[String],
    ) -> Result<ParsedArgv, ParseError>;
}

/// [`ArgvParser`] backed by a `clap` command built from the descriptor.
///
/// Unknown trailing tokens are rejected unless the descriptor enables
/// varargs, in which case they are returned as `leftover`.
///
/// # Examples
///
/// ```
/// use command_kit_core::{FlagDefinition, FlagValue};
/// use command_kit_runtime::{ArgvParser, ClapArgvParser, CommandDescriptor};
///
/// let descriptor = CommandDescriptor::builder("hello")
///     .flag(FlagDefinition::integer("times", "repeat count").with_char('t'))
///     .build()
///     .unwrap();
/// let argv = vec!["-t".to_string(), "3".to_string()];
///
/// let parsed = ClapArgvParser.parse(&descriptor, &argv).unwrap();
/// assert_eq!(parsed.flags.get("times"), Some(&FlagValue::Integer(3)));
/// assert!(parsed.supplied.contains("times"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ClapArgvParser;

impl ClapArgvParser {
    fn command(descriptor: &CommandDescriptor) -> clap::Command {
        let flags = descriptor.flags();
        let mut command = clap::Command::new(descriptor.id().to_string())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true);

        for flag in flags {
            let mut arg = Arg::new(flag.name.clone())
                .long(flag.name.clone())
                .required(flag.required)
                .hide(flag.hidden);
            if let Some(short) = flag.short {
                arg = arg.short(short);
            }
            arg = if flag.kind.takes_value() {
                arg.action(ArgAction::Set)
                    .value_name(flag.kind.as_str())
                    .allow_negative_numbers(flag.kind.is_numeric())
            } else {
                arg.action(ArgAction::SetTrue)
            };
            let related = |name: &&String| **name != flag.name && flags.contains(name);
            for partner in flag.depends_on.iter().filter(related) {
                arg = arg.requires(partner.clone());
            }
            for partner in flag.exclusive.iter().filter(related) {
                arg = arg.conflicts_with(partner.clone());
            }
            command = command.arg(arg);
        }

        let args = descriptor.args();
        for (i, spec) in args.iter().enumerate() {
            command = command.arg(
                Arg::new(spec.name.clone())
                    .index(i + 1)
                    .required(spec.required)
                    .action(ArgAction::Set),
            );
        }

        if descriptor.varargs().is_enabled() {
            command = command.arg(
                Arg::new(VARARGS_ID)
                    .index(args.len() + 1)
                    .num_args(1..)
                    .action(ArgAction::Append),
            );
        }

        command
    }

    fn bind_flag(
        flag: &FlagDefinition,
        matches: &ArgMatches,
        parsed: &mut ParsedArgv,
    ) -> Result<(), ParseError> {
        let supplied = matches.value_source(&flag.name) == Some(ValueSource::CommandLine);
        if !supplied {
            if let Some(default) = &flag.default {
                parsed.flags.insert(flag.name.clone(), default.clone());
            }
            return Ok(());
        }

        let value = if flag.kind == FlagKind::Boolean {
            FlagValue::Bool(matches.get_flag(&flag.name))
        } else {
            let raw = matches
                .get_one::<String>(&flag.name)
                .ok_or_else(|| ParseError::Usage(format!("flag --{} expects a value", flag.name)))?;
            flag.convert(raw)?
        };
        parsed.supplied.insert(flag.name.clone());
        parsed.flags.insert(flag.name.clone(), value);
        Ok(())
    }
}

impl ArgvParser for ClapArgvParser {
    fn parse(
        &self,
        descriptor: &CommandDescriptor,
        argv: &[String],
    ) -> Result<ParsedArgv, ParseError> {
        let matches = Self::command(descriptor)
            .try_get_matches_from(argv)
            .map_err(|err| ParseError::Usage(usage_message(&err)))?;

        let mut parsed = ParsedArgv::default();
        for flag in descriptor.flags() {
            Self::bind_flag(flag, &matches, &mut parsed)?;
        }
        for spec in descriptor.args() {
            if let Some(value) = matches.get_one::<String>(&spec.name) {
                parsed.args.insert(spec.name.clone(), value.clone());
            }
        }
        if descriptor.varargs().is_enabled() {
            if let Some(values) = matches.get_many::<String>(VARARGS_ID) {
                parsed.leftover = values.cloned().collect();
            }
        }

        debug!(
            command = descriptor.id(),
            supplied = parsed.supplied.len(),
            leftover = parsed.leftover.len(),
            "Parsed argv"
        );
        Ok(parsed)
    }
}

/// First paragraph of a clap error on one line, without its `error: ` prefix.
fn usage_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let paragraph: Vec<&str> = rendered
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .map(str::trim)
        .collect();
    let joined = paragraph.join(" ");
    joined.strip_prefix("error: ").unwrap_or(&joined).to_string()
}
