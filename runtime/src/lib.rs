//! Command lifecycle driver.
//!
//! A command is a [`CommandDescriptor`] (built once, immutable) plus a
//! [`Command::run`] implementation. [`Lifecycle::run`] takes it from raw argv
//! to an [`Outcome`]:
//!
//! 1. choose JSON or human output and scan `--loglevel`
//! 2. print help on `-h` / `--help` and stop
//! 3. bind argv through an [`ArgvParser`]
//! 4. warn about deprecated commands and flags
//! 5. partition trailing `name=value` tokens
//! 6. resolve the project workspace and org credentials
//! 7. register lifecycle events and run the command
//! 8. report the result, or normalize and report the failure
//!
//! External collaborators are traits ([`ArgvParser`], [`OrgResolver`],
//! [`ProjectResolver`], [`ConfigReader`], [`EventHub`], [`OutputSink`]) so a
//! host can swap any of them.

mod command;
mod context;
mod descriptor;
mod env;
mod error;
mod events;
mod help;
mod lifecycle;
mod loglevel;
mod output;
mod parser;
mod resolve;

pub use command::Command;
pub use context::{CommandContext, CommandResult};
pub use descriptor::{ArgSpec, CommandDescriptor, CommandDescriptorBuilder, DescriptorError};
pub use env::{CONTENT_TYPE_VAR, ENV_MODE_VAR, JSON_TO_STDOUT_VAR, RuntimeEnv};
pub use error::{AuthorizationError, CommandError, LifecycleError};
pub use events::{ERROR_EVENT, EventHub, LocalEventHub};
pub use help::render_help;
pub use lifecycle::{Lifecycle, LifecycleState, Outcome};
pub use loglevel::{LogLevel, scan_log_level};
pub use output::{BufferedSink, ConsoleSink, OutputSink, OutputStream, TableColumn, render_table};
pub use parser::{ArgvParser, ClapArgvParser, ParseError, ParsedArgv};
pub use resolve::{
    API_VERSION_KEY, ConfigReader, ConfiguredOrgResolver, DEFAULT_DEVHUB_USERNAME_KEY,
    DEFAULT_USERNAME_KEY, DirectoryProjectResolver, EmptyConfig, NoProjectResolver, OrgHandle,
    OrgResolveError, OrgResolver, PROJECT_MARKER, ProjectHandle, ProjectResolveError,
    ProjectResolver,
};
