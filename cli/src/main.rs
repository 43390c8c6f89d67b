mod commands;
mod config;

use std::path::PathBuf;

use command_kit_runtime::{
    Command, ConsoleSink, DirectoryProjectResolver, Lifecycle, LocalEventHub, LogLevel,
    RuntimeEnv, scan_log_level,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{CONFIG_PATH_VAR, FileConfig};

const BIN_NAME: &str = "cmdkit";
const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    init_tracing(scan_log_level(&argv));

    match run(argv) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

/// Log lines go to stderr so JSON documents on stdout stay parseable.
fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().as_str()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(mut argv: Vec<String>) -> Result<i32, String> {
    let commands = commands::registry().map_err(|err| format!("invalid command definition: {err}"))?;

    let id = if argv.is_empty() {
        None
    } else {
        Some(argv.remove(0))
    };
    let command = match id.as_deref() {
        None => {
            print_commands(&commands);
            return Ok(1);
        }
        Some("-h" | "--help") => {
            print_commands(&commands);
            return Ok(0);
        }
        Some("--version") => {
            println!("{BIN_NAME} {PACKAGE_VERSION}");
            return Ok(0);
        }
        Some(id) => match commands.iter().find(|c| c.descriptor().id() == id) {
            Some(command) => command,
            None => {
                eprintln!("error: unknown command \"{id}\"");
                print_commands(&commands);
                return Ok(1);
            }
        },
    };

    let cwd = std::env::current_dir()
        .map_err(|err| format!("Failed to read working directory: {err}"))?;
    let explicit = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
    let config = FileConfig::discover(&cwd, explicit).map_err(|err| err.to_string())?;
    tracing::debug!(keys = config.len(), "Loaded configuration");
    let projects = DirectoryProjectResolver::new(cwd);

    let mut out = ConsoleSink;
    let mut events = LocalEventHub::new();
    let outcome = Lifecycle::new(&mut out, &mut events)
        .bin_name(BIN_NAME)
        .with_env(RuntimeEnv::from_env())
        .with_config(&config)
        .with_project_resolver(&projects)
        .run(command.as_ref(), &argv);

    Ok(outcome.exit_code)
}

fn print_commands(commands: &[Box<dyn Command>]) {
    let width = commands
        .iter()
        .map(|c| c.descriptor().id().len())
        .max()
        .unwrap_or(0);
    eprintln!("USAGE\n  $ {BIN_NAME} <command> [flags]\n\nCOMMANDS");
    for command in commands {
        let descriptor = command.descriptor();
        eprintln!("  {:<width$}  {}", descriptor.id(), descriptor.description());
    }
}
