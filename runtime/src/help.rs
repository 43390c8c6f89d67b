//! Help text for `-h` / `--help`.

use command_kit_core::{FlagDefinition, FlagKind, FlagValue};
use serde_json::Value;

/// Renders the help screen. The first line is always `USAGE`.
///
/// # Examples
///
/// ```
/// use command_kit_core::FlagDefinition;
/// use command_kit_runtime::{CommandDescriptor, render_help};
///
/// let descriptor = CommandDescriptor::builder("hello")
///     .description("say hello")
///     .flag(FlagDefinition::string("name", "who to greet").with_char('n'))
///     .build()
///     .unwrap();
///
/// let help = render_help("cmdkit", &descriptor);
/// let mut lines = help.lines();
/// assert_eq!(lines.next(), Some("USAGE"));
/// assert!(lines.next().unwrap().starts_with("  $ cmdkit hello [-n <string>]"));
/// assert!(help.contains("-n, --name=<string>"));
/// ```
pub fn render_help(bin: &str, descriptor: &crate::CommandDescriptor) -> String {
    let mut out = String::from("USAGE\n");
    let usage = descriptor.usage();
    if usage.is_empty() {
        out.push_str(&format!("  $ {bin} {}\n", descriptor.id()));
    } else {
        out.push_str(&format!("  $ {bin} {} {usage}\n", descriptor.id()));
    }

    let args: Vec<(String, String)> = descriptor
        .args()
        .iter()
        .map(|arg| (arg.name.to_uppercase(), arg.description.clone()))
        .collect();
    push_section(&mut out, "ARGUMENTS", &args);

    let options: Vec<(String, String)> = descriptor
        .flags()
        .iter()
        .filter(|flag| !flag.hidden)
        .map(|flag| (option_label(flag), option_description(flag)))
        .collect();
    push_section(&mut out, "OPTIONS", &options);

    let description = descriptor
        .long_description()
        .unwrap_or(descriptor.description());
    if !description.trim().is_empty() {
        out.push_str("\nDESCRIPTION\n");
        for line in description.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }

    if !descriptor.examples().is_empty() {
        out.push_str("\nEXAMPLES\n");
        for example in descriptor.examples() {
            out.push_str(&format!("  {example}\n"));
        }
    }

    out
}

fn push_section(out: &mut String, title: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    out.push_str(&format!("\n{title}\n"));
    for (label, description) in rows {
        let line = format!("  {label:<width$}  {description}");
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

fn option_label(flag: &FlagDefinition) -> String {
    let mut label = match flag.short {
        Some(short) => format!("-{short}, --{}", flag.name),
        None => format!("--{}", flag.name),
    };
    match flag.kind {
        FlagKind::Boolean => {}
        FlagKind::Enum => label.push_str(&format!("=({})", flag.options.join("|"))),
        kind => label.push_str(&format!("=<{kind}>")),
    }
    label
}

fn option_description(flag: &FlagDefinition) -> String {
    let mut description = flag.description.clone();
    if let Some(default) = &flag.default {
        description.push_str(&format!(" [default: {}]", default_text(default)));
    }
    description
}

fn default_text(value: &FlagValue) -> String {
    match value.to_json() {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
