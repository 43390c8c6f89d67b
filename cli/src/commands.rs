//! Commands registered with the `cmdkit` host.

use command_kit_core::{DeprecationNotice, FlagDefinition, FlagValue, VarargsConfig};
use command_kit_runtime::{
    ArgSpec, Command, CommandContext, CommandDescriptor, CommandError, CommandResult,
    DescriptorError, OutputSink, TableColumn,
};
use serde_json::{Value, json};

/// Builds every registered command.
pub fn registry() -> Result<Vec<Box<dyn Command>>, DescriptorError> {
    let hello = Hello::new()?;
    let org_display = OrgDisplay::new()?;
    let describe = FlagsDescribe::new(vec![
        hello.descriptor.clone(),
        org_display.descriptor.clone(),
    ])?;
    Ok(vec![Box::new(hello), Box::new(describe), Box::new(org_display)])
}

pub struct Hello {
    descriptor: CommandDescriptor,
}

impl Hello {
    pub fn new() -> Result<Self, DescriptorError> {
        let descriptor = CommandDescriptor::builder("hello")
            .description("Print a greeting")
            .long_description(
                "Prints a greeting for NAME. Trailing name=value pairs are echoed back\nas template variables.",
            )
            .example("$ cmdkit hello -n Ada")
            .example("$ cmdkit hello -n Ada --times 2 mood=cheerful")
            .flag(
                FlagDefinition::string("name", "who to greet")
                    .with_char('n')
                    .with_default("world"),
            )
            .flag(
                FlagDefinition::integer("times", "how many greetings to print")
                    .with_range(Some(1.0), Some(10.0))
                    .with_default(1i64),
            )
            .flag(FlagDefinition::boolean("loud", "print in upper case").exclusive(["quiet"]))
            .flag(
                FlagDefinition::boolean("shout", "print in upper case")
                    .hidden()
                    .deprecated(DeprecationNotice::removed_in("2.0").replaced_by("loud")),
            )
            .flag(FlagDefinition::builtin("quiet").with_description("print nothing"))
            .varargs(VarargsConfig::optional())
            .build()?;
        Ok(Self { descriptor })
    }
}

impl Command for Hello {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn run(&self, ctx: &mut CommandContext) -> Result<Value, CommandError> {
        let name = ctx.flag_str("name").unwrap_or("world");
        let mut greeting = format!("Hello, {name}!");
        if ctx.flag_bool("loud") || ctx.flag_bool("shout") {
            greeting = greeting.to_uppercase();
        }
        let times = ctx.flag("times").and_then(FlagValue::as_i64).unwrap_or(1);

        Ok(json!({
            "greeting": greeting,
            "times": times,
            "quiet": ctx.flag_bool("quiet"),
            "vars": ctx.varargs,
        }))
    }

    fn display(&self, result: &CommandResult, out: &mut dyn OutputSink) {
        if result.data["quiet"].as_bool().unwrap_or(false) {
            return;
        }
        let greeting = result.data["greeting"].as_str().unwrap_or_default();
        for _ in 0..result.data["times"].as_i64().unwrap_or(1) {
            out.log(greeting);
        }
        if let Some(vars) = result.data["vars"].as_object() {
            for (name, value) in vars {
                out.log(&format!("  {name} = {}", value.as_str().unwrap_or_default()));
            }
        }
    }
}

/// Lists the flags of another registered command.
pub struct FlagsDescribe {
    descriptor: CommandDescriptor,
    targets: Vec<CommandDescriptor>,
}

impl FlagsDescribe {
    pub fn new(targets: Vec<CommandDescriptor>) -> Result<Self, DescriptorError> {
        let descriptor = CommandDescriptor::builder("flags:describe")
            .description("Describe the flags of a command")
            .example("$ cmdkit flags:describe hello")
            .example("$ cmdkit flags:describe hello --json")
            .arg(ArgSpec::required("command", "command id to describe"))
            .flag(FlagDefinition::boolean("all", "include hidden flags").with_char('a'))
            .table_column(("name", "Name"))
            .table_column(("kind", "Kind"))
            .table_column(("char", "Char"))
            .table_column(("required", "Required"))
            .table_column(("description", "Description"))
            .build()?;
        Ok(Self {
            descriptor,
            targets,
        })
    }
}

impl Command for FlagsDescribe {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn run(&self, ctx: &mut CommandContext) -> Result<Value, CommandError> {
        let id = ctx.arg("command").unwrap_or_default();
        let target = self
            .targets
            .iter()
            .find(|descriptor| descriptor.id() == id)
            .ok_or_else(|| {
                let known: Vec<&str> = self.targets.iter().map(CommandDescriptor::id).collect();
                CommandError::new("UnknownCommand", format!("no command named \"{id}\""))
                    .with_action(format!("Choose one of: {}", known.join(", ")))
                    .with_exit_code(2)
            })?;

        let include_hidden = ctx.flag_bool("all");
        let flags: Vec<Value> = target
            .flags()
            .iter()
            .filter(|flag| include_hidden || !flag.hidden)
            .map(|flag| {
                json!({
                    "name": flag.name,
                    "kind": flag.kind,
                    "char": flag.short.map(String::from),
                    "required": flag.required,
                    "description": flag.description,
                })
            })
            .collect();

        if !include_hidden && flags.len() < target.flags().len() {
            ctx.warn("Some flags are hidden. Pass --all to include them.");
        }
        Ok(Value::Array(flags))
    }
}

/// Shows the org resolved for the current invocation.
pub struct OrgDisplay {
    descriptor: CommandDescriptor,
}

impl OrgDisplay {
    pub fn new() -> Result<Self, DescriptorError> {
        let descriptor = CommandDescriptor::builder("org:display")
            .description("Display the target org")
            .example("$ cmdkit org:display -u ada@example.com")
            .requires_username()
            .supports_devhub_username()
            .build()?;
        Ok(Self { descriptor })
    }
}

impl Command for OrgDisplay {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn run(&self, ctx: &mut CommandContext) -> Result<Value, CommandError> {
        let org = ctx.org.as_ref().ok_or_else(|| {
            CommandError::new("RequiresUsernameError", "no org was resolved for this command")
        })?;
        Ok(json!({
            "username": org.username,
            "apiVersion": org.api_version,
            "devHubUsername": ctx.hub_org.as_ref().map(|hub| hub.username.clone()),
        }))
    }

    fn display(&self, result: &CommandResult, out: &mut dyn OutputSink) {
        let rows: Vec<Value> = ["username", "apiVersion", "devHubUsername"]
            .iter()
            .filter_map(|key| {
                result.data[*key]
                    .as_str()
                    .map(|value| json!({ "key": key, "value": value }))
            })
            .collect();
        out.table(
            &rows,
            &[TableColumn::new("key", "Key"), TableColumn::new("value", "Value")],
        );
    }
}
