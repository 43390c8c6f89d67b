//! The per-invocation state machine.
//!
//! [`Lifecycle::run`] takes one command and its raw argv through
//! initialization, help, parsing, deprecation checks, varargs, authorization
//! and business logic, then reports exactly one success or failure through
//! the output sink. Collaborators are borrowed for the duration of the
//! lifecycle and default to the in-crate implementations.

use command_kit_core::{BuiltinFlag, DeprecatedSubject};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::command::Command;
use crate::context::{CommandContext, CommandResult};
use crate::descriptor::CommandDescriptor;
use crate::env::RuntimeEnv;
use crate::error::{AuthorizationError, CommandError, LifecycleError};
use crate::events::{ERROR_EVENT, EventHub};
use crate::help::render_help;
use crate::loglevel::scan_log_level;
use crate::output::{OutputSink, OutputStream};
use crate::parser::{ArgvParser, ClapArgvParser};
use crate::resolve::{
    API_VERSION_KEY, ConfigReader, ConfiguredOrgResolver, DEFAULT_DEVHUB_USERNAME_KEY,
    DEFAULT_USERNAME_KEY, EmptyConfig, NoProjectResolver, OrgResolver, ProjectResolveError,
    ProjectResolver,
};

static DEFAULT_PARSER: ClapArgvParser = ClapArgvParser;
static DEFAULT_ORGS: ConfiguredOrgResolver = ConfiguredOrgResolver;
static DEFAULT_PROJECTS: NoProjectResolver = NoProjectResolver;
static DEFAULT_CONFIG: EmptyConfig = EmptyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Created,
    Initializing,
    HelpExit,
    Parsing,
    DeprecationCheck,
    Varargs,
    Authorize,
    Running,
    Succeeded,
    Failed,
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// One of `HelpExit`, `Succeeded` or `Failed`.
    pub state: LifecycleState,
    pub exit_code: i32,
    pub result: Option<Value>,
    pub error: Option<CommandError>,
    pub warnings: Vec<String>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.state != LifecycleState::Failed
    }
}

pub struct Lifecycle<'a> {
    bin: String,
    env: RuntimeEnv,
    parser: &'a dyn ArgvParser,
    orgs: &'a dyn OrgResolver,
    projects: &'a dyn ProjectResolver,
    config: &'a dyn ConfigReader,
    events: &'a mut dyn EventHub,
    output: &'a mut dyn OutputSink,
}

impl<'a> Lifecycle<'a> {
    /// Creates a lifecycle writing to `output` and publishing to `events`.
    ///
    /// Uses the clap parser, a config-backed org resolver, no project
    /// workspace, empty configuration and default environment settings
    /// until overridden.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_kit_runtime::{
    ///     BufferedSink, Command, CommandContext, CommandDescriptor, CommandError, Lifecycle,
    ///     LocalEventHub,
    /// };
    /// use serde_json::{Value, json};
    ///
    /// struct Ping(CommandDescriptor);
    ///
    /// impl Command for Ping {
    ///     fn descriptor(&self) -> &CommandDescriptor {
    ///         &self.0
    ///     }
    ///     fn run(&self, _ctx: &mut CommandContext) -> Result<Value, CommandError> {
    ///         Ok(json!("pong"))
    ///     }
    /// }
    ///
    /// let ping = Ping(CommandDescriptor::builder("ping").build().unwrap());
    /// let mut out = BufferedSink::new();
    /// let mut events = LocalEventHub::new();
    ///
    /// let outcome = Lifecycle::new(&mut out, &mut events).run(&ping, &["--json".to_string()]);
    /// assert_eq!(outcome.exit_code, 0);
    /// assert!(out.stdout_text().contains("\"result\": \"pong\""));
    /// ```
    pub fn new(output: &'a mut dyn OutputSink, events: &'a mut dyn EventHub) -> Self {
        Self {
            bin: env!("CARGO_PKG_NAME").to_string(),
            env: RuntimeEnv::default(),
            parser: &DEFAULT_PARSER,
            orgs: &DEFAULT_ORGS,
            projects: &DEFAULT_PROJECTS,
            config: &DEFAULT_CONFIG,
            events,
            output,
        }
    }

    /// Program name shown in help output.
    pub fn bin_name(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    pub fn with_env(mut self, env: RuntimeEnv) -> Self {
        self.env = env;
        self
    }

    pub fn with_parser(mut self, parser: &'a dyn ArgvParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_org_resolver(mut self, orgs: &'a dyn OrgResolver) -> Self {
        self.orgs = orgs;
        self
    }

    pub fn with_project_resolver(mut self, projects: &'a dyn ProjectResolver) -> Self {
        self.projects = projects;
        self
    }

    pub fn with_config(mut self, config: &'a dyn ConfigReader) -> Self {
        self.config = config;
        self
    }

    /// Runs one invocation to completion.
    ///
    /// Never panics on user input: every failure is normalized into a
    /// [`CommandError`], reported once and returned in the [`Outcome`].
    pub fn run(&mut self, command: &dyn Command, argv: &[String]) -> Outcome {
        let descriptor = command.descriptor();
        transition(descriptor, LifecycleState::Created);
        let mut ctx = CommandContext::new(descriptor.id());

        transition(descriptor, LifecycleState::Initializing);
        ctx.is_json = self.env.json_content_type || argv.iter().any(|arg| arg == "--json");
        ctx.log_level = scan_log_level(argv);

        if wants_help(descriptor, argv) {
            transition(descriptor, LifecycleState::HelpExit);
            self.output.log(render_help(&self.bin, descriptor).trim_end());
            return Outcome {
                state: LifecycleState::HelpExit,
                exit_code: 0,
                result: None,
                error: None,
                warnings: Vec::new(),
            };
        }

        match self.execute(command, &mut ctx, argv) {
            Ok(data) => self.succeed(command, &mut ctx, data),
            Err(err) => self.fail(command, &mut ctx, err),
        }
    }

    fn execute(
        &mut self,
        command: &dyn Command,
        ctx: &mut CommandContext,
        argv: &[String],
    ) -> Result<Value, CommandError> {
        let descriptor = command.descriptor();

        transition(descriptor, LifecycleState::Parsing);
        let parsed = self.parser.parse(descriptor, argv)?;
        ctx.flags = parsed.flags;
        ctx.supplied = parsed.supplied;
        ctx.args = parsed.args;
        let json_flag = ctx.flag_bool(BuiltinFlag::Json.name());
        ctx.is_json |= json_flag;

        transition(descriptor, LifecycleState::DeprecationCheck);
        if let Some(notice) = descriptor.deprecated() {
            ctx.warn(notice.warning(descriptor.id(), DeprecatedSubject::Command));
        }
        for flag in descriptor.flags() {
            if let Some(notice) = &flag.deprecated {
                if ctx.was_supplied(&flag.name) {
                    ctx.warn(notice.warning(&flag.name, DeprecatedSubject::Flag));
                }
            }
        }
        ctx.flush_warnings(&mut *self.output);

        if descriptor.varargs().is_enabled() {
            transition(descriptor, LifecycleState::Varargs);
            ctx.varargs = descriptor.varargs().parse(&parsed.leftover)?;
        }

        transition(descriptor, LifecycleState::Authorize);
        self.authorize(descriptor, ctx)?;
        ctx.flush_warnings(&mut *self.output);

        transition(descriptor, LifecycleState::Running);
        for event in descriptor.lifecycle_events() {
            self.events.register(event);
        }
        let data = command.run(ctx);
        ctx.flush_warnings(&mut *self.output);
        data
    }

    fn authorize(
        &self,
        descriptor: &CommandDescriptor,
        ctx: &mut CommandContext,
    ) -> Result<(), LifecycleError> {
        if descriptor.requires_project() {
            let project = self.projects.resolve().map_err(|err| match err {
                ProjectResolveError::NotInWorkspace => {
                    LifecycleError::Authorization(AuthorizationError::RequiresProject)
                }
                other => LifecycleError::Project(other),
            })?;
            ctx.project = Some(project);
        }

        let credentials = descriptor.credentials();
        if credentials.wants_username() {
            let username = ctx
                .flag_str(BuiltinFlag::TargetUsername.name())
                .map(str::to_string);
            match self
                .orgs
                .resolve(username.as_deref(), DEFAULT_USERNAME_KEY, self.config)
            {
                Ok(org) => ctx.org = Some(org),
                Err(err) if credentials.requires_username => {
                    debug!(error = %err, "Required username not resolved");
                    return Err(
                        AuthorizationError::RequiresUsername(DEFAULT_USERNAME_KEY.to_string()).into(),
                    );
                }
                Err(err) => debug!(error = %err, "Optional username not resolved"),
            }
        }
        if credentials.wants_devhub_username() {
            let username = ctx
                .flag_str(BuiltinFlag::TargetDevhubUsername.name())
                .map(str::to_string);
            match self
                .orgs
                .resolve(username.as_deref(), DEFAULT_DEVHUB_USERNAME_KEY, self.config)
            {
                Ok(org) => ctx.hub_org = Some(org),
                Err(err) if credentials.requires_devhub_username => {
                    debug!(error = %err, "Required dev hub username not resolved");
                    return Err(AuthorizationError::RequiresDevhubUsername(
                        DEFAULT_DEVHUB_USERNAME_KEY.to_string(),
                    )
                    .into());
                }
                Err(err) => debug!(error = %err, "Optional dev hub username not resolved"),
            }
        }

        let api_version = ctx
            .flag_str(BuiltinFlag::ApiVersion.name())
            .map(str::to_string);
        if let Some(api_version) = &api_version {
            for org in [ctx.org.as_mut(), ctx.hub_org.as_mut()].into_iter().flatten() {
                org.api_version = Some(api_version.clone());
            }
        }
        if api_version.is_none() {
            if let Some(configured) = self.config.get(API_VERSION_KEY) {
                ctx.warn(format!("apiVersion configuration overridden at \"{configured}\""));
            }
        }
        Ok(())
    }

    fn succeed(&mut self, command: &dyn Command, ctx: &mut CommandContext, data: Value) -> Outcome {
        let descriptor = command.descriptor();
        transition(descriptor, LifecycleState::Succeeded);

        let warnings = ctx.take_warnings();
        if ctx.is_json {
            let document = json!({
                "status": ctx.exit_code,
                "result": data.clone(),
                "warnings": warnings.clone(),
            });
            self.output.json(&document, OutputStream::Stdout);
        } else {
            let result = CommandResult::new(data.clone(), descriptor.table_columns().to_vec());
            command.display(&result, &mut *self.output);
        }

        Outcome {
            state: LifecycleState::Succeeded,
            exit_code: ctx.exit_code,
            result: Some(data),
            error: None,
            warnings,
        }
    }

    fn fail(&mut self, command: &dyn Command, ctx: &mut CommandContext, err: CommandError) -> Outcome {
        let descriptor = command.descriptor();
        transition(descriptor, LifecycleState::Failed);
        debug!(command = descriptor.id(), name = %err.name, "Command failed: {}", err.message);

        let err = if self.env.development {
            err.capture_stack()
        } else {
            err
        };
        ctx.exit_code = err.exit_code;
        ctx.flush_warnings(&mut *self.output);
        let warnings = ctx.take_warnings();

        if ctx.is_json {
            let mut document = error_json(&err, self.env.development);
            document["status"] = json!(err.exit_code);
            document["commandName"] = json!(descriptor.id());
            document["warnings"] = json!(warnings.clone());
            self.output.json(&document, self.env.json_error_stream);
        } else {
            let prefix = if descriptor.id().is_empty() {
                "ERROR".to_string()
            } else {
                format!("ERROR running {}", descriptor.id())
            };
            self.output.error(&format!("{prefix}: {}", err.message));
            if !err.actions.is_empty() {
                self.output.error("");
                self.output.error("Try this:");
                for action in &err.actions {
                    self.output.error(&format!("  {action}"));
                }
            }
            if self.env.development {
                if let Some(stack) = &err.stack {
                    self.output.error(stack);
                }
            }
            if let Some(data) = &err.data {
                let result = CommandResult::new(data.clone(), descriptor.table_columns().to_vec());
                command.display(&result, &mut *self.output);
            }
        }

        let org = ctx
            .org
            .as_ref()
            .or(ctx.hub_org.as_ref())
            .map(|org| org.username.clone());
        let payload = json!({
            "error": error_json(&err, self.env.development),
            "flags": ctx.merged_flags_json(),
            "org": org,
        });
        self.events.publish(ERROR_EVENT, &payload);

        Outcome {
            state: LifecycleState::Failed,
            exit_code: err.exit_code,
            result: None,
            error: Some(err),
            warnings,
        }
    }
}

fn transition(descriptor: &CommandDescriptor, state: LifecycleState) {
    debug!(command = descriptor.id(), state = ?state, "Lifecycle transition");
}

/// `-h` unless a flag owns char `h`; `--help` unless a flag is named `help`.
fn wants_help(descriptor: &CommandDescriptor, argv: &[String]) -> bool {
    let flags = descriptor.flags();
    let short = flags.find_by_char('h').is_none() && argv.iter().any(|arg| arg == "-h");
    let long = !flags.contains("help") && argv.iter().any(|arg| arg == "--help");
    short || long
}

fn error_json(err: &CommandError, with_stack: bool) -> Value {
    let mut document = json!({
        "name": err.name,
        "message": err.message,
        "exitCode": err.exit_code,
    });
    if !err.actions.is_empty() {
        document["actions"] = json!(err.actions);
    }
    if let Some(data) = &err.data {
        document["data"] = data.clone();
    }
    if with_stack {
        if let Some(stack) = &err.stack {
            document["stack"] = json!(stack);
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::CommandDescriptor;
    use command_kit_core::FlagDefinition;

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wants_help_short() {
        let descriptor = CommandDescriptor::builder("x").build().unwrap();
        assert!(wants_help(&descriptor, &argv(&["-h"])));
        assert!(wants_help(&descriptor, &argv(&["--help"])));
        assert!(!wants_help(&descriptor, &argv(&["-x"])));
    }

    #[test]
    fn test_wants_help_yields_to_owning_flag() {
        let descriptor = CommandDescriptor::builder("x")
            .flag(FlagDefinition::string("host", "server").with_char('h'))
            .flag(FlagDefinition::boolean("help", "custom help"))
            .build()
            .unwrap();
        assert!(!wants_help(&descriptor, &argv(&["-h", "local"])));
        assert!(!wants_help(&descriptor, &argv(&["--help"])));
    }

    #[test]
    fn test_error_json_hides_stack_outside_development() {
        let mut err = CommandError::new("Boom", "broke").with_action("retry");
        err.stack = Some("frame".into());
        let hidden = error_json(&err, false);
        assert!(hidden.get("stack").is_none());
        assert_eq!(hidden["actions"][0], "retry");
        assert_eq!(error_json(&err, true)["stack"], "frame");
    }
}
