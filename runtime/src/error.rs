//! Lifecycle failures and their normalized, user-facing form.

use std::backtrace::Backtrace;
use std::fmt;

use command_kit_core::{FlagValueError, VarargsError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::parser::ParseError;
use crate::resolve::ProjectResolveError;

/// Credential or workspace requirement that could not be met.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("This command is required to run from within a project workspace.")]
    RequiresProject,
    #[error("This command requires a username. Specify it with the -u parameter or with the \"{0}\" config value.")]
    RequiresUsername(String),
    #[error("This command requires a dev hub org username set either with a flag or by default in the config. ({0})")]
    RequiresDevhubUsername(String),
}

/// Any failure raised by the lifecycle itself, before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Varargs(#[from] VarargsError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    /// Project resolution failed for a reason other than a missing workspace.
    #[error(transparent)]
    Project(ProjectResolveError),
}

/// Normalized error reported by a failed invocation.
///
/// Commands return it from [`Command::run`](crate::Command::run); lifecycle
/// failures are converted into it with a stable `name`.
///
/// # Examples
///
/// ```
/// use command_kit_runtime::CommandError;
///
/// let err = CommandError::new("NotFound", "no such record")
///     .with_action("Check the record id.")
///     .with_exit_code(4);
/// assert_eq!(err.to_string(), "no such record");
/// assert_eq!(err.exit_code, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl CommandError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            actions: Vec::new(),
            exit_code: 1,
            data: None,
            stack: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Records the current call stack if none was attached yet.
    pub fn capture_stack(mut self) -> Self {
        if self.stack.is_none() {
            self.stack = Some(Backtrace::force_capture().to_string());
        }
        self
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<FlagValueError> for CommandError {
    fn from(err: FlagValueError) -> Self {
        CommandError::new("InvalidFlagType", err.to_string())
    }
}

impl From<ParseError> for CommandError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Value(err) => err.into(),
            ParseError::Usage(message) => CommandError::new("UsageError", message)
                .with_action("Run the command with -h to see its usage."),
        }
    }
}

impl From<VarargsError> for CommandError {
    fn from(err: VarargsError) -> Self {
        let name = match &err {
            VarargsError::VarargsRequired => "VarargsRequired",
            VarargsError::InvalidVarargsFormat(_) => "InvalidVarargsFormat",
            VarargsError::DuplicateVararg(_) => "DuplicateVararg",
            VarargsError::Validation { .. } => "InvalidVarargs",
        };
        CommandError::new(name, err.to_string())
    }
}

impl From<AuthorizationError> for CommandError {
    fn from(err: AuthorizationError) -> Self {
        match &err {
            AuthorizationError::RequiresProject => {
                CommandError::new("RequiresProjectError", err.to_string())
                    .with_action("Change to a directory inside a project workspace.")
            }
            AuthorizationError::RequiresUsername(key) => {
                CommandError::new("RequiresUsernameError", err.to_string())
                    .with_action(format!("Pass --targetusername or set \"{key}\" in the config."))
            }
            AuthorizationError::RequiresDevhubUsername(key) => {
                CommandError::new("RequiresDevhubUsernameError", err.to_string()).with_action(
                    format!("Pass --targetdevhubusername or set \"{key}\" in the config."),
                )
            }
        }
    }
}

impl From<LifecycleError> for CommandError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Parse(err) => err.into(),
            LifecycleError::Varargs(err) => err.into(),
            LifecycleError::Authorization(err) => err.into(),
            LifecycleError::Project(err) => CommandError::new("ProjectResolveError", err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use command_kit_core::FlagKind;

    #[test]
    fn test_varargs_names() {
        let err: CommandError = VarargsError::DuplicateVararg("foo".into()).into();
        assert_eq!(err.name, "DuplicateVararg");
        assert!(err.message.contains("\"foo\""));
        assert_eq!(err.exit_code, 1);
    }

    #[test]
    fn test_flag_value_error_is_invalid_flag_type() {
        let err: CommandError = LifecycleError::from(ParseError::Value(
            FlagValueError::InvalidFlagType {
                flag: "retries".into(),
                value: "x".into(),
                kind: FlagKind::Integer,
                hint: String::new(),
            },
        ))
        .into();
        assert_eq!(err.name, "InvalidFlagType");
    }

    #[test]
    fn test_authorization_errors_carry_actions() {
        let err: CommandError =
            AuthorizationError::RequiresUsername("defaultusername".into()).into();
        assert_eq!(err.name, "RequiresUsernameError");
        assert_eq!(err.actions.len(), 1);
        assert!(err.actions[0].contains("defaultusername"));
    }

    #[test]
    fn test_serializes_camel_case_without_empty_fields() {
        let err = CommandError::new("Boom", "it broke").with_exit_code(3);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["exitCode"], 3);
        assert!(json.get("actions").is_none());
        assert!(json.get("stack").is_none());
    }

    #[test]
    fn test_capture_stack_keeps_existing() {
        let mut err = CommandError::new("Boom", "it broke");
        err.stack = Some("original".into());
        assert_eq!(err.capture_stack().stack.as_deref(), Some("original"));
    }
}
