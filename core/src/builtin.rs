//! Catalog of builtin flags with centrally defined semantics.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::FlagDefinition;
use crate::value::FlagValue;

/// Accepted `--loglevel` values, lowercase first.
pub const LOG_LEVELS: [&str; 12] = [
    "trace", "debug", "info", "warn", "error", "fatal", "TRACE", "DEBUG", "INFO", "WARN", "ERROR",
    "FATAL",
];

pub const DEFAULT_LOG_LEVEL: &str = "warn";

static API_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9]\d*\.0$").expect("static regex must compile"));

/// A flag from the fixed builtin catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFlag {
    Json,
    Loglevel,
    ApiVersion,
    Concise,
    Quiet,
    Verbose,
    TargetUsername,
    TargetDevhubUsername,
}

impl BuiltinFlag {
    pub const ALL: [BuiltinFlag; 8] = [
        Self::Json,
        Self::Loglevel,
        Self::ApiVersion,
        Self::Concise,
        Self::Quiet,
        Self::Verbose,
        Self::TargetUsername,
        Self::TargetDevhubUsername,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Loglevel => "loglevel",
            Self::ApiVersion => "apiversion",
            Self::Concise => "concise",
            Self::Quiet => "quiet",
            Self::Verbose => "verbose",
            Self::TargetUsername => "targetusername",
            Self::TargetDevhubUsername => "targetdevhubusername",
        }
    }

    /// Looks a builtin up by flag name.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_kit_core::BuiltinFlag;
    ///
    /// assert_eq!(BuiltinFlag::from_name("verbose"), Some(BuiltinFlag::Verbose));
    /// assert_eq!(BuiltinFlag::from_name("noisy"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// `json` and `loglevel` are injected into every flag set.
    pub fn is_always_present(self) -> bool {
        matches!(self, Self::Json | Self::Loglevel)
    }

    /// The canonical definition for this builtin.
    pub fn definition(self) -> FlagDefinition {
        let flag = match self {
            Self::Json => FlagDefinition::boolean("json", "format output as json"),
            Self::Loglevel => FlagDefinition::enumeration(
                "loglevel",
                "logging level for this command invocation",
                LOG_LEVELS,
            )
            .with_default(DEFAULT_LOG_LEVEL),
            Self::ApiVersion => FlagDefinition::string(
                "apiversion",
                "override the api version used for api requests made by this command",
            )
            .with_parser(|raw| {
                if API_VERSION_RE.is_match(raw) {
                    Ok(FlagValue::from(raw))
                } else {
                    Err("Must be an API version such as 50.0.".to_string())
                }
            }),
            Self::Concise => FlagDefinition::boolean("concise", "emit brief command output to stdout"),
            Self::Quiet => FlagDefinition::boolean("quiet", "nothing emitted stdout"),
            Self::Verbose => {
                FlagDefinition::boolean("verbose", "emit additional command output to stdout")
            }
            Self::TargetUsername => FlagDefinition::string(
                "targetusername",
                "username or alias for the target org; overrides default target org",
            )
            .with_char('u'),
            Self::TargetDevhubUsername => FlagDefinition::string(
                "targetdevhubusername",
                "username or alias for the dev hub org; overrides default dev hub org",
            )
            .with_char('v'),
        };
        FlagDefinition {
            builtin: true,
            ..flag
        }
    }
}
