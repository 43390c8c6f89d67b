//! Environment-sensitive runtime settings.
//!
//! Read once per invocation into a [`RuntimeEnv`]; the lifecycle never reads
//! process environment variables directly.

use crate::output::OutputStream;

/// Set to `JSON` to force JSON output without `--json`.
pub const CONTENT_TYPE_VAR: &str = "CMDKIT_CONTENT_TYPE";
/// Set to `false` to route JSON error documents to stderr.
pub const JSON_TO_STDOUT_VAR: &str = "CMDKIT_JSON_TO_STDOUT";
/// Set to `development` to disclose stack traces.
pub const ENV_MODE_VAR: &str = "CMDKIT_ENV";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnv {
    pub json_content_type: bool,
    /// Where JSON error documents go. Defaults to stdout so a single stream
    /// carries every JSON document.
    pub json_error_stream: OutputStream,
    pub development: bool,
}

impl Default for RuntimeEnv {
    fn default() -> Self {
        Self {
            json_content_type: false,
            json_error_stream: OutputStream::Stdout,
            development: false,
        }
    }
}

impl RuntimeEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_kit_runtime::{OutputStream, RuntimeEnv};
    ///
    /// let env = RuntimeEnv::from_lookup(|name| match name {
    ///     "CMDKIT_JSON_TO_STDOUT" => Some("false".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(env.json_error_stream, OutputStream::Stderr);
    /// assert!(!env.development);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let json_content_type = lookup(CONTENT_TYPE_VAR)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("json"));
        let json_error_stream = match lookup(JSON_TO_STDOUT_VAR).as_deref().and_then(env_bool) {
            Some(false) => OutputStream::Stderr,
            _ => OutputStream::Stdout,
        };
        let development = lookup(ENV_MODE_VAR)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("development"));

        Self {
            json_content_type,
            json_error_stream,
            development,
        }
    }
}

fn env_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}
