//! Log severity selection from raw argv.

use std::sync::LazyLock;

use regex::Regex;

static LOGLEVEL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--loglevel(?:=(.*))?$").expect("static regex must compile"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// Case-insensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            "fatal" => Some(Self::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// `fatal` has no tracing counterpart and maps to ERROR.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error | Self::Fatal => tracing::Level::ERROR,
        }
    }
}

/// Finds `--loglevel <v>` or `--loglevel=<v>` among the argv tokens before
/// formal parsing. Text inside another token never counts.
///
/// Unknown values fall back to the default so a bad marker never prevents
/// the lifecycle from reporting its own parse error.
///
/// # Examples
///
/// ```
/// use command_kit_runtime::{LogLevel, scan_log_level};
///
/// let argv = vec!["--name".to_string(), "x".to_string(), "--loglevel=DEBUG".to_string()];
/// assert_eq!(scan_log_level(&argv), LogLevel::Debug);
/// assert_eq!(scan_log_level(&[]), LogLevel::Warn);
/// ```
pub fn scan_log_level(argv: &[String]) -> LogLevel {
    let mut tokens = argv.iter();
    while let Some(token) = tokens.next() {
        let Some(caps) = LOGLEVEL_TOKEN.captures(token) else {
            continue;
        };
        let value = match caps.get(1) {
            Some(inline) => Some(inline.as_str()),
            None => tokens.next().map(String::as_str),
        };
        return value.and_then(LogLevel::from_name).unwrap_or_default();
    }
    LogLevel::default()
}
