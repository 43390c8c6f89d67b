//! Flag definition types.
//!
//! A [`FlagDefinition`] is one tagged variant covering every flag kind. Each
//! kind has its own constructor ([`FlagDefinition::string`],
//! [`FlagDefinition::enumeration`], ...) taking the flag name and the
//! mandatory description; shared and kind-specific options are then chained
//! with builder methods.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::deprecation::DeprecationNotice;
use crate::value::FlagValue;

/// Caller-supplied conversion from a raw token to a [`FlagValue`].
///
/// Used by `option` flags as their parse function and by `array` flags as the
/// per-element mapper. The `Err` string becomes the hint of the resulting
/// [`FlagValueError`](crate::FlagValueError).
pub type ValueParser = Arc<dyn Fn(&str) -> Result<FlagValue, String> + Send + Sync>;

/// Default element delimiter for `array` flags.
pub const DEFAULT_DELIMITER: char = ',';

/// The closed set of flag kinds.
///
/// # Examples
///
/// ```
/// use command_kit_core::FlagKind;
///
/// assert_eq!(FlagKind::Filepath.to_string(), "filepath");
/// assert!(!FlagKind::Boolean.takes_value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    Boolean,
    String,
    Integer,
    Number,
    Milliseconds,
    Seconds,
    Minutes,
    Version,
    Enum,
    Array,
    Date,
    Datetime,
    Url,
    Email,
    Id,
    Filepath,
    Directory,
    /// Custom kind converted by a caller-supplied parse function.
    Option,
    /// Placeholder replaced by the builder with a catalog definition.
    Builtin,
}

impl FlagKind {
    /// Lowercase name used in usage placeholders and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Milliseconds => "milliseconds",
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Version => "version",
            Self::Enum => "enum",
            Self::Array => "array",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Url => "url",
            Self::Email => "email",
            Self::Id => "id",
            Self::Filepath => "filepath",
            Self::Directory => "directory",
            Self::Option => "option",
            Self::Builtin => "builtin",
        }
    }

    /// Whether a flag of this kind consumes a value token.
    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::Boolean)
    }

    /// Whether values of this kind are bounded by `min`/`max`.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Number | Self::Milliseconds | Self::Seconds | Self::Minutes
        )
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of a single flag.
///
/// # Examples
///
/// ```
/// use command_kit_core::{FlagDefinition, FlagKind};
///
/// let file = FlagDefinition::filepath("file", "path to the input file")
///     .with_char('f')
///     .required();
/// assert_eq!(file.kind, FlagKind::Filepath);
/// assert_eq!(file.short, Some('f'));
/// assert!(file.required);
///
/// let format = FlagDefinition::enumeration("format", "output format", ["json", "csv"])
///     .exclusive(["file"]);
/// assert_eq!(format.options, vec!["json", "csv"]);
/// ```
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDefinition {
    pub name: String,
    pub kind: FlagKind,
    /// Single-letter short form (`-f`).
    #[serde(rename = "char", skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    pub required: bool,
    pub hidden: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<DeprecationNotice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FlagValue>,
    /// Allowed values for `enum` and `array` flags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Flags that must accompany this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Flags that cannot be combined with this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclusive: Vec<String>,
    pub delimiter: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Set when the definition came from the builtin catalog.
    pub builtin: bool,
    #[serde(skip)]
    pub parse: Option<ValueParser>,
    #[serde(skip)]
    pub map: Option<ValueParser>,
}

impl fmt::Debug for FlagDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("short", &self.short)
            .field("required", &self.required)
            .field("hidden", &self.hidden)
            .field("description", &self.description)
            .field("long_description", &self.long_description)
            .field("deprecated", &self.deprecated)
            .field("default", &self.default)
            .field("options", &self.options)
            .field("depends_on", &self.depends_on)
            .field("exclusive", &self.exclusive)
            .field("delimiter", &self.delimiter)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("builtin", &self.builtin)
            .field("parse", &self.parse.is_some())
            .field("map", &self.map.is_some())
            .finish()
    }
}

impl FlagDefinition {
    /// Creates a definition of the given kind with every option unset.
    pub fn new(name: impl Into<String>, kind: FlagKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            short: None,
            required: false,
            hidden: false,
            description: description.into(),
            long_description: None,
            deprecated: None,
            default: None,
            options: Vec::new(),
            depends_on: Vec::new(),
            exclusive: Vec::new(),
            delimiter: DEFAULT_DELIMITER,
            min: None,
            max: None,
            builtin: false,
            parse: None,
            map: None,
        }
    }

    /// Presence-only flag; `--name` binds `true`.
    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Boolean, description)
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Integer, description)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Number, description)
    }

    pub fn milliseconds(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Milliseconds, description)
    }

    pub fn seconds(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Seconds, description)
    }

    pub fn minutes(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Minutes, description)
    }

    /// Dotted numeric version such as `1.2.3`.
    pub fn version(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Version, description)
    }

    /// Value must be one of `options`.
    pub fn enumeration<I, S>(
        name: impl Into<String>,
        description: impl Into<String>,
        options: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, FlagKind::Enum, description).with_options(options)
    }

    /// Delimited list of values; see [`with_delimiter`](Self::with_delimiter)
    /// and [`with_mapper`](Self::with_mapper).
    pub fn array(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Array, description)
    }

    pub fn date(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Date, description)
    }

    pub fn datetime(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Datetime, description)
    }

    pub fn url(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Url, description)
    }

    pub fn email(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Email, description)
    }

    /// 15 or 18 character record/org identifier.
    pub fn id(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Id, description)
    }

    pub fn filepath(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Filepath, description)
    }

    pub fn directory(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Directory, description)
    }

    /// Custom flag whose raw value is converted by `parse` without further
    /// validation.
    pub fn option<F>(name: impl Into<String>, description: impl Into<String>, parse: F) -> Self
    where
        F: Fn(&str) -> Result<FlagValue, String> + Send + Sync + 'static,
    {
        let mut flag = Self::new(name, FlagKind::Option, description);
        flag.parse = Some(Arc::new(parse));
        flag
    }

    /// Marker for a catalog flag (`verbose`, `targetusername`, ...).
    ///
    /// The builder substitutes the canonical definition; a non-empty
    /// description set here replaces the canonical one.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Builtin, "")
    }

    pub fn with_char(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_long_description(mut self, long_description: impl Into<String>) -> Self {
        self.long_description = Some(long_description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<FlagValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn deprecated(mut self, notice: DeprecationNotice) -> Self {
        self.deprecated = Some(notice);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclusive<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusive = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Per-element conversion for `array` flags.
    pub fn with_mapper<F>(mut self, map: F) -> Self
    where
        F: Fn(&str) -> Result<FlagValue, String> + Send + Sync + 'static,
    {
        self.map = Some(Arc::new(map));
        self
    }

    /// Replaces the parse function. On `string` flags it acts as a validator
    /// run after the identity conversion.
    pub fn with_parser<F>(mut self, parse: F) -> Self
    where
        F: Fn(&str) -> Result<FlagValue, String> + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    /// Inclusive bounds for numeric and duration kinds.
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// `-f` when a char is set, `--name` otherwise.
    pub fn display_name(&self) -> String {
        match self.short {
            Some(short) => format!("-{short}"),
            None => format!("--{}", self.name),
        }
    }
}
