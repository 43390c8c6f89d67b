//! Flag values and per-kind conversion of raw tokens.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::FlagValueError;
use crate::types::{FlagDefinition, FlagKind};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex must compile")
});
static ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z0-9]{15}|[a-zA-Z0-9]{18})$").expect("static regex must compile")
});
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s/?#]+(?:[/?#]\S*)?$")
        .expect("static regex must compile")
});
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*$").expect("static regex must compile"));
static PATH_BLACKLIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>"|?*\x00]"#).expect("static regex must compile"));

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// A typed flag value produced by [`FlagDefinition::convert`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Integer(i64),
    Number(f64),
    /// Serialized as whole milliseconds.
    #[serde(serialize_with = "serialize_duration")]
    Duration(Duration),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Path(PathBuf),
    Array(Vec<FlagValue>),
    /// Arbitrary value produced by a custom parse function.
    Json(serde_json::Value),
}

fn serialize_duration<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FlagValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// JSON form of the value, as emitted in result documents.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl FlagDefinition {
    /// Converts a raw token bound to this flag into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`FlagValueError::InvalidFlagType`] carrying the raw value, the
    /// kind and a kind-specific hint when the token does not convert.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_kit_core::{FlagDefinition, FlagValue};
    ///
    /// let ids = FlagDefinition::array("ids", "ids to fetch")
    ///     .with_mapper(|raw| raw.parse::<i64>().map(FlagValue::Integer).map_err(|e| e.to_string()));
    /// let value = ids.convert("1,2,3").unwrap();
    /// assert_eq!(value.as_array().unwrap().len(), 3);
    ///
    /// let count = FlagDefinition::integer("count", "how many");
    /// assert!(count.convert("many").is_err());
    /// ```
    pub fn convert(&self, raw: &str) -> Result<FlagValue, FlagValueError> {
        match self.kind {
            FlagKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "" | "true" => Ok(FlagValue::Bool(true)),
                "false" => Ok(FlagValue::Bool(false)),
                _ => Err(self.invalid(raw, "Must be true or false.")),
            },
            FlagKind::String | FlagKind::Builtin => match &self.parse {
                Some(parse) => parse(raw).map_err(|hint| self.invalid(raw, hint)),
                None => Ok(FlagValue::String(raw.to_string())),
            },
            FlagKind::Integer => {
                let n: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| self.invalid(raw, "Must be an integer."))?;
                self.check_range(raw, n as f64)?;
                Ok(FlagValue::Integer(n))
            }
            FlagKind::Number => {
                let n = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| self.invalid(raw, "Must be a finite number."))?;
                self.check_range(raw, n)?;
                Ok(FlagValue::Number(n))
            }
            FlagKind::Milliseconds | FlagKind::Seconds | FlagKind::Minutes => {
                let n: u64 = raw.trim().parse().map_err(|_| {
                    self.invalid(raw, format!("Must be a whole number of {}.", self.kind))
                })?;
                self.check_range(raw, n as f64)?;
                let duration = match self.kind {
                    FlagKind::Milliseconds => Duration::from_millis(n),
                    FlagKind::Seconds => Duration::from_secs(n),
                    _ => Duration::from_secs(n.saturating_mul(60)),
                };
                Ok(FlagValue::Duration(duration))
            }
            FlagKind::Version => {
                if VERSION_RE.is_match(raw) {
                    Ok(FlagValue::String(raw.to_string()))
                } else {
                    Err(self.invalid(raw, "Must be a dotted numeric version, e.g. 1.2.3."))
                }
            }
            FlagKind::Enum => {
                if self.options.iter().any(|o| o == raw) {
                    Ok(FlagValue::String(raw.to_string()))
                } else {
                    Err(self.invalid(raw, format!("Must be one of: {}.", self.options.join(", "))))
                }
            }
            FlagKind::Array => self.convert_array(raw),
            FlagKind::Date => parse_date(raw).map(FlagValue::Date).ok_or_else(|| {
                self.invalid(raw, "Must be a date formatted as YYYY-MM-DD, e.g. 2024-01-31.")
            }),
            FlagKind::Datetime => parse_datetime(raw).map(FlagValue::DateTime).ok_or_else(|| {
                self.invalid(
                    raw,
                    "Must be an ISO-8601 date-time, e.g. 2024-01-31T13:45:00Z.",
                )
            }),
            FlagKind::Url => {
                if URL_RE.is_match(raw) {
                    Ok(FlagValue::String(raw.to_string()))
                } else {
                    Err(self.invalid(raw, "Must be an absolute URL, e.g. https://example.com."))
                }
            }
            FlagKind::Email => {
                if EMAIL_RE.is_match(raw) {
                    Ok(FlagValue::String(raw.to_string()))
                } else {
                    Err(self.invalid(raw, "Must be a valid email address."))
                }
            }
            FlagKind::Id => {
                if ID_RE.is_match(raw) {
                    Ok(FlagValue::String(raw.to_string()))
                } else {
                    Err(self.invalid(raw, "Must be a valid 15 or 18 character ID."))
                }
            }
            FlagKind::Filepath | FlagKind::Directory => {
                if raw.is_empty() || PATH_BLACKLIST_RE.is_match(raw) {
                    let what = if self.kind == FlagKind::Filepath {
                        "file path"
                    } else {
                        "directory path"
                    };
                    Err(self.invalid(
                        raw,
                        format!("Must be a valid {what} without <, >, \", |, ? or *."),
                    ))
                } else {
                    Ok(FlagValue::Path(PathBuf::from(raw)))
                }
            }
            FlagKind::Option => match &self.parse {
                Some(parse) => parse(raw).map_err(|hint| self.invalid(raw, hint)),
                None => Ok(FlagValue::String(raw.to_string())),
            },
        }
    }

    fn convert_array(&self, raw: &str) -> Result<FlagValue, FlagValueError> {
        let mut items = Vec::new();
        for part in raw.split(self.delimiter).map(str::trim) {
            if !self.options.is_empty() && !self.options.iter().any(|o| o == part) {
                return Err(self.invalid(
                    raw,
                    format!(
                        "Element \"{part}\" must be one of: {}.",
                        self.options.join(", ")
                    ),
                ));
            }
            let item = match &self.map {
                Some(map) => map(part).map_err(|hint| self.invalid(raw, hint))?,
                None => FlagValue::String(part.to_string()),
            };
            items.push(item);
        }
        Ok(FlagValue::Array(items))
    }

    fn check_range(&self, raw: &str, n: f64) -> Result<(), FlagValueError> {
        let below = self.min.is_some_and(|min| n < min);
        let above = self.max.is_some_and(|max| n > max);
        if !below && !above {
            return Ok(());
        }
        let hint = match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Must be between {min} and {max}."),
            (Some(min), None) => format!("Must be at least {min}."),
            (None, Some(max)) => format!("Must be at most {max}."),
            (None, None) => return Ok(()),
        };
        Err(self.invalid(raw, hint))
    }

    fn invalid(&self, raw: &str, hint: impl Into<String>) -> FlagValueError {
        FlagValueError::InvalidFlagType {
            flag: self.name.clone(),
            value: raw.to_string(),
            kind: self.kind,
            hint: hint.into(),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))?;
    Some(Utc.from_utc_datetime(&naive).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint_of(err: FlagValueError) -> String {
        match err {
            FlagValueError::InvalidFlagType { hint, .. } => hint,
        }
    }

    #[test]
    fn test_array_default_delimiter() {
        let flag = FlagDefinition::array("names", "d");
        assert_eq!(
            flag.convert("1,2,3").unwrap(),
            FlagValue::Array(vec!["1".into(), "2".into(), "3".into()])
        );
    }

    #[test]
    fn test_array_integer_mapper() {
        let flag = FlagDefinition::array("ids", "d").with_mapper(|raw| {
            raw.parse::<i64>()
                .map(FlagValue::Integer)
                .map_err(|e| e.to_string())
        });
        assert_eq!(
            flag.convert("1,2,3").unwrap(),
            FlagValue::Array(vec![
                FlagValue::Integer(1),
                FlagValue::Integer(2),
                FlagValue::Integer(3)
            ])
        );
        assert!(flag.convert("1,x").is_err());
    }

    #[test]
    fn test_array_custom_delimiter_and_options() {
        let flag = FlagDefinition::array("colors", "d")
            .with_delimiter(';')
            .with_options(["red", "blue"]);
        assert_eq!(
            flag.convert("red; blue").unwrap(),
            FlagValue::Array(vec!["red".into(), "blue".into()])
        );
        let hint = hint_of(flag.convert("red;green").unwrap_err());
        assert!(hint.contains("green"));
    }

    #[test]
    fn test_integer_and_number() {
        let int = FlagDefinition::integer("n", "d");
        assert_eq!(int.convert("42").unwrap(), FlagValue::Integer(42));
        assert!(int.convert("4.2").is_err());

        let num = FlagDefinition::number("x", "d");
        assert_eq!(num.convert("4.5").unwrap(), FlagValue::Number(4.5));
        assert!(num.convert("inf").is_err());
        assert!(num.convert("NaN").is_err());
    }

    #[test]
    fn test_range_bounds() {
        let flag = FlagDefinition::integer("wait", "d").with_range(Some(1.0), Some(10.0));
        assert!(flag.convert("5").is_ok());
        let hint = hint_of(flag.convert("11").unwrap_err());
        assert_eq!(hint, "Must be between 1 and 10.");
    }

    #[test]
    fn test_durations() {
        assert_eq!(
            FlagDefinition::minutes("wait", "d").convert("2").unwrap(),
            FlagValue::Duration(Duration::from_secs(120))
        );
        assert_eq!(
            FlagDefinition::milliseconds("poll", "d").convert("250").unwrap(),
            FlagValue::Duration(Duration::from_millis(250))
        );
        assert!(FlagDefinition::seconds("t", "d").convert("-1").is_err());
    }

    #[test]
    fn test_enum_membership() {
        let flag = FlagDefinition::enumeration("format", "d", ["json", "csv"]);
        assert_eq!(flag.convert("csv").unwrap(), FlagValue::String("csv".into()));
        let err = flag.convert("xml").unwrap_err();
        assert!(matches!(
            &err,
            FlagValueError::InvalidFlagType { kind: FlagKind::Enum, value, .. } if value == "xml"
        ));
    }

    #[test]
    fn test_dates() {
        let date = FlagDefinition::date("since", "d");
        assert_eq!(
            date.convert("2024-01-31").unwrap(),
            FlagValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        let hint = hint_of(date.convert("31st of January").unwrap_err());
        assert!(hint.contains("YYYY-MM-DD"));

        let datetime = FlagDefinition::datetime("at", "d");
        let FlagValue::DateTime(dt) = datetime.convert("2024-01-31T13:45:00Z").unwrap() else {
            panic!("expected a datetime");
        };
        assert_eq!(dt.to_rfc3339(), "2024-01-31T13:45:00+00:00");
        assert!(datetime.convert("2024-01-31 13:45:00").is_ok());
        assert!(datetime.convert("yesterday").is_err());
    }

    #[test]
    fn test_named_predicates() {
        let url = FlagDefinition::url("endpoint", "d");
        assert!(url.convert("https://example.com/path?q=1").is_ok());
        assert!(url.convert("example.com").is_err());

        let email = FlagDefinition::email("to", "d");
        assert!(email.convert("dev@example.com").is_ok());
        assert!(email.convert("dev@example").is_err());

        let id = FlagDefinition::id("record", "d");
        assert!(id.convert("00D000000000001").is_ok());
        assert!(id.convert("00D000000000001AAA").is_ok());
        assert!(id.convert("00D0000000000").is_err());

        let path = FlagDefinition::filepath("file", "d");
        assert_eq!(
            path.convert("src/main.rs").unwrap(),
            FlagValue::Path(PathBuf::from("src/main.rs"))
        );
        assert!(path.convert("bad|name").is_err());
        assert!(FlagDefinition::directory("dir", "d").convert("out*").is_err());
    }

    #[test]
    fn test_custom_option_and_string_validator() {
        let flag = FlagDefinition::option("size", "d", |raw| match raw {
            "s" | "m" | "l" => Ok(FlagValue::Json(serde_json::json!({ "size": raw }))),
            _ => Err("pick s, m or l".to_string()),
        });
        assert_eq!(
            flag.convert("m").unwrap().to_json(),
            serde_json::json!({ "size": "m" })
        );
        assert_eq!(hint_of(flag.convert("xl").unwrap_err()), "pick s, m or l");

        let upper = FlagDefinition::string("code", "d").with_parser(|raw| {
            if raw.chars().all(|c| c.is_ascii_uppercase()) {
                Ok(FlagValue::from(raw))
            } else {
                Err("Must be uppercase.".to_string())
            }
        });
        assert!(upper.convert("ABC").is_ok());
        assert!(upper.convert("abc").is_err());
    }

    #[test]
    fn test_duration_serializes_as_millis() {
        let value = FlagValue::Duration(Duration::from_secs(2));
        assert_eq!(value.to_json(), serde_json::json!(2000));
    }
}
