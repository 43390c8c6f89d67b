//! Deprecation notices for commands and flags.

use std::fmt;

use serde::Serialize;

/// What a deprecation notice is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeprecatedSubject {
    Command,
    Flag,
}

impl fmt::Display for DeprecatedSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Flag => f.write_str("flag"),
        }
    }
}

/// Either the version the subject goes away in, or a full replacement
/// message. Exactly one of the two is carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Removal {
    Version(String),
    MessageOverride(String),
}

/// Deprecation metadata for a command or flag.
///
/// # Examples
///
/// ```
/// use command_kit_core::{DeprecatedSubject, DeprecationNotice};
///
/// let notice = DeprecationNotice::removed_in("50.0").replaced_by("target-org");
/// assert_eq!(
///     notice.warning("username", DeprecatedSubject::Flag),
///     "The flag \"username\" has been deprecated and will be removed in v50.0 or later. Use \"target-org\" instead."
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecationNotice {
    pub removal: Removal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeprecationNotice {
    pub fn removed_in(version: impl Into<String>) -> Self {
        Self {
            removal: Removal::Version(version.into()),
            replacement: None,
            message: None,
        }
    }

    /// Notice whose warning text is `message` verbatim, plus any replacement
    /// and extra message.
    pub fn with_message_override(message: impl Into<String>) -> Self {
        Self {
            removal: Removal::MessageOverride(message.into()),
            replacement: None,
            message: None,
        }
    }

    pub fn replaced_by(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Formats the warning emitted when the subject is used.
    pub fn warning(&self, subject_name: &str, subject: DeprecatedSubject) -> String {
        let mut out = match &self.removal {
            Removal::MessageOverride(message) => message.clone(),
            Removal::Version(version) => format!(
                "The {subject} \"{subject_name}\" has been deprecated and will be removed in v{version} or later."
            ),
        };
        if let Some(replacement) = &self.replacement {
            out.push_str(&format!(" Use \"{replacement}\" instead."));
        }
        if let Some(message) = &self.message {
            out.push(' ');
            out.push_str(message);
        }
        out
    }
}
