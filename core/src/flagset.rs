//! Flag-set assembly.
//!
//! [`FlagSetBuilder`] merges a command's declared flags with the builtin
//! catalog into one validated, ordered [`FlagSet`]. The output order is
//! declared flags, then the credential flags the command opted into, then
//! `json` and `loglevel`. Usage synthesis relies on this order.

use serde::Serialize;
use tracing::debug;

use crate::builtin::BuiltinFlag;
use crate::error::FlagDefinitionError;
use crate::types::{FlagDefinition, FlagKind};
use crate::validate::{validate_flag, validate_unique};

/// Which org credentials a command can use or needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequirements {
    pub supports_username: bool,
    pub requires_username: bool,
    pub supports_devhub_username: bool,
    pub requires_devhub_username: bool,
}

impl CredentialRequirements {
    pub fn wants_username(&self) -> bool {
        self.supports_username || self.requires_username
    }

    pub fn wants_devhub_username(&self) -> bool {
        self.supports_devhub_username || self.requires_devhub_username
    }
}

/// Ordered, validated flags of one command type.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FlagSet {
    flags: Vec<FlagDefinition>,
}

impl FlagSet {
    pub fn get(&self, name: &str) -> Option<&FlagDefinition> {
        self.flags.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Finds the flag owning a short char.
    pub fn find_by_char(&self, short: char) -> Option<&FlagDefinition> {
        self.flags.iter().find(|f| f.short == Some(short))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlagDefinition> {
        self.flags.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.flags.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl<'a> IntoIterator for &'a FlagSet {
    type Item = &'a FlagDefinition;
    type IntoIter = std::slice::Iter<'a, FlagDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.iter()
    }
}

/// Builds a [`FlagSet`] from declared flags.
///
/// # Examples
///
/// ```
/// use command_kit_core::*;
///
/// let flags = FlagSetBuilder::new()
///     .flag(FlagDefinition::string("name", "who to greet").with_char('n'))
///     .flag(FlagDefinition::builtin("verbose"))
///     .credentials(CredentialRequirements {
///         supports_username: true,
///         ..Default::default()
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     flags.names(),
///     vec!["name", "verbose", "targetusername", "apiversion", "json", "loglevel"]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlagSetBuilder {
    declared: Vec<FlagDefinition>,
    credentials: CredentialRequirements,
}

impl FlagSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(mut self, flag: FlagDefinition) -> Self {
        self.declared.push(flag);
        self
    }

    pub fn flags(mut self, flags: impl IntoIterator<Item = FlagDefinition>) -> Self {
        self.declared.extend(flags);
        self
    }

    pub fn credentials(mut self, credentials: CredentialRequirements) -> Self {
        self.credentials = credentials;
        self
    }

    /// Validates and assembles the flag set.
    ///
    /// # Errors
    ///
    /// Returns the first [`FlagDefinitionError`] found, naming the offending
    /// flag.
    pub fn build(self) -> Result<FlagSet, FlagDefinitionError> {
        let mut flags = Vec::with_capacity(self.declared.len() + 5);

        for flag in self.declared {
            if BuiltinFlag::from_name(&flag.name).is_some_and(BuiltinFlag::is_always_present) {
                debug!(flag = %flag.name, "Ignoring declaration of always-present flag");
                continue;
            }
            let flag = if flag.kind == FlagKind::Builtin {
                resolve_builtin(flag)?
            } else {
                validate_flag(&flag)?;
                flag
            };
            flags.push(flag);
        }

        let conditional = [
            (self.credentials.wants_username(), BuiltinFlag::TargetUsername),
            (
                self.credentials.wants_devhub_username(),
                BuiltinFlag::TargetDevhubUsername,
            ),
            (
                self.credentials.wants_username() || self.credentials.wants_devhub_username(),
                BuiltinFlag::ApiVersion,
            ),
        ];
        for (wanted, builtin) in conditional {
            if wanted && !flags.iter().any(|f: &FlagDefinition| f.name == builtin.name()) {
                flags.push(builtin.definition());
            }
        }

        flags.push(BuiltinFlag::Json.definition());
        flags.push(BuiltinFlag::Loglevel.definition());

        validate_unique(&flags)?;

        Ok(FlagSet { flags })
    }
}

fn resolve_builtin(marker: FlagDefinition) -> Result<FlagDefinition, FlagDefinitionError> {
    let builtin = BuiltinFlag::from_name(&marker.name)
        .ok_or_else(|| FlagDefinitionError::UnknownBuiltinFlagType(marker.name.clone()))?;
    let mut flag = builtin.definition();
    if !marker.description.trim().is_empty() {
        flag.description = marker.description;
    }
    Ok(flag)
}
