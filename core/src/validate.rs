//! Flag declaration validation.
//!
//! Checks the structural invariants of declared flags before they enter a
//! [`FlagSet`](crate::FlagSet): name pattern, char shape and uniqueness,
//! description presence, long description format, and relations that name
//! the flag itself. Validation stops at
//! the first violation, since each one is an author error to fix in code.
//!
//! # Examples
//!
//! ```
//! use command_kit_core::*;
//!
//! let ok = FlagDefinition::string("target-dir", "where output goes").with_char('d');
//! assert!(validate_flag(&ok).is_ok());
//!
//! let bad = FlagDefinition::string("TargetDir", "where output goes");
//! assert_eq!(
//!     validate_flag(&bad),
//!     Err(FlagDefinitionError::InvalidFlagName("TargetDir".into()))
//! );
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::FlagDefinitionError;
use crate::types::FlagDefinition;

static FLAG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("static regex must compile"));

/// Validates a single declared flag.
pub fn validate_flag(flag: &FlagDefinition) -> Result<(), FlagDefinitionError> {
    if !FLAG_NAME_RE.is_match(&flag.name) {
        return Err(FlagDefinitionError::InvalidFlagName(flag.name.clone()));
    }

    if let Some(short) = flag.short {
        if !short.is_ascii_alphabetic() {
            return Err(FlagDefinitionError::InvalidFlagChar {
                flag: flag.name.clone(),
                short,
                reason: "must be a single alphabetic character".to_string(),
            });
        }
    }

    if flag.description.trim().is_empty() {
        return Err(FlagDefinitionError::MissingOrInvalidFlagDescription(
            flag.name.clone(),
        ));
    }

    if flag
        .long_description
        .as_deref()
        .is_some_and(|long| long.trim().is_empty())
    {
        return Err(FlagDefinitionError::InvalidLongDescriptionFormat(
            flag.name.clone(),
        ));
    }

    let relations = [("depends_on", &flag.depends_on), ("exclusive", &flag.exclusive)];
    for (relation, names) in relations {
        if names.iter().any(|name| *name == flag.name) {
            return Err(FlagDefinitionError::SelfReferencingRelation {
                flag: flag.name.clone(),
                relation: relation.to_string(),
            });
        }
    }

    Ok(())
}

/// Checks names and chars are unique across a set of flags.
///
/// Chars compare case-sensitively, so `-f` and `-F` may coexist.
pub fn validate_unique(flags: &[FlagDefinition]) -> Result<(), FlagDefinitionError> {
    let mut names = HashSet::new();
    let mut chars = HashSet::new();

    for flag in flags {
        if !names.insert(flag.name.as_str()) {
            return Err(FlagDefinitionError::DuplicateFlagName(flag.name.clone()));
        }
        if let Some(short) = flag.short {
            if !chars.insert(short) {
                return Err(FlagDefinitionError::InvalidFlagChar {
                    flag: flag.name.clone(),
                    short,
                    reason: "already used by another flag".to_string(),
                });
            }
        }
    }

    Ok(())
}
