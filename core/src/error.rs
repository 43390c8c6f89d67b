//! Error types for flag definitions, flag values and varargs.
//!
//! [`FlagDefinitionError`] is an author error raised while a command's flag
//! set is assembled. [`FlagValueError`] and [`VarargsError`] are raised per
//! invocation while user input is bound.

use thiserror::Error;

use crate::types::FlagKind;

/// Invalid flag declaration, reported when the flag set is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagDefinitionError {
    /// Name does not match `^[a-z][a-z0-9-]*$`.
    #[error("invalid flag name \"{0}\": must start with a lowercase letter and contain only lowercase letters, digits and dashes")]
    InvalidFlagName(String),
    /// Char is not a single ASCII letter, or is already taken by another flag.
    #[error("invalid char '{short}' for flag {flag}: {reason}")]
    InvalidFlagChar {
        flag: String,
        short: char,
        reason: String,
    },
    /// Description is empty or whitespace-only.
    #[error("missing or invalid description for flag {0}")]
    MissingOrInvalidFlagDescription(String),
    /// Long description is present but blank.
    #[error("invalid long description format for flag {0}")]
    InvalidLongDescriptionFormat(String),
    /// Builtin marker names a flag outside the catalog.
    #[error("unknown builtin flag type: {0}")]
    UnknownBuiltinFlagType(String),
    /// Two flags in the same set share a name.
    #[error("duplicate flag name: {0}")]
    DuplicateFlagName(String),
    /// `depends_on` or `exclusive` lists the flag itself.
    #[error("flag {flag} cannot reference itself in {relation}")]
    SelfReferencingRelation { flag: String, relation: String },
}

/// Raw flag value that failed conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagValueError {
    #[error("the value \"{value}\" is not a valid {kind} for flag --{flag}. {hint}")]
    InvalidFlagType {
        flag: String,
        value: String,
        kind: FlagKind,
        hint: String,
    },
}

impl FlagValueError {
    /// Name of the flag the value was bound to.
    pub fn flag(&self) -> &str {
        match self {
            Self::InvalidFlagType { flag, .. } => flag,
        }
    }
}

/// Malformed or missing `name=value` trailing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarargsError {
    #[error("Please provide required name=value pairs for the command.")]
    VarargsRequired,
    #[error("Setting variables must be in the format <key>=<value> but found \"{0}\".")]
    InvalidVarargsFormat(String),
    #[error("Cannot set variable name \"{0}\" twice for the same command.")]
    DuplicateVararg(String),
    /// Rejected by the command's own validator.
    #[error("invalid value for {key}: {message}")]
    Validation { key: String, message: String },
}
