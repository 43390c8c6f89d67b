//! Typed flag schema, flag-set assembly and usage synthesis.
//!
//! This crate defines the declarative side of a command framework:
//!
//! - [`FlagDefinition`] — one tagged definition per flag, created through a
//!   per-kind constructor and converted from raw tokens with
//!   [`FlagDefinition::convert`].
//! - [`FlagSetBuilder`] — merges declared flags with the [`BuiltinFlag`]
//!   catalog into an ordered, validated [`FlagSet`].
//! - [`synthesize_usage`] — renders a flag set and a [`VarargsConfig`] into a
//!   one-line docopt-style usage grammar.
//! - [`VarargsConfig::parse`] — partitions trailing `name=value` tokens.
//!
//! Declaration problems surface as [`FlagDefinitionError`] when the set is
//! built; bad user input surfaces as [`FlagValueError`] or [`VarargsError`].
//!
//! # Example
//!
//! ```
//! use command_kit_core::*;
//!
//! let flags = FlagSetBuilder::new()
//!     .flag(FlagDefinition::string("name", "who to greet").with_char('n').required())
//!     .flag(FlagDefinition::integer("times", "repeat count").with_default(1i64))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(flags.names(), vec!["name", "times", "json", "loglevel"]);
//! assert!(synthesize_usage(&flags, &VarargsConfig::Disabled).starts_with("-n <string> [--times <integer>]"));
//! assert_eq!(flags.get("times").unwrap().convert("3").unwrap(), FlagValue::Integer(3));
//! ```

mod builtin;
mod deprecation;
mod error;
mod flagset;
mod types;
mod usage;
mod validate;
mod value;
mod varargs;

pub use builtin::{BuiltinFlag, DEFAULT_LOG_LEVEL, LOG_LEVELS};
pub use deprecation::{DeprecatedSubject, DeprecationNotice, Removal};
pub use error::{FlagDefinitionError, FlagValueError, VarargsError};
pub use flagset::{CredentialRequirements, FlagSet, FlagSetBuilder};
pub use types::*;
pub use usage::{Combinator, UsageError, UsageGroup, flag_token, group_flags, synthesize_usage};
pub use validate::{validate_flag, validate_unique};
pub use value::FlagValue;
pub use varargs::{VarargValidator, VarargsConfig};
