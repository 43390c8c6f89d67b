//! Docopt-style usage grammar synthesized from a [`FlagSet`].
//!
//! Visible flags are bucketed into command-declared required, command-declared
//! optional, opt-in builtins, and the always-present `json`/`loglevel`, in
//! that order. Pairwise relationships are then folded into groups:
//! `depends_on` joins tokens with a space, `exclusive` joins them with ` | `.
//! A group is parenthesized when any participant is required and bracketed
//! otherwise. Only the first relationship of a flag that still has
//! ungrouped partners is honored, so chains (`a` needs `b`, `b` needs `c`)
//! are not followed past one hop.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::builtin::BuiltinFlag;
use crate::flagset::FlagSet;
use crate::types::{FlagDefinition, FlagKind};
use crate::varargs::VarargsConfig;

/// How the tokens of a multi-flag group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// All together (`depends_on`).
    And,
    /// One of (`exclusive`).
    Xor,
}

/// One emitted element of the usage line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageGroup {
    /// Flag names in emission order; the first one initiated the group.
    pub members: Vec<String>,
    pub tokens: Vec<String>,
    pub combinator: Option<Combinator>,
    pub required: bool,
}

impl UsageGroup {
    fn single(flag: &FlagDefinition) -> Self {
        Self {
            members: vec![flag.name.clone()],
            tokens: vec![flag_token(flag)],
            combinator: None,
            required: flag.required,
        }
    }

    fn join(&mut self, flag: &FlagDefinition) {
        self.members.push(flag.name.clone());
        self.tokens.push(flag_token(flag));
        self.required |= flag.required;
    }
}

impl fmt::Display for UsageGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = match self.combinator {
            Some(Combinator::Xor) => " | ",
            _ => " ",
        };
        let inner = self.tokens.join(separator);
        match (self.combinator.is_some(), self.required) {
            (false, true) => f.write_str(&inner),
            (true, true) => write!(f, "({inner})"),
            (_, false) => write!(f, "[{inner}]"),
        }
    }
}

/// Failure while grouping; never surfaces past [`synthesize_usage`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("flag {flag} references unknown flag {related}")]
    UnknownRelation { flag: String, related: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    DeclaredRequired,
    DeclaredOptional,
    OptInBuiltin,
    AlwaysPresent,
}

fn bucket_of(flag: &FlagDefinition) -> Bucket {
    if BuiltinFlag::from_name(&flag.name).is_some_and(BuiltinFlag::is_always_present) {
        Bucket::AlwaysPresent
    } else if flag.builtin {
        Bucket::OptInBuiltin
    } else if flag.required {
        Bucket::DeclaredRequired
    } else {
        Bucket::DeclaredOptional
    }
}

/// Renders `-c <kind>`, `--name <kind>`, `-c a|b|c`, or a bare `-c` for
/// booleans.
pub fn flag_token(flag: &FlagDefinition) -> String {
    let name = flag.display_name();
    match flag.kind {
        FlagKind::Boolean => name,
        FlagKind::Enum => format!("{name} {}", flag.options.join("|")),
        kind => format!("{name} <{kind}>"),
    }
}

/// Folds the visible flags into usage groups in emission order.
///
/// # Errors
///
/// [`UsageError::UnknownRelation`] when a relationship names a flag that is
/// not in the set.
pub fn group_flags(flags: &FlagSet) -> Result<Vec<UsageGroup>, UsageError> {
    let mut ordered: Vec<&FlagDefinition> = flags.iter().filter(|f| !f.hidden).collect();
    ordered.sort_by_key(|f| bucket_of(f));

    // Pass one: decide which flags initiate a group and which are absorbed.
    let mut grouped: HashSet<&str> = HashSet::new();
    let mut initiated: Vec<(&str, UsageGroup)> = Vec::new();
    for flag in &ordered {
        if grouped.contains(flag.name.as_str()) {
            continue;
        }
        let relations = [
            (Combinator::And, &flag.depends_on),
            (Combinator::Xor, &flag.exclusive),
        ];
        for (combinator, related) in relations {
            let mut partners = Vec::new();
            for name in related {
                let partner = flags.get(name).ok_or_else(|| UsageError::UnknownRelation {
                    flag: flag.name.clone(),
                    related: name.clone(),
                })?;
                if partner.hidden || partner.name == flag.name || grouped.contains(name.as_str()) {
                    continue;
                }
                partners.push(partner);
            }
            if partners.is_empty() {
                continue;
            }

            let mut group = UsageGroup::single(flag);
            group.combinator = Some(combinator);
            grouped.insert(flag.name.as_str());
            for partner in partners {
                grouped.insert(partner.name.as_str());
                group.join(partner);
            }
            initiated.push((flag.name.as_str(), group));
            break;
        }
    }

    // Pass two: emit groups at their initiator's position, singles elsewhere.
    let mut groups = Vec::with_capacity(ordered.len());
    for flag in &ordered {
        if let Some(index) = initiated.iter().position(|(name, _)| *name == flag.name) {
            groups.push(initiated.swap_remove(index).1);
        } else if !grouped.contains(flag.name.as_str()) {
            groups.push(UsageGroup::single(flag));
        }
    }

    Ok(groups)
}

/// Synthesizes the usage line for a flag set.
///
/// Never fails: an internal grouping error yields an empty string so help
/// rendering cannot abort a command.
///
/// # Examples
///
/// ```
/// use command_kit_core::*;
///
/// let flags = FlagSetBuilder::new()
///     .flag(FlagDefinition::string("file", "input file").with_char('f').required())
///     .flag(FlagDefinition::boolean("force", "skip prompts"))
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     synthesize_usage(&flags, &VarargsConfig::optional()),
///     "[name=value...] -f <string> [--force] [--json] \
///      [--loglevel trace|debug|info|warn|error|fatal|TRACE|DEBUG|INFO|WARN|ERROR|FATAL]"
/// );
/// ```
pub fn synthesize_usage(flags: &FlagSet, varargs: &VarargsConfig) -> String {
    match group_flags(flags) {
        Ok(groups) => varargs
            .placeholder()
            .map(str::to_string)
            .into_iter()
            .chain(groups.iter().map(ToString::to_string))
            .collect::<Vec<_>>()
            .join(" "),
        Err(err) => {
            debug!(error = %err, "Usage synthesis failed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flagset::{CredentialRequirements, FlagSetBuilder};

    const LOGLEVEL: &str =
        "[--loglevel trace|debug|info|warn|error|fatal|TRACE|DEBUG|INFO|WARN|ERROR|FATAL]";

    fn build(flags: Vec<FlagDefinition>) -> FlagSet {
        FlagSetBuilder::new().flags(flags).build().unwrap()
    }

    #[test]
    fn test_required_string_flag_is_bare() {
        let flags = build(vec![
            FlagDefinition::string("file", "d").with_char('f').required(),
        ]);
        let usage = synthesize_usage(&flags, &VarargsConfig::Disabled);
        assert!(usage.starts_with("-f <string> "), "{usage}");
        assert!(!usage.contains("[-f <string>]"));
    }

    #[test]
    fn test_optional_boolean_flag_is_bracketed() {
        let flags = build(vec![FlagDefinition::boolean("force", "d").with_char('f')]);
        let usage = synthesize_usage(&flags, &VarargsConfig::Disabled);
        assert!(usage.contains("[-f]"), "{usage}");
    }

    #[test]
    fn test_depends_on_groups_with_required_partner() {
        let flags = build(vec![
            FlagDefinition::string("a", "d").with_char('s').required(),
            FlagDefinition::string("b", "d").with_char('f').depends_on(["a"]),
        ]);
        let usage = synthesize_usage(&flags, &VarargsConfig::Disabled);
        assert_eq!(usage, format!("(-f <string> -s <string>) [--json] {LOGLEVEL}"));
    }

    #[test]
    fn test_exclusive_optional_pair_is_bracketed() {
        let flags = build(vec![
            FlagDefinition::filepath("file", "d").with_char('f').exclusive(["url"]),
            FlagDefinition::url("url", "d"),
        ]);
        let usage = synthesize_usage(&flags, &VarargsConfig::Disabled);
        assert!(usage.starts_with("[-f <filepath> | --url <url>] "), "{usage}");
        assert!(!usage.contains("[--url <url>] "));
    }

    #[test]
    fn test_enum_renders_options() {
        let flags = build(vec![
            FlagDefinition::enumeration("format", "d", ["json", "csv"]).required(),
        ]);
        let usage = synthesize_usage(&flags, &VarargsConfig::Disabled);
        assert!(usage.starts_with("--format json|csv "), "{usage}");
    }

    #[test]
    fn test_bucket_order_and_hidden() {
        let flags = FlagSetBuilder::new()
            .flag(FlagDefinition::boolean("opt", "d"))
            .flag(FlagDefinition::builtin("verbose"))
            .flag(FlagDefinition::string("secret", "d").hidden())
            .flag(FlagDefinition::string("req", "d").required())
            .credentials(CredentialRequirements {
                supports_username: true,
                ..Default::default()
            })
            .build()
            .unwrap();

        let usage = synthesize_usage(&flags, &VarargsConfig::required());
        assert_eq!(
            usage,
            format!(
                "name=value... --req <string> [--opt] [--verbose] [-u <string>] \
                 [--apiversion <string>] [--json] {LOGLEVEL}"
            )
        );
        assert!(!usage.contains("secret"));
    }

    #[test]
    fn test_chains_stop_after_one_hop() {
        let flags = build(vec![
            FlagDefinition::string("a", "d").depends_on(["b"]),
            FlagDefinition::string("b", "d").depends_on(["c"]),
            FlagDefinition::string("c", "d"),
        ]);
        let groups = group_flags(&flags).unwrap();
        assert_eq!(groups[0].members, vec!["a", "b"]);
        assert_eq!(groups[1].members, vec!["c"]);
        assert_eq!(groups[0].to_string(), "[--a <string> --b <string>]");
        assert_eq!(groups[1].to_string(), "[--c <string>]");
    }

    #[test]
    fn test_flag_uses_only_first_relationship() {
        let flags = build(vec![
            FlagDefinition::string("a", "d").depends_on(["b"]).exclusive(["c"]),
            FlagDefinition::string("b", "d"),
            FlagDefinition::string("c", "d"),
        ]);
        let groups = group_flags(&flags).unwrap();
        assert_eq!(groups[0].combinator, Some(Combinator::And));
        assert_eq!(groups[0].members, vec!["a", "b"]);
        assert_eq!(groups[1].members, vec!["c"]);
    }

    #[test]
    fn test_unknown_relation_yields_empty_usage() {
        let flags = build(vec![FlagDefinition::string("a", "d").depends_on(["ghost"])]);
        assert!(matches!(
            group_flags(&flags),
            Err(UsageError::UnknownRelation { .. })
        ));
        assert_eq!(synthesize_usage(&flags, &VarargsConfig::optional()), "");
    }

    #[test]
    fn test_usage_is_idempotent() {
        let flags = build(vec![
            FlagDefinition::string("a", "d").with_char('s').required(),
            FlagDefinition::string("b", "d").with_char('f').exclusive(["a"]),
            FlagDefinition::integer("count", "d"),
        ]);
        let varargs = VarargsConfig::optional();
        let first = synthesize_usage(&flags, &varargs);
        assert_eq!(first, synthesize_usage(&flags, &varargs));
        assert_eq!(first, synthesize_usage(&flags, &varargs));
    }

    #[test]
    fn test_zero_declared_flags_usage() {
        let flags = build(Vec::new());
        assert_eq!(
            synthesize_usage(&flags, &VarargsConfig::Disabled),
            format!("[--json] {LOGLEVEL}")
        );
    }
}
