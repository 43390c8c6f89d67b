//! Per-invocation state handed to business logic.

use std::collections::{BTreeMap, BTreeSet};

use command_kit_core::FlagValue;
use serde_json::{Map, Value};

use crate::loglevel::LogLevel;
use crate::output::{OutputSink, TableColumn};
use crate::resolve::{OrgHandle, ProjectHandle};

/// Everything a command sees while running. Owned by one invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub id: String,
    pub flags: BTreeMap<String, FlagValue>,
    pub supplied: BTreeSet<String>,
    pub args: BTreeMap<String, String>,
    pub varargs: BTreeMap<String, String>,
    pub is_json: bool,
    pub log_level: LogLevel,
    pub org: Option<OrgHandle>,
    pub hub_org: Option<OrgHandle>,
    pub project: Option<ProjectHandle>,
    pub warnings: Vec<String>,
    /// Warnings already written to the sink.
    flushed: usize,
    pub exit_code: i32,
}

impl CommandContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    /// False when the flag is absent or not a boolean.
    pub fn flag_bool(&self, name: &str) -> bool {
        self.flag(name).and_then(FlagValue::as_bool).unwrap_or(false)
    }

    pub fn flag_str(&self, name: &str) -> Option<&str> {
        self.flag(name).and_then(FlagValue::as_str)
    }

    /// Whether the flag was given on the command line rather than defaulted.
    pub fn was_supplied(&self, name: &str) -> bool {
        self.supplied.contains(name)
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }

    pub fn vararg(&self, name: &str) -> Option<&str> {
        self.varargs.get(name).map(String::as_str)
    }

    /// Queues a non-fatal warning. Warnings are shown on stderr in human mode
    /// and included in the JSON document in JSON mode.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Writes queued warnings to the sink, once each. No-op in JSON mode.
    pub(crate) fn flush_warnings(&mut self, out: &mut dyn OutputSink) {
        if self.is_json {
            return;
        }
        for warning in &self.warnings[self.flushed..] {
            out.warn(warning);
        }
        self.flushed = self.warnings.len();
    }

    /// Drains the warnings collected during this invocation.
    pub(crate) fn take_warnings(&mut self) -> Vec<String> {
        self.flushed = 0;
        std::mem::take(&mut self.warnings)
    }

    /// Flags and varargs as one JSON object; varargs win on name clashes.
    pub fn merged_flags_json(&self) -> Value {
        let mut merged: Map<String, Value> = self
            .flags
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        for (name, value) in &self.varargs {
            merged.insert(name.clone(), Value::String(value.clone()));
        }
        Value::Object(merged)
    }
}

/// Value returned by a command plus how to display it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub data: Value,
    pub table_columns: Vec<TableColumn>,
}

impl CommandResult {
    pub fn new(data: Value, table_columns: Vec<TableColumn>) -> Self {
        Self {
            data,
            table_columns,
        }
    }

    /// Default human rendering.
    ///
    /// With table columns set, a non-empty array renders as a table and any
    /// other value prints `No results found.`. Without columns nothing is
    /// printed; commands that want output log it themselves or override
    /// [`Command::display`](crate::Command::display).
    ///
    /// # Examples
    ///
    /// ```
    /// use command_kit_runtime::{BufferedSink, CommandResult, TableColumn};
    /// use serde_json::json;
    ///
    /// let mut out = BufferedSink::new();
    /// CommandResult::new(json!([]), vec![TableColumn::from("id")]).display(&mut out);
    /// assert_eq!(out.stdout, vec!["No results found."]);
    /// ```
    pub fn display(&self, out: &mut dyn OutputSink) {
        if self.table_columns.is_empty() {
            return;
        }
        match &self.data {
            Value::Array(rows) if !rows.is_empty() => out.table(rows, &self.table_columns),
            _ => out.log("No results found."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BufferedSink;
    use serde_json::json;

    #[test]
    fn test_flag_accessors() {
        let mut ctx = CommandContext::new("hello");
        ctx.flags.insert("name".into(), FlagValue::from("Ada"));
        ctx.flags.insert("loud".into(), FlagValue::Bool(true));
        assert_eq!(ctx.flag_str("name"), Some("Ada"));
        assert!(ctx.flag_bool("loud"));
        assert!(!ctx.flag_bool("name"));
        assert!(!ctx.flag_bool("missing"));
    }

    #[test]
    fn test_merged_flags_include_varargs() {
        let mut ctx = CommandContext::new("env:set");
        ctx.flags.insert("json".into(), FlagValue::Bool(true));
        ctx.varargs.insert("region".into(), "eu".into());
        assert_eq!(
            ctx.merged_flags_json(),
            json!({ "json": true, "region": "eu" })
        );
    }

    #[test]
    fn test_flush_warnings_once() {
        let mut ctx = CommandContext::new("x");
        let mut out = BufferedSink::new();
        ctx.warn("first");
        ctx.flush_warnings(&mut out);
        ctx.warn("second");
        ctx.flush_warnings(&mut out);
        assert_eq!(out.stderr, vec!["WARNING: first", "WARNING: second"]);
        assert_eq!(ctx.take_warnings().len(), 2);
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn test_json_mode_keeps_warnings_off_sink() {
        let mut ctx = CommandContext::new("x");
        ctx.is_json = true;
        let mut out = BufferedSink::new();
        ctx.warn("quiet");
        ctx.flush_warnings(&mut out);
        assert!(out.stderr.is_empty());
        assert_eq!(ctx.warnings, vec!["quiet"]);
    }

    #[test]
    fn test_display_renders_table_for_rows() {
        let mut out = BufferedSink::new();
        CommandResult::new(json!([{ "id": "a1" }]), vec![TableColumn::new("id", "Id")])
            .display(&mut out);
        assert_eq!(out.stdout[0], "Id");
        assert_eq!(out.stdout[2], "a1");
    }

    #[test]
    fn test_display_without_columns_prints_nothing() {
        let mut out = BufferedSink::new();
        CommandResult::new(json!([1, 2]), Vec::new()).display(&mut out);
        assert!(out.stdout.is_empty());
    }
}
