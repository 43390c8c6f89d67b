//! Output sinks for human and JSON output.
//!
//! The lifecycle writes everything through an [`OutputSink`]. [`ConsoleSink`]
//! writes to the process streams; [`BufferedSink`] keeps lines in memory for
//! hosts that post-process output and for tests.

use serde::Serialize;
use serde_json::Value;

/// Process stream a line or document is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One column of a result table: the row key to read and its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableColumn {
    pub key: String,
    pub label: String,
}

impl TableColumn {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

impl From<&str> for TableColumn {
    fn from(key: &str) -> Self {
        Self::new(key, key)
    }
}

impl From<(&str, &str)> for TableColumn {
    fn from((key, label): (&str, &str)) -> Self {
        Self::new(key, label)
    }
}

/// Display primitives used by the lifecycle and by result display routines.
pub trait OutputSink {
    fn log(&mut self, line: &str);
    fn warn(&mut self, line: &str);
    fn error(&mut self, line: &str);
    fn table(&mut self, rows: &[Value], columns: &[TableColumn]);
    fn json(&mut self, document: &Value, stream: OutputStream);
}

/// Writes to stdout/stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn log(&mut self, line: &str) {
        println!("{line}");
    }

    fn warn(&mut self, line: &str) {
        eprintln!("WARNING: {line}");
    }

    fn error(&mut self, line: &str) {
        eprintln!("{line}");
    }

    fn table(&mut self, rows: &[Value], columns: &[TableColumn]) {
        print!("{}", render_table(rows, columns));
    }

    fn json(&mut self, document: &Value, stream: OutputStream) {
        let text = serde_json::to_string_pretty(document).unwrap_or_else(|_| document.to_string());
        match stream {
            OutputStream::Stdout => println!("{text}"),
            OutputStream::Stderr => eprintln!("{text}"),
        }
    }
}

/// Collects output lines in memory, split by stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedSink {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_text(&self) -> String {
        self.stdout.join("\n")
    }

    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }

    fn push(&mut self, stream: OutputStream, text: &str) {
        let target = match stream {
            OutputStream::Stdout => &mut self.stdout,
            OutputStream::Stderr => &mut self.stderr,
        };
        target.extend(text.lines().map(str::to_string));
    }
}

impl OutputSink for BufferedSink {
    fn log(&mut self, line: &str) {
        self.push(OutputStream::Stdout, line);
    }

    fn warn(&mut self, line: &str) {
        self.push(OutputStream::Stderr, &format!("WARNING: {line}"));
    }

    fn error(&mut self, line: &str) {
        if line.is_empty() {
            self.stderr.push(String::new());
        } else {
            self.push(OutputStream::Stderr, line);
        }
    }

    fn table(&mut self, rows: &[Value], columns: &[TableColumn]) {
        let rendered = render_table(rows, columns);
        self.push(OutputStream::Stdout, &rendered);
    }

    fn json(&mut self, document: &Value, stream: OutputStream) {
        let text = serde_json::to_string_pretty(document).unwrap_or_else(|_| document.to_string());
        self.push(stream, &text);
    }
}

/// Renders rows as a padded text table with a header and a rule.
///
/// # Examples
///
/// ```
/// use command_kit_runtime::{TableColumn, render_table};
/// use serde_json::json;
///
/// let rows = vec![json!({ "name": "ada", "age": 36 }), json!({ "name": "grace" })];
/// let columns = vec![TableColumn::new("name", "Name"), TableColumn::new("age", "Age")];
/// assert_eq!(
///     render_table(&rows, &columns),
///     "Name   Age\n─────  ───\nada    36\ngrace\n"
/// );
/// ```
pub fn render_table(rows: &[Value], columns: &[TableColumn]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell_text(row.get(&c.key))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<&str> = columns.iter().map(|c| c.label.as_str()).collect();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    push_row(
        &mut out,
        &rule.iter().map(String::as_str).collect::<Vec<_>>(),
        &widths,
    );
    for row in &cells {
        push_row(
            &mut out,
            &row.iter().map(String::as_str).collect::<Vec<_>>(),
            &widths,
        );
    }
    out
}

fn push_row(out: &mut String, cells: &[&str], widths: &[usize]) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat_n(' ', pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
