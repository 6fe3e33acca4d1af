use clap::ValueEnum;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Shape in which the remote tool renders command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Untouched stdout text.
    Raw,
    /// Comma-delimited table with a header row.
    Table,
    /// A JSON document.
    Json,
}

impl OutputFormat {
    /// The `--output=...` flag the tool needs for this format, if any.
    /// Raw output is whatever the tool prints by default.
    pub fn output_flag(self) -> Option<&'static str> {
        match self {
            OutputFormat::Raw => None,
            OutputFormat::Table => Some("--output=csv"),
            OutputFormat::Json => Some("--output=json"),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Raw => "raw",
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("table row {row} has {got} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("unterminated quoted field in table output")]
    UnterminatedQuote,
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parsed result of a tool invocation, in the requested shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Raw(String),
    Table(Table),
    Json(serde_json::Value),
}

impl Payload {
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Payload::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Raw(text) => serializer.serialize_str(text),
            Payload::Table(table) => table.records().serialize(serializer),
            Payload::Json(value) => value.serialize(serializer),
        }
    }
}

/// Delimited output: one header row plus data rows, all the same width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as header-keyed mappings.
    pub fn records(&self) -> Vec<BTreeMap<&str, &str>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter().map(String::as_str))
                    .collect()
            })
            .collect()
    }

    /// All values of one column, matched by exact header name.
    pub fn column(&self, header: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == header)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
}

pub fn parse_payload(format: OutputFormat, stdout: &str) -> Result<Payload, ParseError> {
    match format {
        OutputFormat::Raw => Ok(Payload::Raw(stdout.trim_end().to_string())),
        OutputFormat::Table => Ok(Payload::Table(parse_table(stdout)?)),
        OutputFormat::Json => Ok(Payload::Json(serde_json::from_str(stdout)?)),
    }
}

/// Parse comma-delimited text: quoted fields, doubled-quote escapes, embedded
/// commas and newlines, CRLF line ends. First record is the header row.
fn parse_table(text: &str) -> Result<Table, ParseError> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(ParseError::UnterminatedQuote);
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    // Blank lines carry no fields.
    records.retain(|r| !(r.len() == 1 && r[0].is_empty()));

    let mut iter = records.into_iter();
    let headers = iter.next().unwrap_or_default();
    let mut rows = Vec::new();
    for (i, row) in iter.enumerate() {
        if row.len() != headers.len() {
            return Err(ParseError::RaggedRow {
                row: i + 1,
                expected: headers.len(),
                got: row.len(),
            });
        }
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

pub fn format_payload_human(payload: &Payload) -> String {
    match payload {
        Payload::Raw(text) => text.clone(),
        Payload::Json(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        Payload::Table(table) => format_table_human(table),
    }
}

fn format_table_human(table: &Table) -> String {
    if table.headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = table.headers.iter().map(String::len).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let render_row = |cells: &[String]| -> String {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i + 1 == cells.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{:<width$}  ", cell, width = widths[i]));
            }
        }
        line
    };

    let mut lines = vec![render_row(&table.headers)];
    for row in &table.rows {
        lines.push(render_row(row));
    }
    lines.join("\n")
}
