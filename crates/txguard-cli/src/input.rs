//! Record sources: CSV, JSON array or JSON lines.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;

use txguard_core::Record;

/// Input file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Header row of field names, one record per row
    Csv,
    /// A JSON array of objects, or a single object
    Json,
    /// One JSON object per line
    JsonLines,
}

impl InputKind {
    /// Pick a layout from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(InputKind::Csv),
            Some("json") => Ok(InputKind::Json),
            Some("jsonl") | Some("ndjson") => Ok(InputKind::JsonLines),
            _ => bail!(
                "Cannot tell the format of '{}': expected a .csv, .json, .jsonl or .ndjson file",
                path.display()
            ),
        }
    }
}

/// Read every record from a file.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let kind = InputKind::from_path(path)?;

    let records = match kind {
        InputKind::Csv => {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open '{}'", path.display()))?;
            parse_csv(file)
        }
        InputKind::Json | InputKind::JsonLines => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            if kind == InputKind::Json {
                parse_json(&text)
            } else {
                parse_json_lines(&text)
            }
        }
    }
    .with_context(|| format!("Failed to parse '{}'", path.display()))?;

    tracing::info!(path = %path.display(), records = records.len(), "Records loaded");
    Ok(records)
}

/// Parse CSV with a header row. Empty cells become absent fields.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Missing CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let cells = result.with_context(|| format!("Bad CSV row {}", row + 1))?;
        let cells: Vec<&str> = cells.iter().collect();
        records.push(Record::from_row(&headers, &cells));
    }

    Ok(records)
}

/// Parse a JSON array of objects, or a single object.
pub fn parse_json(text: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(text).context("Invalid JSON")?;

    match &value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                Record::from_json_value(item).with_context(|| format!("Bad record at index {}", i))
            })
            .collect(),
        Value::Object(_) => Ok(vec![Record::from_json_value(&value)?]),
        _ => bail!("Expected a JSON array of records or a single record object"),
    }
}

/// Parse JSON lines, skipping blank lines.
pub fn parse_json_lines(text: &str) -> Result<Vec<Record>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            Record::from_json(line).with_context(|| format!("Bad record on line {}", i + 1))
        })
        .collect()
}
