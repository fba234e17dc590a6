//! Line-delimited JSON input for load.

use std::io::BufRead;

use serde_json::Value;
use tracing::warn;

use connkit_models::Record;

use super::error::ConnectorError;

/// An input line that could not be used as a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number in the input
    pub line_number: usize,
    pub content: String,
    pub reason: String,
}

/// Records parsed from a JSONL input, plus the lines that were skipped
#[derive(Debug, Default)]
pub struct JsonlBatch {
    pub records: Vec<Record>,
    pub skipped: Vec<MalformedLine>,
}

/// Reads the whole input, one JSON object per line.
///
/// Blank lines are ignored. Lines that are not UTF-8 JSON objects are
/// skipped with a warning. Only failing to read the input itself is an error.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<JsonlBatch, ConnectorError> {
    let mut batch = JsonlBatch::default();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| {
            ConnectorError::ResourceUnavailable(format!("failed to read load input: {}", e))
        })?;
        let line_number = index + 1;

        let parsed = match String::from_utf8(line) {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                parse_record(trimmed).map_err(|reason| (trimmed.to_string(), reason))
            }
            Err(e) => {
                let content = String::from_utf8_lossy(e.as_bytes()).trim().to_string();
                Err((content, format!("invalid UTF-8: {}", e.utf8_error())))
            }
        };

        match parsed {
            Ok(record) => batch.records.push(record),
            Err((content, reason)) => {
                let malformed = MalformedLine {
                    line_number,
                    content,
                    reason,
                };
                warn!(
                    line = malformed.line_number,
                    reason = %malformed.reason,
                    "Skipping invalid JSON line: {}",
                    malformed.content
                );
                batch.skipped.push(malformed);
            }
        }
    }

    Ok(batch)
}

fn parse_record(line: &str) -> Result<Record, String> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
