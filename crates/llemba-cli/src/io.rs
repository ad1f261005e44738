//! JSONL rows in, JSONL results out.

use llemba_core::runner::RowOutcome;
use llemba_core::template::language_name;
use llemba_core::{LlembaError, Row};
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// One input line: the typed row plus every field as read, so unknown
/// columns survive into the output.
#[derive(Debug, Clone)]
pub struct InputRecord {
    pub fields: Map<String, Value>,
    pub row: Row,
}

pub fn read_rows(path: &Path) -> Result<Vec<InputRecord>, LlembaError> {
    let file = std::fs::File::open(path)
        .map_err(|e| LlembaError::input(format!("cannot open {}: {}", path.display(), e)))?;
    parse_rows(BufReader::new(file))
}

pub fn parse_rows(reader: impl BufRead) -> Result<Vec<InputRecord>, LlembaError> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line =
            line.map_err(|e| LlembaError::input(format!("line {}: read failed: {}", line_no, e)))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Map<String, Value> = serde_json::from_str(&line)
            .map_err(|e| LlembaError::input(format!("line {}: {}", line_no, e)))?;
        let row: Row = serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|e| LlembaError::input(format!("line {}: {}", line_no, e)))?;
        records.push(InputRecord { fields, row });
    }
    Ok(records)
}

/// Expands known ISO codes in the language fields (`de` -> `German`).
pub fn with_language_names(row: &Row) -> Row {
    let mut row = row.clone();
    if let Some(name) = language_name(&row.source_lang) {
        row.source_lang = name.to_string();
    }
    if let Some(name) = language_name(&row.target_lang) {
        row.target_lang = name.to_string();
    }
    row
}

/// The input fields plus the row's first answer record.
pub fn output_line(input: &InputRecord, outcome: &RowOutcome) -> Value {
    let mut fields = input.fields.clone();
    fields.insert("prompt".into(), Value::String(outcome.prompt.clone()));
    if let Some(record) = outcome.first_record() {
        fields.insert("answer".into(), serde_json::json!(record.answer));
        fields.insert("temperature".into(), serde_json::json!(record.temperature));
        fields.insert("answer_id".into(), serde_json::json!(record.answer_id));
        fields.insert("finish_reason".into(), serde_json::json!(record.finish_reason));
        fields.insert("model".into(), Value::String(record.model.clone()));
    }
    Value::Object(fields)
}

pub fn write_jsonl<'a>(
    mut out: impl Write,
    lines: impl IntoIterator<Item = &'a Value>,
) -> anyhow::Result<()> {
    for line in lines {
        serde_json::to_writer(&mut out, line)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
