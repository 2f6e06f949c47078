//! Task-file parsing.
//!
//! Two input shapes produce the same `Vec<TaskRecord>`:
//!
//! - line-delimited JSON records (`.jsonl` / `.ndjson` / `.json`), one
//!   object per non-empty line;
//! - a delimited table (`.csv` / `.tsv`) whose header row names the same
//!   fields, with `blocked_by` as a `,`/`;`-separated list inside one cell.
//!
//! A record must carry a description under one of the accepted aliases
//! (`description`, `task`, `prompt`). Missing ids are generated; ids must
//! be unique across the batch.

use std::collections::HashSet;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::BatchError;

use super::id_gen::generate_task_id;
use super::table;
use super::types::TaskRecord;

const DESCRIPTION_ALIASES: [&str; 3] = ["description", "task", "prompt"];

pub fn parse_task_file(path: &Path) -> Result<Vec<TaskRecord>, BatchError> {
    if !path.exists() {
        return Err(BatchError::TaskFileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;

    let tabular = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") | Some("tsv") => true,
        Some("jsonl") | Some("ndjson") | Some("json") => false,
        // Unknown extension: sniff. JSONL records open with '{'.
        _ => !content.trim_start().starts_with('{'),
    };

    if tabular {
        parse_tabular(&content, table::delimiter_for_path(path))
    } else {
        parse_task_records(&content)
    }
}

/// Parse line-delimited JSON task records.
pub fn parse_task_records(content: &str) -> Result<Vec<TaskRecord>, BatchError> {
    let mut tasks: Vec<TaskRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let value: Value =
            serde_json::from_str(trimmed).map_err(|e| BatchError::InvalidRecord {
                line: line_no,
                reason: e.to_string(),
            })?;
        let obj = value.as_object().ok_or_else(|| BatchError::InvalidRecord {
            line: line_no,
            reason: "record is not a JSON object".to_string(),
        })?;

        tasks.push(record_from_fields(obj, line_no, &mut seen)?);
    }

    if tasks.is_empty() {
        return Err(BatchError::EmptyBatch);
    }

    Ok(tasks)
}

fn parse_tabular(content: &str, delimiter: char) -> Result<Vec<TaskRecord>, BatchError> {
    let table = table::parse_table(content, delimiter)?;
    let header: Vec<String> = table
        .header
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut tasks = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, row) in table.rows.iter().enumerate() {
        // Header is line 1.
        let line_no = idx + 2;
        let mut fields = Map::new();
        for (col, cell) in header.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            let value = match col.as_str() {
                "blocked_by" => Value::Array(
                    cell.split([',', ';'])
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| Value::String(s.to_string()))
                        .collect(),
                ),
                "metadata" => serde_json::from_str(cell).map_err(|e| {
                    BatchError::InvalidRecord {
                        line: line_no,
                        reason: format!("metadata cell is not valid JSON: {}", e),
                    }
                })?,
                "timeout" => {
                    let secs: u64 =
                        cell.trim()
                            .parse()
                            .map_err(|_| BatchError::InvalidRecord {
                                line: line_no,
                                reason: format!("invalid timeout: {}", cell),
                            })?;
                    Value::Number(secs.into())
                }
                _ => Value::String(cell.clone()),
            };
            fields.insert(col.clone(), value);
        }

        tasks.push(record_from_fields(&fields, line_no, &mut seen)?);
    }

    if tasks.is_empty() {
        return Err(BatchError::EmptyBatch);
    }

    Ok(tasks)
}

/// Build one record from parsed fields, generating the id if absent and
/// enforcing batch-wide uniqueness.
fn record_from_fields(
    fields: &Map<String, Value>,
    line_no: usize,
    seen: &mut HashSet<String>,
) -> Result<TaskRecord, BatchError> {
    let description = DESCRIPTION_ALIASES
        .iter()
        .find_map(|k| fields.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(BatchError::MissingDescription { line: line_no })?;

    let id = match fields.get("id").and_then(Value::as_str).map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            // Generated ids must not collide with explicit ones.
            let mut id = generate_task_id();
            while seen.contains(&id) {
                id = generate_task_id();
            }
            id
        }
    };

    if !seen.insert(id.clone()) {
        return Err(BatchError::DuplicateTaskId(id));
    }

    let agent_type = fields
        .get("type")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("general")
        .to_string();

    let blocked_by = fields
        .get("blocked_by")
        .and_then(Value::as_array)
        .map(|deps| {
            deps.iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let metadata = fields
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let timeout = fields.get("timeout").and_then(Value::as_u64);

    Ok(TaskRecord {
        id,
        description: description.to_string(),
        agent_type,
        blocked_by,
        metadata,
        timeout,
    })
}
