//! Minimal delimited-table reader/writer.
//!
//! Handles double-quoted fields with embedded delimiters, quotes and
//! newlines, which is as much as the task-file and enrichment tables
//! this tool consumes ever need.

use std::path::Path;

use crate::error::BatchError;

#[derive(Debug, Clone)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: char,
}

/// Pick a delimiter from the file extension: `.tsv` means tab, anything
/// else is treated as comma-separated.
pub fn delimiter_for_path(path: &Path) -> char {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") => '\t',
        _ => ',',
    }
}

pub fn read_table(path: &Path) -> Result<Table, BatchError> {
    if !path.exists() {
        return Err(BatchError::TaskFileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let delimiter = delimiter_for_path(path);
    parse_table(&content, delimiter)
}

pub fn parse_table(content: &str, delimiter: char) -> Result<Table, BatchError> {
    let mut records = parse_records(content, delimiter);
    if records.is_empty() {
        return Err(BatchError::EmptyBatch);
    }

    let header = records.remove(0);
    let width = header.len();

    // Ragged short rows are padded; overlong rows are a parse error.
    for (idx, row) in records.iter_mut().enumerate() {
        if row.len() > width {
            return Err(BatchError::InvalidRecord {
                line: idx + 2,
                reason: format!("row has {} fields, header has {}", row.len(), width),
            });
        }
        row.resize(width, String::new());
    }

    Ok(Table {
        header,
        rows: records,
        delimiter,
    })
}

/// Split raw content into records of fields, honoring quoted cells.
fn parse_records(content: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut saw_any = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(c);
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                saw_any = true;
            }
            '\r' => {}
            '\n' => {
                if saw_any || !cell.is_empty() || !fields.is_empty() {
                    fields.push(std::mem::take(&mut cell));
                    records.push(std::mem::take(&mut fields));
                }
                saw_any = false;
            }
            c if c == delimiter => {
                fields.push(std::mem::take(&mut cell));
                saw_any = true;
            }
            c => {
                cell.push(c);
                saw_any = true;
            }
        }
    }

    if saw_any || !cell.is_empty() || !fields.is_empty() {
        fields.push(cell);
        records.push(fields);
    }

    records
}

pub fn write_table(path: &Path, table: &Table) -> std::io::Result<()> {
    use std::io::Write;

    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
    writeln!(out, "{}", format_row(&table.header, table.delimiter))?;
    for row in &table.rows {
        writeln!(out, "{}", format_row(row, table.delimiter))?;
    }
    out.flush()
}

pub fn format_row(fields: &[String], delimiter: char) -> String {
    fields
        .iter()
        .map(|f| quote_field(f, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
