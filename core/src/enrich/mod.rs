//! CSV enrichment: turn a partially-filled table into a batch of research
//! tasks and merge the agents' JSON replies back into the table.
//!
//! Partitioning is per-row: each row's own empty cells are its targets and
//! its populated cells are the context handed to the agent. Rows with no
//! empty cells produce no task and pass through unchanged.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::table::{read_table, Table};
use crate::batch::TaskRecord;
use crate::error::BatchError;
use crate::executor::{AgentInvoker, InvokeError};
use crate::report::{RunLedger, TaskStatus};

/// Maps one synthesized task back to its row and the columns it fills.
#[derive(Debug, Clone)]
pub struct RowBinding {
    pub row: usize,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EnrichmentPlan {
    pub table: Table,
    pub tasks: Vec<TaskRecord>,
    /// task id -> row binding
    pub bindings: HashMap<String, RowBinding>,
    /// Row indices that had nothing to enrich.
    pub full_rows: Vec<usize>,
}

pub fn plan_from_file(path: &Path, id_column: Option<&str>) -> Result<EnrichmentPlan, BatchError> {
    plan_from_table(read_table(path)?, id_column)
}

pub fn plan_from_table(
    table: Table,
    id_column: Option<&str>,
) -> Result<EnrichmentPlan, BatchError> {
    let id_col_idx = match id_column {
        Some(name) => Some(
            table
                .header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| BatchError::InvalidRecord {
                    line: 1,
                    reason: format!("id column '{}' not found in header", name),
                })?,
        ),
        None => None,
    };

    let mut tasks = Vec::new();
    let mut bindings = HashMap::new();
    let mut full_rows = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let targets: Vec<String> = table
            .header
            .iter()
            .zip(row.iter())
            .filter(|(_, cell)| cell.trim().is_empty())
            .map(|(col, _)| col.clone())
            .collect();

        if targets.is_empty() {
            full_rows.push(row_idx);
            continue;
        }

        let id = match id_col_idx
            .and_then(|i| row.get(i))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
        {
            Some(seed) => format!("enrich-{}", seed),
            None => format!("row-{}", row_idx),
        };
        if !seen.insert(id.clone()) {
            return Err(BatchError::DuplicateTaskId(id));
        }

        let mut task = TaskRecord::new(id.clone(), build_description(&table.header, row, &targets));
        task.metadata
            .insert("row".to_string(), Value::Number(row_idx.into()));

        bindings.insert(id, RowBinding {
            row: row_idx,
            targets,
        });
        tasks.push(task);
    }

    if tasks.is_empty() {
        return Err(BatchError::NoTargetColumns(table.rows.len()));
    }

    Ok(EnrichmentPlan {
        table,
        tasks,
        bindings,
        full_rows,
    })
}

/// Prompt handed to the agent for one row.
fn build_description(header: &[String], row: &[String], targets: &[String]) -> String {
    let mut out = String::from("Research and fill in missing fields for one record.\n\nKnown fields:\n");
    for (col, cell) in header.iter().zip(row.iter()) {
        if !cell.trim().is_empty() {
            out.push_str(&format!("- {}: {}\n", col, cell.trim()));
        }
    }

    let keys = targets
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!(
        "\nFind values for: {}\n\nRespond with ONLY a JSON object containing exactly these keys: {}.\nUse null or \"N/A\" for any value you cannot determine. No prose, no code fences.",
        targets.join(", "),
        keys
    ));
    out
}

/// Wraps any invoker and insists the reply contains a JSON object, so a
/// non-JSON reply surfaces as that task's failure (never the batch's).
/// On success the output is the canonicalized object.
pub struct JsonReplyInvoker {
    inner: Arc<dyn AgentInvoker>,
}

impl JsonReplyInvoker {
    pub fn new(inner: Arc<dyn AgentInvoker>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AgentInvoker for JsonReplyInvoker {
    fn name(&self) -> &str {
        "json-reply"
    }

    async fn invoke(&self, task: &TaskRecord) -> Result<String, InvokeError> {
        let reply = self.inner.invoke(task).await?;
        match extract_json_object(&reply) {
            Some(obj) => Ok(obj.to_string()),
            None => Err(InvokeError::Failed(
                "agent reply did not contain a JSON object".to_string(),
            )),
        }
    }
}

/// Pull the first top-level JSON object out of free-form agent text.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Value>(&text[start..=end])
        .ok()
        .filter(Value::is_object)
}

/// Build the enriched table: successful outcomes fill their row's target
/// cells (missing/null values become "N/A"); failed or skipped rows keep
/// their cells exactly as they were in the input.
pub fn merge_ledger(plan: &EnrichmentPlan, ledger: &RunLedger) -> Table {
    let mut table = plan.table.clone();

    for (task_id, binding) in &plan.bindings {
        let Some(outcome) = ledger.outcome_for(task_id) else {
            continue;
        };
        if outcome.status != TaskStatus::Success {
            continue;
        }
        let Some(obj) = outcome
            .output
            .as_deref()
            .and_then(extract_json_object)
        else {
            continue;
        };

        let row = &mut table.rows[binding.row];
        for target in &binding.targets {
            let Some(col_idx) = plan.table.header.iter().position(|h| h == target) else {
                continue;
            };
            row[col_idx] = match obj.get(target) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "N/A".to_string(),
                Some(other) => other.to_string(),
            };
        }
    }

    table
}

/// `data.csv` -> `data_enriched.csv`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "enriched".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "csv".to_string());
    input.with_file_name(format!("{}_enriched.{}", stem, ext))
}
