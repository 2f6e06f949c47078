//! Fallback stdout emission used when no renderer plugin is installed.
//!
//! The jsonl shape is the stable machine interface; text lines are for
//! humans and follow the verbosity/quiet flags.

use chrono::Local;
use serde::Serialize;

use crate::report::{TaskOutcome, TaskStatus};

use super::types::{ExecutionOpts, ExecutionReport};

/// One line of the jsonl event stream.
#[derive(Debug, Clone, Serialize)]
pub struct JsonlEvent {
    pub v: u8,
    pub event_type: String,
    pub ts: String,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl JsonlEvent {
    pub fn new(event_type: &str, run_id: &str) -> Self {
        Self {
            v: 1,
            event_type: event_type.to_string(),
            ts: Local::now().to_rfc3339(),
            run_id: run_id.to_string(),
            task_id: None,
            error: None,
            code: None,
            metadata: None,
        }
    }
}

pub fn emit_json(event: &JsonlEvent) {
    if let Ok(line) = serde_json::to_string(event) {
        println!("{}", line);
    }
}

pub fn emit_run_start(opts: &ExecutionOpts, total_tasks: usize, total_stages: usize) {
    if opts.stream_format == "jsonl" {
        let mut ev = JsonlEvent::new("run.start", &opts.run_id);
        ev.metadata = Some(serde_json::json!({
            "total_tasks": total_tasks,
            "total_stages": total_stages,
            "concurrency": opts.max_parallel,
        }));
        emit_json(&ev);
    } else if !opts.quiet {
        println!(
            "Starting batch: {} tasks, concurrency {}",
            total_tasks, opts.max_parallel
        );
    }
}

pub fn emit_execution_plan(opts: &ExecutionOpts, stages: &[Vec<String>]) {
    if opts.stream_format == "jsonl" {
        let total_tasks: usize = stages.iter().map(|s| s.len()).sum();
        let mut ev = JsonlEvent::new("executor.plan", &opts.run_id);
        ev.metadata = Some(serde_json::json!({
            "stages": stages,
            "total_tasks": total_tasks,
        }));
        emit_json(&ev);
    } else if opts.verbose && stages.len() > 1 {
        println!("Execution plan:");
        for (i, stage) in stages.iter().enumerate() {
            println!("  stage {}: {}", i, stage.join(", "));
        }
    }
}

pub fn emit_stage_start(opts: &ExecutionOpts, stage_id: usize, task_ids: &[String]) {
    if opts.stream_format == "jsonl" {
        let mut ev = JsonlEvent::new("stage.start", &opts.run_id);
        ev.metadata = Some(serde_json::json!({
            "stage_id": stage_id,
            "tasks": task_ids,
        }));
        emit_json(&ev);
    } else if opts.verbose && !opts.quiet {
        println!("stage {} ({} tasks)", stage_id, task_ids.len());
    }
}

pub fn emit_stage_end(opts: &ExecutionOpts, stage_id: usize) {
    if opts.stream_format == "jsonl" {
        let mut ev = JsonlEvent::new("stage.end", &opts.run_id);
        ev.metadata = Some(serde_json::json!({ "stage_id": stage_id }));
        emit_json(&ev);
    }
}

pub fn emit_task_start(opts: &ExecutionOpts, task_id: &str, stage_id: usize) {
    if opts.stream_format == "jsonl" {
        let mut ev = JsonlEvent::new("task.start", &opts.run_id);
        ev.task_id = Some(task_id.to_string());
        ev.metadata = Some(serde_json::json!({ "stage_id": stage_id }));
        emit_json(&ev);
    } else if opts.verbose && !opts.quiet {
        println!("  started {}", task_id);
    }
}

pub fn emit_task_end(opts: &ExecutionOpts, outcome: &TaskOutcome) {
    if opts.stream_format == "jsonl" {
        let mut ev = JsonlEvent::new("task.end", &opts.run_id);
        ev.task_id = Some(outcome.task_id.clone());
        ev.error = outcome.error.clone();
        ev.code = Some(match outcome.status {
            TaskStatus::Success => 0,
            _ => 1,
        });
        ev.metadata = Some(serde_json::json!({
            "status": outcome.status,
            "duration_ms": outcome.duration_ms,
            "retries_used": outcome.retries_used,
        }));
        emit_json(&ev);
    } else if opts.verbose && !opts.quiet {
        let marker = marker_for(opts, outcome.status);
        println!(
            "  {} {} ({}ms)",
            marker, outcome.task_id, outcome.duration_ms
        );
    }
}

pub fn emit_run_end(opts: &ExecutionOpts, report: &ExecutionReport) {
    if opts.stream_format == "jsonl" {
        let mut ev = JsonlEvent::new("run.end", &opts.run_id);
        ev.code = Some(if report.failed == 0 { 0 } else { 1 });
        ev.metadata = Some(serde_json::json!({
            "total_tasks": report.total_tasks,
            "succeeded": report.succeeded,
            "failed": report.failed,
            "skipped": report.skipped,
            "duration_ms": report.duration_ms,
        }));
        emit_json(&ev);
    } else if !opts.quiet {
        println!(
            "Batch finished: {} succeeded, {} failed, {} skipped in {}ms",
            report.succeeded, report.failed, report.skipped, report.duration_ms
        );
    }
}

/// Emit a batch-level rejection in the active stream format.
pub fn emit_batch_error(opts: &ExecutionOpts, error: &str, code: u16) {
    if opts.stream_format == "jsonl" {
        let mut ev = JsonlEvent::new("error", &opts.run_id);
        ev.error = Some(error.to_string());
        ev.code = Some(code as i32);
        emit_json(&ev);
    } else {
        let marker = if opts.ascii { "[FAIL]" } else { "✗" };
        eprintln!("{} {}", marker, error);
    }
}

fn marker_for(opts: &ExecutionOpts, status: TaskStatus) -> &'static str {
    match (opts.ascii, status) {
        (true, TaskStatus::Success) => "[OK]",
        (true, TaskStatus::Failed) => "[FAIL]",
        (true, TaskStatus::Skipped) => "[SKIP]",
        (false, TaskStatus::Success) => "✓",
        (false, TaskStatus::Failed) => "✗",
        (false, TaskStatus::Skipped) => "↷",
    }
}
