//! Result aggregation.
//!
//! Workers report each terminal `TaskOutcome` over an unbounded channel;
//! one spawned consumer owns the detail files and running counters, so no
//! lock discipline is needed around them. The consumer drains until every
//! sender is dropped, then hands back the full ledger.

mod types;
mod writer;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use types::{RunSummary, TaskOutcome, TaskStatus};
pub use writer::{create_run_dir, write_summary, OutcomeWriter};

/// Everything the consumer accumulated by the time the channel closed.
#[derive(Debug)]
pub struct RunLedger {
    pub outcomes: Vec<TaskOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunLedger {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcome_for(&self, task_id: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.task_id == task_id)
    }
}

pub struct RunReporter;

impl RunReporter {
    /// Spawn the single-consumer aggregation task. Outcomes are appended
    /// to `results.jsonl` (and `failures.jsonl` for failed/skipped) in
    /// completion order, as they arrive.
    pub fn spawn(
        run_dir: &Path,
    ) -> std::io::Result<(
        mpsc::UnboundedSender<TaskOutcome>,
        JoinHandle<std::io::Result<RunLedger>>,
    )> {
        let mut writer = OutcomeWriter::create(run_dir)?;
        let (tx, mut rx) = mpsc::unbounded_channel::<TaskOutcome>();

        let handle = tokio::spawn(async move {
            let mut ledger = RunLedger {
                outcomes: Vec::new(),
                succeeded: 0,
                failed: 0,
                skipped: 0,
            };

            while let Some(outcome) = rx.recv().await {
                writer.append(&outcome)?;
                match outcome.status {
                    TaskStatus::Success => ledger.succeeded += 1,
                    TaskStatus::Failed => ledger.failed += 1,
                    TaskStatus::Skipped => ledger.skipped += 1,
                }
                ledger.outcomes.push(outcome);
            }

            writer.flush()?;
            Ok(ledger)
        });

        Ok((tx, handle))
    }
}

/// Path helpers for one run's artifact directory.
pub fn results_path(run_dir: &Path) -> PathBuf {
    run_dir.join("results.jsonl")
}

pub fn failures_path(run_dir: &Path) -> PathBuf {
    run_dir.join("failures.jsonl")
}

pub fn summary_path(run_dir: &Path) -> PathBuf {
    run_dir.join("summary.json")
}
