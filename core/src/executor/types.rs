use std::time::Duration;

use crate::report::TaskStatus;

/// Execution options resolved by the caller from config + CLI flags.
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    /// Identifier threaded through every emitted event.
    pub run_id: String,

    /// Output stream format: "text" or "jsonl"
    pub stream_format: String,

    /// Verbose output (include per-task lines in text mode)
    pub verbose: bool,

    /// Quiet mode (suppress non-essential output)
    pub quiet: bool,

    /// ASCII-only markers (no Unicode)
    pub ascii: bool,

    /// Worker-pool bound. The concurrency strategy may shrink it, never
    /// grow it past the configured ceiling.
    pub max_parallel: usize,

    /// Deadline applied to each agent invocation unless the task record
    /// overrides it.
    pub task_timeout: Duration,

    /// Enable visual progress bar (text output only)
    pub progress_bar: bool,
}

impl ExecutionOpts {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            stream_format: "text".to_string(),
            verbose: false,
            quiet: false,
            ascii: false,
            max_parallel: 10,
            task_timeout: Duration::from_secs(300),
            progress_bar: false,
        }
    }
}

/// Per-task bookkeeping the engine keeps for skip propagation.
#[derive(Debug, Clone)]
pub struct TaskDispatch {
    pub task_id: String,
    pub status: TaskStatus,
    pub duration_ms: u64,
}

/// What the engine hands back once every task has a terminal status.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub total_tasks: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub stages: Vec<Vec<String>>,
}
