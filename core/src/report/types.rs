use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal_failure(self) -> bool {
        matches!(self, TaskStatus::Failed | TaskStatus::Skipped)
    }
}

/// The outcome of running (or skipping) one task. Created once, immutable
/// thereafter; serialized as one line of `results.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: String,

    pub status: TaskStatus,

    /// Agent reply, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Failure classification ("timeout", "invocation", "skipped", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Human-readable failure/skip detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub duration_ms: u64,

    #[serde(default)]
    pub retries_used: u32,

    /// User metadata copied through from the task record.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl TaskOutcome {
    pub fn success(task_id: impl Into<String>, output: String, duration_ms: u64) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Success,
            output: Some(output),
            error: None,
            message: None,
            duration_ms,
            retries_used: 0,
            metadata: Map::new(),
        }
    }

    pub fn failed(
        task_id: impl Into<String>,
        error: impl Into<String>,
        message: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            output: None,
            error: Some(error.into()),
            message: Some(message.into()),
            duration_ms,
            retries_used: 0,
            metadata: Map::new(),
        }
    }

    pub fn skipped(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Skipped,
            output: None,
            error: Some("skipped".to_string()),
            message: Some(message.into()),
            duration_ms: 0,
            retries_used: 0,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_retries(mut self, retries_used: u32) -> Self {
        self.retries_used = retries_used;
        self
    }
}

/// Aggregate statistics for one batch run; written once as `summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_seconds: f64,
    pub concurrency: usize,
    pub results_path: String,
    pub failures_path: String,
    pub started_at: String,
}
