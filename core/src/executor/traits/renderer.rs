use crate::executor::types::ExecutionReport;
use crate::report::TaskOutcome;

/// Output renderer plugin (controls the stdout event stream).
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Unified render events emitted over a run's lifetime.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        total_tasks: usize,
        total_stages: usize,
    },
    Plan {
        run_id: String,
        stages: Vec<Vec<String>>,
    },
    StageStart {
        run_id: String,
        stage_id: usize,
        task_ids: Vec<String>,
    },
    TaskStart {
        run_id: String,
        task_id: String,
        stage_id: usize,
    },
    TaskEnd {
        run_id: String,
        outcome: TaskOutcome,
    },
    StageEnd {
        run_id: String,
        stage_id: usize,
    },
    RunEnd {
        run_id: String,
        report: ExecutionReport,
    },
}
