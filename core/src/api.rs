//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `swarm_core::api` instead of reaching into
//! internal modules.

pub use crate::batch::{generate_task_id, parse_task_file, parse_task_records, TaskLike, TaskRecord};
pub use crate::config::{
    load_default, load_from_path, AgentConfig, AppConfig, BatchConfig, ConcurrencyConfig,
    ExecutionConfig, LoggingConfig, OutputConfig, RetryConfig,
};
pub use crate::enrich::{
    default_output_path, merge_ledger, plan_from_file, EnrichmentPlan, JsonReplyInvoker,
    RowBinding,
};
pub use crate::error::{BatchError, CliError, ErrorCode, ExecutorError};
pub use crate::executor::{
    emit_batch_error, AgentInvoker, ExecutionEngine, ExecutionOpts, ExecutionReport, InvokeError,
    JsonlEvent, TaskGraph,
};
pub use crate::executor::traits::{
    ConcurrencyContext, ConcurrencyStrategyPlugin, OutputRendererPlugin, RenderEvent,
    RetryStrategyPlugin,
};
pub use crate::report::{
    create_run_dir, failures_path, results_path, summary_path, write_summary, RunLedger,
    RunReporter, RunSummary, TaskOutcome, TaskStatus,
};
