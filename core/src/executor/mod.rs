//! Parallel batch execution over a validated task graph.
//!
//! ```text
//! Vec<TaskRecord>
//!   ↓
//! TaskGraph::from_tasks() → validate() → topological_sort()
//!   ↓
//! ExecutionEngine::execute_batch() ── per task ──▶ AgentInvoker::invoke()
//!   ↓                                                (bounded pool, per-task timeout)
//! TaskOutcome stream ──▶ RunReporter (single consumer)
//! ```
//!
//! Dependency-free batches run as one fully parallel stage; `blocked_by`
//! batches run blocker-before-blocked with skip propagation on failure.

mod engine;
mod graph;
mod invoker;
pub mod output;
mod progress;
mod scheduler;
pub mod traits;
mod types;

pub use engine::{ExecutionEngine, ExecutionEngineBuilder};
pub use graph::TaskGraph;
pub use invoker::{AgentInvoker, InvokeError};
pub use output::{emit_batch_error, emit_json, JsonlEvent};
pub use progress::ProgressMonitor;
pub use scheduler::execute_stage_parallel;
pub use types::{ExecutionOpts, ExecutionReport, TaskDispatch};
