use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::batch::TaskRecord;
use crate::error::ExecutorError;
use crate::report::{TaskOutcome, TaskStatus};

use super::graph::TaskGraph;
use super::invoker::{AgentInvoker, InvokeError};
use super::output;
use super::progress::ProgressMonitor;
use super::scheduler::execute_stage_parallel;
use super::traits::{
    ConcurrencyContext, ConcurrencyStrategyPlugin, OutputRendererPlugin, RenderEvent,
    RetryStrategyPlugin,
};
use super::types::{ExecutionOpts, ExecutionReport, TaskDispatch};

/// Execution engine for a validated batch.
///
/// Every task reaches exactly one terminal status: success, failed, or
/// skipped (only when a declared blocker did not succeed). A failing task
/// never stops the batch; outcomes stream to the aggregator channel as
/// workers finish.
pub struct ExecutionEngine {
    opts: ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    concurrency_strategy: Option<Arc<dyn ConcurrencyStrategyPlugin>>,
}

pub struct ExecutionEngineBuilder {
    opts: ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    concurrency_strategy: Option<Arc<dyn ConcurrencyStrategyPlugin>>,
}

impl ExecutionEngineBuilder {
    pub fn new(opts: ExecutionOpts) -> Self {
        Self {
            opts,
            renderer: None,
            retry_strategy: None,
            concurrency_strategy: None,
        }
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategyPlugin>) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    pub fn concurrency_strategy(mut self, strategy: Arc<dyn ConcurrencyStrategyPlugin>) -> Self {
        self.concurrency_strategy = Some(strategy);
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            opts: self.opts,
            renderer: self.renderer,
            retry_strategy: self.retry_strategy,
            concurrency_strategy: self.concurrency_strategy,
        }
    }
}

impl ExecutionEngine {
    pub fn new(opts: ExecutionOpts) -> Self {
        ExecutionEngineBuilder::new(opts).build()
    }

    pub fn builder(opts: ExecutionOpts) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(opts)
    }

    /// Execute every task in the batch, streaming one `TaskOutcome` per
    /// task to `outcome_tx` as workers complete.
    pub async fn execute_batch(
        &self,
        tasks: &[TaskRecord],
        invoker: Arc<dyn AgentInvoker>,
        outcome_tx: mpsc::UnboundedSender<TaskOutcome>,
    ) -> Result<ExecutionReport, ExecutorError> {
        let graph = Arc::new(TaskGraph::from_tasks(tasks)?);
        graph.validate()?;
        let stages = graph.topological_sort()?;

        let start = Instant::now();
        let total_tasks = graph.nodes.len();

        self.emit_run_start(total_tasks, stages.len());
        self.emit_plan(&stages);

        let progress = Arc::new(Mutex::new(ProgressMonitor::new(
            total_tasks,
            self.opts.progress_bar,
        )));

        let mut statuses: HashMap<String, TaskStatus> = HashMap::new();

        for (stage_id, task_ids) in stages.iter().enumerate() {
            self.emit_stage_start(stage_id, task_ids);

            // Tasks whose blockers did not succeed are recorded skipped and
            // never handed to a worker.
            let mut ready: Vec<String> = Vec::new();
            for task_id in task_ids {
                let task = graph
                    .nodes
                    .get(task_id)
                    .ok_or_else(|| ExecutorError::Scheduler(format!("task not found: {task_id}")))?;

                match first_unmet_blocker(task, &statuses) {
                    Some(blocker) => {
                        let outcome = TaskOutcome::skipped(
                            task_id.clone(),
                            format!("skipped: blocker '{}' did not succeed", blocker),
                        )
                        .with_metadata(task.metadata.clone());

                        statuses.insert(task_id.clone(), TaskStatus::Skipped);
                        self.emit_task_end(&outcome);
                        if let Ok(mut monitor) = progress.lock() {
                            monitor.add_task(task_id);
                            monitor.complete_task(task_id, TaskStatus::Skipped, 0);
                        }
                        let _ = outcome_tx.send(outcome);
                    }
                    None => ready.push(task_id.clone()),
                }
            }

            if !ready.is_empty() {
                let max_parallel = self.stage_concurrency(ready.len());
                let stage_results = self
                    .execute_stage_tasks(stage_id, &ready, &graph, &invoker, &outcome_tx, &progress, max_parallel)
                    .await?;

                for (task_id, dispatch) in stage_results {
                    statuses.insert(task_id, dispatch.status);
                }
            }

            self.emit_stage_end(stage_id);
        }

        let succeeded = statuses
            .values()
            .filter(|s| **s == TaskStatus::Success)
            .count();
        let failed = statuses
            .values()
            .filter(|s| **s == TaskStatus::Failed)
            .count();
        let skipped = statuses
            .values()
            .filter(|s| **s == TaskStatus::Skipped)
            .count();

        if let Ok(monitor) = progress.lock() {
            monitor.finish(failed == 0 && skipped == 0);
        }

        let report = ExecutionReport {
            total_tasks,
            succeeded,
            failed,
            skipped,
            duration_ms: start.elapsed().as_millis() as u64,
            stages,
        };

        self.emit_run_end(&report);

        Ok(report)
    }

    /// Resolve the worker-pool bound for one stage.
    fn stage_concurrency(&self, pending: usize) -> usize {
        let base = self.opts.max_parallel;
        self.concurrency_strategy
            .as_ref()
            .map(|strategy| {
                strategy.calculate_concurrency(&ConcurrencyContext {
                    pending_tasks: pending,
                    base_concurrency: base,
                })
            })
            .unwrap_or(base)
            .max(1)
    }

    async fn execute_stage_tasks(
        &self,
        stage_id: usize,
        task_ids: &[String],
        graph: &Arc<TaskGraph<TaskRecord>>,
        invoker: &Arc<dyn AgentInvoker>,
        outcome_tx: &mpsc::UnboundedSender<TaskOutcome>,
        progress: &Arc<Mutex<ProgressMonitor>>,
        max_parallel: usize,
    ) -> Result<HashMap<String, TaskDispatch>, ExecutorError> {
        let graph = graph.clone();
        let invoker = invoker.clone();
        let outcome_tx = outcome_tx.clone();
        let progress = progress.clone();
        let opts = Arc::new(self.opts.clone());
        let renderer = self.renderer.clone();
        let retry_strategy = self.retry_strategy.clone();

        let executor_fn = move |task_id: String| {
            let graph = graph.clone();
            let invoker = invoker.clone();
            let outcome_tx = outcome_tx.clone();
            let progress = progress.clone();
            let opts = opts.clone();
            let renderer = renderer.clone();
            let retry_strategy = retry_strategy.clone();

            async move {
                let task = graph
                    .nodes
                    .get(&task_id)
                    .ok_or_else(|| ExecutorError::Scheduler(format!("task not found: {task_id}")))?
                    .clone();

                emit_task_start(&opts, &renderer, &task_id, stage_id);
                if let Ok(mut monitor) = progress.lock() {
                    monitor.add_task(&task_id);
                }

                let outcome = run_with_retries(&task, &invoker, &opts, &retry_strategy).await;

                emit_task_end(&opts, &renderer, &outcome);
                if let Ok(mut monitor) = progress.lock() {
                    monitor.complete_task(&task_id, outcome.status, outcome.duration_ms);
                }

                let dispatch = TaskDispatch {
                    task_id: task_id.clone(),
                    status: outcome.status,
                    duration_ms: outcome.duration_ms,
                };

                // The aggregator owns the outcome from here on.
                let _ = outcome_tx.send(outcome);

                Ok(dispatch)
            }
        };

        execute_stage_parallel(task_ids, max_parallel, executor_fn).await
    }

    fn emit_run_start(&self, total_tasks: usize, total_stages: usize) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::RunStart {
                run_id: self.opts.run_id.clone(),
                total_tasks,
                total_stages,
            });
        } else {
            output::emit_run_start(&self.opts, total_tasks, total_stages);
        }
    }

    fn emit_plan(&self, stages: &[Vec<String>]) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::Plan {
                run_id: self.opts.run_id.clone(),
                stages: stages.to_vec(),
            });
        } else {
            output::emit_execution_plan(&self.opts, stages);
        }
    }

    fn emit_stage_start(&self, stage_id: usize, task_ids: &[String]) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::StageStart {
                run_id: self.opts.run_id.clone(),
                stage_id,
                task_ids: task_ids.to_vec(),
            });
        } else {
            output::emit_stage_start(&self.opts, stage_id, task_ids);
        }
    }

    fn emit_stage_end(&self, stage_id: usize) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::StageEnd {
                run_id: self.opts.run_id.clone(),
                stage_id,
            });
        } else {
            output::emit_stage_end(&self.opts, stage_id);
        }
    }

    fn emit_task_end(&self, outcome: &TaskOutcome) {
        emit_task_end(&self.opts, &self.renderer, outcome);
    }

    fn emit_run_end(&self, report: &ExecutionReport) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::RunEnd {
                run_id: self.opts.run_id.clone(),
                report: report.clone(),
            });
        } else {
            output::emit_run_end(&self.opts, report);
        }
    }
}

/// Returns the first blocker of `task` that reached a non-success terminal
/// status, if any. Blockers always terminate in an earlier stage.
fn first_unmet_blocker<'a>(
    task: &'a TaskRecord,
    statuses: &HashMap<String, TaskStatus>,
) -> Option<&'a str> {
    task.blocked_by
        .iter()
        .find(|dep| {
            statuses
                .get(dep.as_str())
                .is_some_and(|s| s.is_terminal_failure())
        })
        .map(String::as_str)
}

enum AttemptResult {
    Ok(String),
    TimedOut,
    Err(InvokeError),
}

async fn run_attempt(
    invoker: &Arc<dyn AgentInvoker>,
    task: &TaskRecord,
    deadline: Duration,
) -> AttemptResult {
    match tokio::time::timeout(deadline, invoker.invoke(task)).await {
        Ok(Ok(reply)) => AttemptResult::Ok(reply),
        Ok(Err(e)) => AttemptResult::Err(e),
        Err(_) => AttemptResult::TimedOut,
    }
}

/// One task's full lifecycle on a worker: invoke, classify, and retry per
/// the configured strategy. Timeouts are terminal and never retried.
async fn run_with_retries(
    task: &TaskRecord,
    invoker: &Arc<dyn AgentInvoker>,
    opts: &ExecutionOpts,
    retry_strategy: &Option<Arc<dyn RetryStrategyPlugin>>,
) -> TaskOutcome {
    let deadline = task
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(opts.task_timeout);

    let started = Instant::now();
    let mut retries_used: u32 = 0;
    let mut attempt = run_attempt(invoker, task, deadline).await;

    if let Some(strategy) = retry_strategy {
        let max_attempts = strategy.max_attempts().max(1);
        let mut attempt_no: u32 = 1;

        while attempt_no < max_attempts {
            let error = match &attempt {
                AttemptResult::Ok(_) | AttemptResult::TimedOut => break,
                AttemptResult::Err(e) => e.to_string(),
            };

            if !strategy.should_retry(attempt_no, &error) {
                break;
            }
            let Some(delay) = strategy.next_delay(attempt_no, &error) else {
                break;
            };

            tokio::time::sleep(delay).await;
            tracing::debug!(task_id = %task.id, attempt = attempt_no + 1, "retrying task");

            attempt = run_attempt(invoker, task, deadline).await;
            retries_used = attempt_no;
            attempt_no += 1;
        }
    }

    let duration_ms = started.elapsed().as_millis() as u64;

    let outcome = match attempt {
        AttemptResult::Ok(reply) => TaskOutcome::success(task.id.clone(), reply, duration_ms),
        AttemptResult::TimedOut => TaskOutcome::failed(
            task.id.clone(),
            "timeout",
            format!("agent invocation exceeded {:?}", deadline),
            duration_ms,
        ),
        AttemptResult::Err(e) => {
            TaskOutcome::failed(task.id.clone(), e.kind(), e.to_string(), duration_ms)
        }
    };

    outcome
        .with_metadata(task.metadata.clone())
        .with_retries(retries_used)
}

fn emit_task_start(
    opts: &ExecutionOpts,
    renderer: &Option<Arc<dyn OutputRendererPlugin>>,
    task_id: &str,
    stage_id: usize,
) {
    if let Some(renderer) = renderer {
        renderer.render(&RenderEvent::TaskStart {
            run_id: opts.run_id.clone(),
            task_id: task_id.to_string(),
            stage_id,
        });
    } else {
        output::emit_task_start(opts, task_id, stage_id);
    }
}

fn emit_task_end(
    opts: &ExecutionOpts,
    renderer: &Option<Arc<dyn OutputRendererPlugin>>,
    outcome: &TaskOutcome,
) {
    if let Some(renderer) = renderer {
        renderer.render(&RenderEvent::TaskEnd {
            run_id: opts.run_id.clone(),
            outcome: outcome.clone(),
        });
    } else {
        output::emit_task_end(opts, outcome);
    }
}
