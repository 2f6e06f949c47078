use std::path::{Path, PathBuf};

use swarm_core::api as core_api;
use swarm_core::api::{CliError, TaskGraph, TaskRecord};
use swarm_plugins::factory;

use super::cli::Args;

/// Execute a task file: parse, validate, fan out to the agent, aggregate.
pub async fn handle_run(
    task_file: &str,
    args: &Args,
    cfg: &core_api::AppConfig,
) -> Result<i32, CliError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let opts = super::resolve_opts(args, cfg, &run_id)?;

    let tasks = match core_api::parse_task_file(Path::new(task_file)) {
        Ok(tasks) => tasks,
        Err(e) => {
            let code = e.error_code().as_u16();
            core_api::emit_batch_error(&opts, &e.to_string(), code);
            return Ok(code as i32);
        }
    };

    // Boundary guarantee: re-validate ids and the blocking relation before
    // the output directory exists. A rejected batch leaves nothing behind.
    if let Err(e) = TaskGraph::from_tasks(&tasks).and_then(|g| g.validate()) {
        let code = e.error_code().as_u16();
        core_api::emit_batch_error(&opts, &e.to_string(), code);
        return Ok(code as i32);
    }

    let output_root = args
        .output_dir
        .clone()
        .unwrap_or_else(|| cfg.batch.output_root.clone());
    let run_dir = core_api::create_run_dir(Path::new(&output_root), &run_id)?;

    tracing::info!(run_id = %run_id, tasks = tasks.len(), dir = %run_dir.display(), "starting batch run");
    let started_at = chrono::Local::now().to_rfc3339();

    let invoker = factory::build_invoker(&cfg.agent);
    let (report, ledger) = execute_and_aggregate(&tasks, invoker, args, cfg, &opts, &run_dir).await?;

    let summary = build_summary(&opts, &run_dir, &ledger, &report, started_at);
    core_api::write_summary(&run_dir, &summary)?;

    if opts.stream_format == "text" && !opts.quiet {
        println!("Artifacts: {}", run_dir.display());
    }

    // A completed run exits 0 even when tasks failed; the summary and
    // failures.jsonl carry the bad news.
    Ok(0)
}

/// Shared tail of both modes: wire plugins, run the engine, drain the
/// aggregator.
pub async fn execute_and_aggregate(
    tasks: &[TaskRecord],
    invoker: std::sync::Arc<dyn core_api::AgentInvoker>,
    args: &Args,
    cfg: &core_api::AppConfig,
    opts: &core_api::ExecutionOpts,
    run_dir: &Path,
) -> Result<(core_api::ExecutionReport, core_api::RunLedger), CliError> {
    execute_and_aggregate_with(tasks, invoker, args, cfg, opts, run_dir, Vec::new()).await
}

pub async fn execute_and_aggregate_with(
    tasks: &[TaskRecord],
    invoker: std::sync::Arc<dyn core_api::AgentInvoker>,
    args: &Args,
    cfg: &core_api::AppConfig,
    opts: &core_api::ExecutionOpts,
    run_dir: &Path,
    preskipped: Vec<core_api::TaskOutcome>,
) -> Result<(core_api::ExecutionReport, core_api::RunLedger), CliError> {
    let (outcome_tx, reporter) = core_api::RunReporter::spawn(run_dir)?;

    for outcome in preskipped {
        let _ = outcome_tx.send(outcome);
    }

    let renderer = factory::build_renderer(&opts.stream_format, &cfg.executor, opts.verbose);
    let retry = factory::build_retry_strategy(&cfg.executor);
    let concurrency = factory::build_concurrency_strategy(
        &cfg.executor,
        opts.max_parallel,
        args.num_parallel.is_some(),
    );

    let engine = core_api::ExecutionEngine::builder(opts.clone())
        .renderer(renderer)
        .retry_strategy(retry)
        .concurrency_strategy(concurrency)
        .build();

    let report = engine.execute_batch(tasks, invoker, outcome_tx).await?;

    let ledger = reporter
        .await
        .map_err(|e| CliError::Command(format!("aggregator task failed: {e}")))??;

    Ok((report, ledger))
}

pub fn build_summary(
    opts: &core_api::ExecutionOpts,
    run_dir: &PathBuf,
    ledger: &core_api::RunLedger,
    report: &core_api::ExecutionReport,
    started_at: String,
) -> core_api::RunSummary {
    core_api::RunSummary {
        run_id: opts.run_id.clone(),
        total: ledger.total(),
        succeeded: ledger.succeeded,
        failed: ledger.failed,
        skipped: ledger.skipped,
        duration_seconds: report.duration_ms as f64 / 1000.0,
        concurrency: opts.max_parallel,
        results_path: core_api::results_path(run_dir).display().to_string(),
        failures_path: core_api::failures_path(run_dir).display().to_string(),
        started_at,
    }
}
