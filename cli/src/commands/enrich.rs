use std::path::Path;
use std::sync::Arc;

use swarm_core::api as core_api;
use swarm_core::api::{CliError, JsonReplyInvoker, TaskOutcome};
use swarm_core::batch::table::write_table;
use swarm_plugins::factory;

use super::cli::Args;
use super::run::{build_summary, execute_and_aggregate_with};

/// Enrichment mode: one task per row with empty cells, agent replies
/// merged back into the table.
pub async fn handle_enrich(
    csv_file: &str,
    args: &Args,
    cfg: &core_api::AppConfig,
) -> Result<i32, CliError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let opts = super::resolve_opts(args, cfg, &run_id)?;

    let plan = match core_api::plan_from_file(Path::new(csv_file), args.id_column.as_deref()) {
        Ok(plan) => plan,
        Err(e) => {
            let code = e.error_code().as_u16();
            core_api::emit_batch_error(&opts, &e.to_string(), code);
            return Ok(code as i32);
        }
    };

    if !plan.full_rows.is_empty() {
        tracing::warn!(
            rows = plan.full_rows.len(),
            "rows with no empty columns will pass through unchanged"
        );
    }

    let output_root = args
        .output_dir
        .clone()
        .unwrap_or_else(|| cfg.batch.output_root.clone());
    let run_dir = core_api::create_run_dir(Path::new(&output_root), &run_id)?;

    tracing::info!(
        run_id = %run_id,
        rows = plan.table.rows.len(),
        tasks = plan.tasks.len(),
        "starting enrichment run"
    );
    let started_at = chrono::Local::now().to_rfc3339();

    // Rows with nothing to enrich are reported skipped up front so the
    // summary accounts for every row.
    let preskipped: Vec<TaskOutcome> = plan
        .full_rows
        .iter()
        .map(|row| {
            TaskOutcome::skipped(format!("row-{}", row), "row has no empty columns to enrich")
        })
        .collect();

    // Non-JSON replies must fail their row, so the raw invoker is wrapped
    // with the JSON gate.
    let invoker = Arc::new(JsonReplyInvoker::new(factory::build_invoker(&cfg.agent)));

    let (report, ledger) =
        execute_and_aggregate_with(&plan.tasks, invoker, args, cfg, &opts, &run_dir, preskipped)
            .await?;

    let enriched = core_api::merge_ledger(&plan, &ledger);
    let out_path = args
        .output
        .clone()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| core_api::default_output_path(Path::new(csv_file)));
    write_table(&out_path, &enriched)?;

    let summary = build_summary(&opts, &run_dir, &ledger, &report, started_at);
    core_api::write_summary(&run_dir, &summary)?;

    if opts.stream_format == "text" && !opts.quiet {
        println!("Enriched table: {}", out_path.display());
        println!("Artifacts: {}", run_dir.display());
    }

    Ok(0)
}
