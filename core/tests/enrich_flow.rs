mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeInvoker, Script};
use swarm_core::api::{
    create_run_dir, merge_ledger, plan_from_file, ExecutionEngine, ExecutionOpts, JsonReplyInvoker,
    RunReporter, TaskOutcome, TaskStatus,
};
use swarm_core::batch::table::write_table;

fn opts() -> ExecutionOpts {
    let mut o = ExecutionOpts::new("enrich-test");
    o.quiet = true;
    o.max_parallel = 4;
    o.task_timeout = Duration::from_millis(500);
    o
}

#[tokio::test]
async fn agent_json_fills_the_missing_cell() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("companies.csv");
    std::fs::write(&csv, "ticker,company,ceo\nAAPL,Apple,\n").unwrap();

    let plan = plan_from_file(&csv, None).unwrap();
    assert_eq!(plan.tasks.len(), 1);

    let fake = Arc::new(FakeInvoker::new(Script::Reply(
        "{\"ceo\": \"Tim Cook\"}".to_string(),
    )));
    let invoker = Arc::new(JsonReplyInvoker::new(fake));

    let run_dir = create_run_dir(dir.path(), "enrich01").unwrap();
    let (tx, handle) = RunReporter::spawn(&run_dir).unwrap();

    let engine = ExecutionEngine::new(opts());
    engine.execute_batch(&plan.tasks, invoker, tx).await.unwrap();
    let ledger = handle.await.unwrap().unwrap();

    assert_eq!(ledger.succeeded, 1);

    let enriched = merge_ledger(&plan, &ledger);
    let out = dir.path().join("companies_enriched.csv");
    write_table(&out, &enriched).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, "ticker,company,ceo\nAAPL,Apple,Tim Cook\n");
}

#[tokio::test]
async fn non_json_reply_leaves_cell_empty_and_lands_in_failures() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("companies.csv");
    std::fs::write(&csv, "ticker,company,ceo\nAAPL,Apple,\nMSFT,Microsoft,\n").unwrap();

    let plan = plan_from_file(&csv, Some("ticker")).unwrap();

    let fake = Arc::new(
        FakeInvoker::new(Script::Reply("{\"ceo\": \"Satya Nadella\"}".to_string())).script(
            "enrich-AAPL",
            Script::Reply("I'm sorry, I could not find that.".to_string()),
        ),
    );
    let invoker = Arc::new(JsonReplyInvoker::new(fake));

    let run_dir = create_run_dir(dir.path(), "enrich02").unwrap();
    let (tx, handle) = RunReporter::spawn(&run_dir).unwrap();

    let engine = ExecutionEngine::new(opts());
    engine.execute_batch(&plan.tasks, invoker, tx).await.unwrap();
    let ledger = handle.await.unwrap().unwrap();

    assert_eq!(ledger.succeeded, 1);
    assert_eq!(ledger.failed, 1);

    let enriched = merge_ledger(&plan, &ledger);
    // Failed row keeps its target cells exactly as the input had them.
    assert_eq!(enriched.rows[0], vec!["AAPL", "Apple", ""]);
    assert_eq!(enriched.rows[1], vec!["MSFT", "Microsoft", "Satya Nadella"]);

    let failures =
        std::fs::read_to_string(swarm_core::api::failures_path(&run_dir)).unwrap();
    assert!(failures.contains("enrich-AAPL"));
    assert!(failures.contains("JSON object"));
}

#[tokio::test]
async fn full_rows_flow_through_as_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("mixed.csv");
    std::fs::write(&csv, "a,b\nfull,row\nctx,\n").unwrap();

    let plan = plan_from_file(&csv, None).unwrap();
    assert_eq!(plan.full_rows, vec![0]);

    let fake = Arc::new(FakeInvoker::new(Script::Reply("{\"b\": \"x\"}".to_string())));
    let invoker = Arc::new(JsonReplyInvoker::new(fake));

    let run_dir = create_run_dir(dir.path(), "enrich03").unwrap();
    let (tx, handle) = RunReporter::spawn(&run_dir).unwrap();

    // Rows with nothing to enrich are reported skipped up front, the way
    // the CLI does it, so row accounting stays total.
    for row in &plan.full_rows {
        tx.send(TaskOutcome::skipped(
            format!("row-{}", row),
            "row has no empty columns to enrich",
        ))
        .unwrap();
    }

    let engine = ExecutionEngine::new(opts());
    engine.execute_batch(&plan.tasks, invoker, tx).await.unwrap();
    let ledger = handle.await.unwrap().unwrap();

    assert_eq!(ledger.total(), 2);
    assert_eq!(ledger.succeeded, 1);
    assert_eq!(ledger.skipped, 1);
    assert_eq!(
        ledger.outcome_for("row-0").unwrap().status,
        TaskStatus::Skipped
    );

    let enriched = merge_ledger(&plan, &ledger);
    assert_eq!(enriched.rows[0], vec!["full", "row"]);
    assert_eq!(enriched.rows[1], vec!["ctx", "x"]);
}
