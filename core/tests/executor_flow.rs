mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeInvoker, Script};
use swarm_core::api::{
    ExecutionEngine, ExecutionOpts, ExecutorError, TaskOutcome, TaskRecord, TaskStatus,
};
use tokio::sync::mpsc;

fn task(id: &str) -> TaskRecord {
    TaskRecord::new(id, format!("run {}", id))
}

fn blocked(id: &str, blockers: &[&str]) -> TaskRecord {
    let mut t = task(id);
    t.blocked_by = blockers.iter().map(|s| s.to_string()).collect();
    t
}

fn opts(max_parallel: usize) -> ExecutionOpts {
    let mut o = ExecutionOpts::new("test-run");
    o.quiet = true;
    o.max_parallel = max_parallel;
    o.task_timeout = Duration::from_millis(500);
    o
}

async fn run(
    tasks: Vec<TaskRecord>,
    invoker: Arc<FakeInvoker>,
    max_parallel: usize,
) -> Result<Vec<TaskOutcome>, ExecutorError> {
    let engine = ExecutionEngine::new(opts(max_parallel));
    let (tx, mut rx) = mpsc::unbounded_channel();
    engine.execute_batch(&tasks, invoker, tx).await?;

    let mut outcomes = Vec::new();
    while let Ok(outcome) = rx.try_recv() {
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

#[tokio::test]
async fn every_task_gets_exactly_one_outcome() {
    let invoker = Arc::new(
        FakeInvoker::echo()
            .script("b", Script::Fail("boom".to_string()))
            .script("d", Script::Fail("boom".to_string())),
    );
    let tasks = vec![task("a"), task("b"), task("c"), task("d"), task("e")];

    let outcomes = run(tasks, invoker, 3).await.unwrap();

    assert_eq!(outcomes.len(), 5);
    let mut ids: Vec<&str> = outcomes.iter().map(|o| o.task_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.status == TaskStatus::Failed)
        .map(|o| o.task_id.as_str())
        .collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.contains(&"b") && failed.contains(&"d"));
}

#[tokio::test]
async fn failure_is_isolated_to_its_task() {
    let invoker =
        Arc::new(FakeInvoker::echo().script("bad", Script::Fail("agent exploded".to_string())));
    let tasks = vec![task("good1"), task("bad"), task("good2")];

    let outcomes = run(tasks, invoker, 3).await.unwrap();

    let by_id = |id: &str| outcomes.iter().find(|o| o.task_id == id).unwrap();
    assert_eq!(by_id("good1").status, TaskStatus::Success);
    assert_eq!(by_id("good2").status, TaskStatus::Success);
    let bad = by_id("bad");
    assert_eq!(bad.status, TaskStatus::Failed);
    assert_eq!(bad.error.as_deref(), Some("invocation"));
}

#[tokio::test]
async fn timeout_fails_only_the_slow_task() {
    let invoker = Arc::new(
        FakeInvoker::echo().script("slow", Script::Hang(Duration::from_secs(30))),
    );
    let tasks = vec![task("slow"), task("fast1"), task("fast2")];

    let started = std::time::Instant::now();
    let outcomes = run(tasks, invoker, 3).await.unwrap();

    // The 500ms deadline bounds the whole batch; nowhere near the 30s hang.
    assert!(started.elapsed() < Duration::from_secs(5));

    let slow = outcomes.iter().find(|o| o.task_id == "slow").unwrap();
    assert_eq!(slow.status, TaskStatus::Failed);
    assert_eq!(slow.error.as_deref(), Some("timeout"));

    for id in ["fast1", "fast2"] {
        let o = outcomes.iter().find(|o| o.task_id == id).unwrap();
        assert_eq!(o.status, TaskStatus::Success);
    }
}

#[tokio::test]
async fn per_task_timeout_overrides_default() {
    let invoker =
        Arc::new(FakeInvoker::echo().script("slow", Script::Hang(Duration::from_millis(400))));
    // Default deadline is 500ms; this record shrinks its own to ~0s, so the
    // hang trips it while the other task still succeeds.
    let mut slow = task("slow");
    slow.timeout = Some(0);
    let tasks = vec![slow, task("ok")];

    let outcomes = run(tasks, invoker, 2).await.unwrap();
    let slow = outcomes.iter().find(|o| o.task_id == "slow").unwrap();
    assert_eq!(slow.error.as_deref(), Some("timeout"));
    let ok = outcomes.iter().find(|o| o.task_id == "ok").unwrap();
    assert_eq!(ok.status, TaskStatus::Success);
}

#[tokio::test]
async fn failed_blocker_skips_dependents_without_dispatch() {
    let invoker = Arc::new(FakeInvoker::echo().script("a", Script::Fail("boom".to_string())));
    let tasks = vec![
        task("a"),
        blocked("b", &["a"]),
        blocked("c", &["b"]),
        task("d"),
    ];

    let outcomes = run(tasks, invoker.clone(), 4).await.unwrap();

    let by_id = |id: &str| outcomes.iter().find(|o| o.task_id == id).unwrap();
    assert_eq!(by_id("a").status, TaskStatus::Failed);
    assert_eq!(by_id("b").status, TaskStatus::Skipped);
    assert!(by_id("b").message.as_deref().unwrap().contains("'a'"));
    // Transitive: c is skipped because b was skipped.
    assert_eq!(by_id("c").status, TaskStatus::Skipped);
    assert_eq!(by_id("d").status, TaskStatus::Success);

    // Skipped tasks never reach the agent.
    assert!(!invoker.called("b"));
    assert!(!invoker.called("c"));
    assert_eq!(invoker.call_count(), 2);
}

#[tokio::test]
async fn blockers_complete_before_dependents_start() {
    let invoker = Arc::new(FakeInvoker::echo());
    let tasks = vec![blocked("after", &["before"]), task("before")];

    run(tasks, invoker.clone(), 4).await.unwrap();

    let calls = invoker.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["before", "after"]);
}

#[tokio::test]
async fn concurrency_stays_within_bound() {
    let invoker = Arc::new(FakeInvoker::echo());
    let tasks: Vec<TaskRecord> = (0..12).map(|i| task(&format!("t{}", i))).collect();

    let outcomes = run(tasks, invoker.clone(), 3).await.unwrap();

    assert_eq!(outcomes.len(), 12);
    assert!(
        invoker.high_water() <= 3,
        "observed {} concurrent invocations",
        invoker.high_water()
    );
    // Sanity: the pool actually overlapped work.
    assert!(invoker.high_water() >= 2);
}

#[tokio::test]
async fn duplicate_ids_reject_batch_before_any_dispatch() {
    let invoker = Arc::new(FakeInvoker::echo());
    let tasks = vec![task("same"), task("same")];

    let engine = ExecutionEngine::new(opts(2));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let err = engine
        .execute_batch(&tasks, invoker.clone(), tx)
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutorError::DuplicateTaskId(id) if id == "same"));
    assert_eq!(invoker.call_count(), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn metadata_passes_through_to_outcome() {
    let invoker = Arc::new(FakeInvoker::echo());
    let mut t = task("tagged");
    t.metadata.insert(
        "owner".to_string(),
        serde_json::Value::String("ops".to_string()),
    );

    let outcomes = run(vec![t], invoker, 1).await.unwrap();
    assert_eq!(outcomes[0].metadata.get("owner").unwrap(), "ops");
}
