use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use crate::error::ExecutorError;

use super::types::TaskDispatch;

/// Run one stage's tasks through a bounded worker pool.
///
/// At most `max_concurrency` executor futures hold a permit at any moment;
/// completion order is whatever the pool produces. `executor_fn` must
/// capture task failures into its `TaskDispatch`; an `Err` here is an
/// infrastructure fault and aborts the stage.
pub async fn execute_stage_parallel<F, Fut>(
    task_ids: &[String],
    max_concurrency: usize,
    executor_fn: F,
) -> Result<HashMap<String, TaskDispatch>, ExecutorError>
where
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: std::future::Future<Output = Result<TaskDispatch, ExecutorError>> + Send,
{
    let sem = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut futs: FuturesUnordered<_> = FuturesUnordered::new();

    for id in task_ids {
        let task_id = id.clone();
        let sem = sem.clone();
        let executor = executor_fn.clone();

        futs.push(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|_| ExecutorError::Scheduler("semaphore closed unexpectedly".into()))?;

            executor(task_id).await
        });
    }

    let mut results: HashMap<String, TaskDispatch> = HashMap::new();

    while let Some(res) = futs.next().await {
        let dispatch = res?;
        results.insert(dispatch.task_id.clone(), dispatch);
    }

    Ok(results)
}
