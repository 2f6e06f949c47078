use chrono::Local;
use serde_json::{json, Value};
use swarm_core::api::{OutputRendererPlugin, RenderEvent, TaskStatus};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
                total_stages,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "total_tasks": total_tasks,
                    "total_stages": total_stages,
                }
            }),
            RenderEvent::Plan { run_id, stages } => {
                let total_tasks: usize = stages.iter().map(|s| s.len()).sum();
                json!({
                    "v": 1,
                    "event_type": "executor.plan",
                    "ts": ts,
                    "run_id": run_id,
                    "metadata": {
                        "stages": stages,
                        "total_tasks": total_tasks,
                    }
                })
            }
            RenderEvent::StageStart {
                run_id,
                stage_id,
                task_ids,
            } => json!({
                "v": 1,
                "event_type": "stage.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "stage_id": stage_id,
                    "tasks": task_ids,
                }
            }),
            RenderEvent::TaskStart {
                run_id,
                task_id,
                stage_id,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "stage_id": stage_id,
                }
            }),
            RenderEvent::TaskEnd { run_id, outcome } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": outcome.task_id,
                "code": if outcome.status == TaskStatus::Success { 0 } else { 1 },
                "error": outcome.error,
                "metadata": {
                    "status": outcome.status,
                    "duration_ms": outcome.duration_ms,
                    "retries_used": outcome.retries_used,
                }
            }),
            RenderEvent::StageEnd { run_id, stage_id } => json!({
                "v": 1,
                "event_type": "stage.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "stage_id": stage_id,
                }
            }),
            RenderEvent::RunEnd { run_id, report } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "code": if report.failed == 0 { 0 } else { 1 },
                "metadata": {
                    "total_tasks": report.total_tasks,
                    "succeeded": report.succeeded,
                    "failed": report.failed,
                    "skipped": report.skipped,
                    "duration_ms": report.duration_ms,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        let line = if self.pretty_print {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        if let Ok(line) = line {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::api::{ExecutionReport, TaskOutcome};

    #[test]
    fn task_end_event_shape() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::TaskEnd {
            run_id: "run".to_string(),
            outcome: TaskOutcome::failed("task", "timeout", "agent invocation exceeded 300s", 300_000)
                .with_retries(1),
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "task.end");
        assert_eq!(value["code"], 1);
        assert_eq!(value["error"], "timeout");
        assert_eq!(value["metadata"]["retries_used"], 1);
        assert_eq!(value["metadata"]["status"], "failed");
    }

    #[test]
    fn run_end_event_counts() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunEnd {
            run_id: "run".to_string(),
            report: ExecutionReport {
                total_tasks: 3,
                succeeded: 2,
                failed: 0,
                skipped: 1,
                duration_ms: 100,
                stages: Vec::new(),
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["code"], 0);
        assert_eq!(value["metadata"]["total_tasks"], 3);
        assert_eq!(value["metadata"]["skipped"], 1);
    }
}
