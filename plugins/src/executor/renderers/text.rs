use swarm_core::api::{OutputRendererPlugin, RenderEvent, TaskStatus};

pub struct TextRendererPlugin {
    ascii_only: bool,
    verbose: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool, verbose: bool) -> Self {
        Self {
            ascii_only,
            verbose,
        }
    }

    fn format_event(&self, event: &RenderEvent) -> Option<String> {
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
                total_stages,
            } => Some(format!(
                "RUN START {} (tasks: {}, stages: {})",
                run_id, total_tasks, total_stages
            )),
            RenderEvent::Plan { run_id, stages } => {
                if !self.verbose || stages.len() < 2 {
                    return None;
                }
                let mut out = format!("PLAN {}:", run_id);
                for (idx, stage) in stages.iter().enumerate() {
                    out.push_str(&format!("\n  stage {}: {}", idx, stage.join(", ")));
                }
                Some(out)
            }
            RenderEvent::StageStart {
                run_id,
                stage_id,
                task_ids,
            } => self.verbose.then(|| {
                format!(
                    "STAGE START {} (stage {}, tasks: {})",
                    run_id,
                    stage_id,
                    task_ids.len()
                )
            }),
            RenderEvent::TaskStart {
                run_id, task_id, ..
            } => self
                .verbose
                .then(|| format!("TASK START {} (task {})", run_id, task_id)),
            RenderEvent::TaskEnd { run_id, outcome } => {
                let status = match (self.ascii_only, outcome.status) {
                    (true, TaskStatus::Success) => "OK",
                    (true, TaskStatus::Failed) => "FAIL",
                    (true, TaskStatus::Skipped) => "SKIP",
                    (false, TaskStatus::Success) => "SUCCESS",
                    (false, TaskStatus::Failed) => "FAILED",
                    (false, TaskStatus::Skipped) => "SKIPPED",
                };
                let mut line = format!(
                    "TASK END {} (task {}, status {}, duration {}ms",
                    run_id, outcome.task_id, status, outcome.duration_ms
                );
                if outcome.retries_used > 0 {
                    line.push_str(&format!(", retries {}", outcome.retries_used));
                }
                line.push(')');
                if let Some(message) = outcome.message.as_deref() {
                    line.push_str(&format!(": {}", message));
                }
                Some(line)
            }
            RenderEvent::StageEnd { run_id, stage_id } => self
                .verbose
                .then(|| format!("STAGE END {} (stage {})", run_id, stage_id)),
            RenderEvent::RunEnd { run_id, report } => Some(format!(
                "RUN END {} (succeeded {}, failed {}, skipped {}, duration {}ms)",
                run_id, report.succeeded, report.failed, report.skipped, report.duration_ms
            )),
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        if let Some(line) = self.format_event(event) {
            println!("{}", line);
        }
    }
}
