use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::report::TaskStatus;

/// Visual progress monitor for batch execution: an overall bar plus one
/// spinner per in-flight task. Disabled for jsonl output and quiet mode.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: HashMap<String, ProgressBar>,
    enabled: bool,
}

impl ProgressMonitor {
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: HashMap::new(),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));

        overall.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}",
                )
                .unwrap()
                .progress_chars("█▓▒░  "),
        );

        Self {
            multi,
            overall,
            task_bars: HashMap::new(),
            enabled: true,
        }
    }

    pub fn add_task(&mut self, task_id: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .unwrap(),
        );
        bar.set_message(task_id.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        self.task_bars.insert(task_id.to_string(), bar);
    }

    pub fn complete_task(&mut self, task_id: &str, status: TaskStatus, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.task_bars.remove(task_id) {
            let label = match status {
                TaskStatus::Success => "ok",
                TaskStatus::Failed => "failed",
                TaskStatus::Skipped => "skipped",
            };
            bar.finish_with_message(format!("{} {} ({}ms)", label, task_id, duration_ms));
        }

        self.overall.inc(1);
    }

    pub fn finish(&self, all_success: bool) {
        if !self.enabled {
            return;
        }

        let msg = if all_success {
            "all tasks completed"
        } else {
            "completed with failures"
        };
        self.overall.finish_with_message(msg.to_string());
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, bar) in self.task_bars.drain() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_monitor_is_inert() {
        let mut monitor = ProgressMonitor::new(3, false);
        monitor.add_task("task1");
        monitor.complete_task("task1", TaskStatus::Success, 100);
        monitor.finish(true);
    }

    #[test]
    fn enabled_monitor_tracks_tasks() {
        let mut monitor = ProgressMonitor::new(2, true);
        monitor.add_task("task1");
        monitor.add_task("task2");
        monitor.complete_task("task1", TaskStatus::Success, 100);
        monitor.complete_task("task2", TaskStatus::Failed, 200);
        monitor.finish(false);
    }
}
