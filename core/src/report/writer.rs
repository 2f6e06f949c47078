use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use super::types::{RunSummary, TaskOutcome};

/// Create `<root>/<timestamp>_<run_id8>/` for one run's artifacts.
///
/// Callers must not create this before parsing and validation succeed: a
/// rejected batch leaves no output directory behind.
pub fn create_run_dir(output_root: &Path, run_id: &str) -> std::io::Result<PathBuf> {
    let short_id: String = run_id.chars().take(8).collect();
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let dir = output_root.join(format!("{}_{}", stamp, short_id));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Incremental writer for the two detail files.
pub struct OutcomeWriter {
    results: BufWriter<File>,
    failures: BufWriter<File>,
}

impl OutcomeWriter {
    pub fn create(run_dir: &Path) -> std::io::Result<Self> {
        Ok(Self {
            results: BufWriter::new(File::create(super::results_path(run_dir))?),
            failures: BufWriter::new(File::create(super::failures_path(run_dir))?),
        })
    }

    pub fn append(&mut self, outcome: &TaskOutcome) -> std::io::Result<()> {
        let line = serde_json::to_string(outcome)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.results, "{}", line)?;
        if outcome.status.is_terminal_failure() {
            writeln!(self.failures, "{}", line)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.results.flush()?;
        self.failures.flush()
    }
}

pub fn write_summary(run_dir: &Path, summary: &RunSummary) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(super::summary_path(run_dir), json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_dir_embeds_short_run_id() {
        let root = tempfile::tempdir().unwrap();
        let dir = create_run_dir(root.path(), "0123456789abcdef").unwrap();
        let name = dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("_01234567"), "dir name: {}", name);
        assert!(dir.is_dir());
    }

    #[test]
    fn summary_is_valid_json() {
        let root = tempfile::tempdir().unwrap();
        let dir = create_run_dir(root.path(), "feedface").unwrap();
        let summary = RunSummary {
            run_id: "feedface".into(),
            total: 2,
            succeeded: 2,
            failed: 0,
            skipped: 0,
            duration_seconds: 1.5,
            concurrency: 2,
            results_path: "results.jsonl".into(),
            failures_path: "failures.jsonl".into(),
            started_at: "2026-01-01T00:00:00Z".into(),
        };
        write_summary(&dir, &summary).unwrap();

        let raw = std::fs::read_to_string(super::super::summary_path(&dir)).unwrap();
        let parsed: RunSummary = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.total, 2);
        assert_eq!(parsed.succeeded, 2);
    }
}
