use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default swarm data directory: ~/.swarm
pub fn get_swarm_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".swarm"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<AppConfig>(&s)?)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.swarm/config.toml (highest)
    let swarm_dir = get_swarm_data_dir()?;
    let swarm_config = swarm_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if swarm_config.exists() {
        load_from_path(&swarm_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    // Default the log directory to the swarm data directory if not set.
    if cfg
        .logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .is_none()
    {
        let logs_dir = swarm_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_from_path_reads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "[batch]\nmax_parallel_tasks = 4\ntask_timeout_secs = 30\n\n[agent]\ncommand = \"mock-agent\""
        )
        .unwrap();

        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.batch.max_parallel_tasks, 4);
        assert_eq!(cfg.batch.task_timeout_secs, 30);
        assert_eq!(cfg.agent.command, "mock-agent");
        // Untouched sections keep their defaults.
        assert_eq!(cfg.executor.retry.max_attempts, 1);
        assert_eq!(cfg.executor.concurrency.max_concurrency, 50);
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.batch.max_parallel_tasks, 10);
        assert_eq!(cfg.batch.task_timeout_secs, 300);
        assert_eq!(cfg.batch.output_root, "./batch-results");
    }
}
