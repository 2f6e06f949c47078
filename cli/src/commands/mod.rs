pub mod cli;
pub mod enrich;
pub mod run;

use std::time::Duration;

use swarm_core::api::{AppConfig, CliError, ExecutionOpts};
use swarm_plugins::factory;

use self::cli::Args;

/// Resolve execution options from config + CLI flags.
pub fn resolve_opts(args: &Args, cfg: &AppConfig, run_id: &str) -> Result<ExecutionOpts, CliError> {
    if args.quiet && args.verbose {
        return Err(CliError::Command(
            "--quiet and --verbose are mutually exclusive".to_string(),
        ));
    }

    let max_parallel = factory::clamp_concurrency(
        args.num_parallel.unwrap_or(cfg.batch.max_parallel_tasks),
    );

    let mut opts = ExecutionOpts::new(run_id);
    opts.stream_format = args.stream_format.clone();
    opts.verbose = args.verbose;
    opts.quiet = args.quiet;
    opts.ascii = args.ascii;
    opts.max_parallel = max_parallel;
    opts.task_timeout = Duration::from_secs(args.timeout.unwrap_or(cfg.batch.task_timeout_secs));
    opts.progress_bar = args.stream_format == "text" && !args.quiet && !args.verbose;

    Ok(opts)
}
