use clap::{ArgGroup, Parser};

/// Parallel batch executor for agent tasks.
///
/// Feed it a task file (JSONL or CSV/TSV) to run every task through the
/// configured agent, or `--enrich` a partially-filled CSV to have the
/// agent fill in the blanks.
#[derive(Parser, Debug, Clone)]
#[command(name = "swarm", version, about)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["task_file", "enrich"]),
))]
pub struct Args {
    /// Task file: one JSON record per line, or a delimited table with a
    /// header row.
    pub task_file: Option<String>,

    /// Enrichment mode: CSV whose empty cells the agent should fill.
    #[arg(long, value_name = "CSV")]
    pub enrich: Option<String>,

    /// Worker-pool size (hard ceiling 50).
    #[arg(long, visible_alias = "concurrency", value_name = "N")]
    pub num_parallel: Option<usize>,

    /// Root directory for run artifacts (summary.json, results.jsonl,
    /// failures.jsonl land in a timestamped subdirectory).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Enrichment output path (default: input name with `_enriched`).
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,

    /// Column whose value seeds each enrichment task's id.
    #[arg(long, value_name = "COL")]
    pub id_column: Option<String>,

    /// Stdout event stream format.
    #[arg(long, default_value = "text", value_parser = ["text", "jsonl"])]
    pub stream_format: String,

    /// Per-task timeout in seconds (overrides config).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub quiet: bool,

    #[arg(long)]
    pub verbose: bool,

    /// ASCII-only status markers.
    #[arg(long)]
    pub ascii: bool,
}
