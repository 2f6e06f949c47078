use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub executor: ExecutionConfig,

    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "swarm_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Batch-run defaults: where run artifacts land and how long a single task
/// may spend in the agent before it is failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Root under which each run creates its timestamped output directory.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Worker-pool size when the CLI does not override it.
    #[serde(default = "default_max_parallel_tasks")]
    pub max_parallel_tasks: usize,

    /// Per-task timeout in seconds.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
}

fn default_output_root() -> String {
    "./batch-results".to_string()
}

fn default_max_parallel_tasks() -> usize {
    10
}

fn default_task_timeout_secs() -> u64 {
    300
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            max_parallel_tasks: default_max_parallel_tasks(),
            task_timeout_secs: default_task_timeout_secs(),
        }
    }
}

/// Executor plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_format")]
    pub format: String,
    #[serde(default)]
    pub pretty_print: bool,
    #[serde(default)]
    pub ascii_only: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            pretty_print: false,
            ascii_only: false,
        }
    }
}

fn default_output_format() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Total attempts per task. 1 means no retries.
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_retry_strategy(),
            base_delay_ms: default_retry_base_delay_ms(),
            max_delay_ms: default_retry_max_delay_ms(),
            max_attempts: default_retry_max_attempts(),
        }
    }
}

fn default_retry_strategy() -> String {
    "exponential-backoff".to_string()
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_retry_max_attempts() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default = "default_concurrency_strategy")]
    pub strategy: String,
    #[serde(default = "default_min_concurrency")]
    pub min_concurrency: usize,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub cpu_threshold_low: f32,
    #[serde(default)]
    pub cpu_threshold_high: f32,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            strategy: default_concurrency_strategy(),
            min_concurrency: default_min_concurrency(),
            max_concurrency: default_max_concurrency(),
            cpu_threshold_low: 50.0,
            cpu_threshold_high: 80.0,
        }
    }
}

fn default_concurrency_strategy() -> String {
    "fixed".to_string()
}

fn default_min_concurrency() -> usize {
    1
}

fn default_max_concurrency() -> usize {
    50
}

/// How to reach the external agent that actually executes task descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Binary (or path) spawned once per task.
    #[serde(default = "default_agent_command")]
    pub command: String,

    /// Extra arguments passed before the profile flag.
    #[serde(default)]
    pub args: Vec<String>,

    /// Flag used to pass the task's type tag, e.g. `--profile general`.
    /// Empty string disables profile passing.
    #[serde(default = "default_profile_flag")]
    pub profile_flag: String,

    /// Maps task `type` tags to agent profile names. Unmapped tags are
    /// passed through verbatim.
    #[serde(default)]
    pub profiles: HashMap<String, String>,
}

fn default_agent_command() -> String {
    "agent".to_string()
}

fn default_profile_flag() -> String {
    "--profile".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
            args: Vec::new(),
            profile_flag: default_profile_flag(),
            profiles: HashMap::new(),
        }
    }
}
