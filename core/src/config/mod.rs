mod load;
mod types;

pub use load::{get_swarm_data_dir, load_default, load_from_path};
pub use types::{
    AgentConfig, AppConfig, BatchConfig, ConcurrencyConfig, ExecutionConfig, LoggingConfig,
    OutputConfig, RetryConfig,
};
