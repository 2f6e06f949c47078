use thiserror::Error;

use super::batch::BatchError;
use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("batch rejected: {0}")]
    Batch(#[from] BatchError),
    #[error("execution failed: {0}")]
    Executor(#[from] ExecutorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
