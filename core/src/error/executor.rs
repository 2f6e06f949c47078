use thiserror::Error;

use super::batch::{BatchError, ErrorCode};

/// Executor-specific errors for graph construction and batch execution.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("unknown dependency: task '{task_id}' is blocked by '{missing_dep}'")]
    DependencyNotFound {
        task_id: String,
        missing_dep: String,
    },

    #[error("circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error("batch error: {0}")]
    Batch(#[from] BatchError),
}

impl ExecutorError {
    /// Map executor error to a process-level error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateTaskId(_) => ErrorCode::ValidationError,
            Self::DependencyNotFound { .. } => ErrorCode::DependencyError,
            Self::CircularDependency(_) => ErrorCode::CircularDependency,
            Self::Scheduler(_) => ErrorCode::GeneralError,
            Self::Batch(e) => e.error_code(),
        }
    }
}
