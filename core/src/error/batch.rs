use thiserror::Error;

/// Process-level error codes reported by the CLI and in jsonl `error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    GeneralError = 1,
    ParseError = 2,
    ValidationError = 3,
    DependencyError = 11,
    CircularDependency = 12,
    AgentError = 20,
    Timeout = 30,
    FileNotFound = 60,
    OutputError = 61,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Batch-level errors: anything that rejects the whole run before a single
/// task is dispatched.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("task file not found: {0}")]
    TaskFileNotFound(String),

    #[error("task file is empty: no records found")]
    EmptyBatch,

    #[error("record {line} is invalid: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("record {line} has no description (accepted fields: description, task, prompt)")]
    MissingDescription { line: usize },

    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("unknown dependency '{dep}' on task '{task}'")]
    UnknownDependency { task: String, dep: String },

    #[error("circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("nothing to enrich: all {0} rows are fully populated")]
    NoTargetColumns(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::TaskFileNotFound(_) => ErrorCode::FileNotFound,
            Self::EmptyBatch => ErrorCode::ParseError,
            Self::InvalidRecord { .. } => ErrorCode::ParseError,
            Self::MissingDescription { .. } => ErrorCode::ParseError,
            Self::DuplicateTaskId(_) => ErrorCode::ValidationError,
            Self::UnknownDependency { .. } => ErrorCode::DependencyError,
            Self::CircularDependency(_) => ErrorCode::CircularDependency,
            Self::NoTargetColumns(_) => ErrorCode::ValidationError,
            Self::Io(_) => ErrorCode::GeneralError,
        }
    }
}
