use async_trait::async_trait;
use thiserror::Error;

use crate::batch::TaskRecord;

/// Failures surfaced by an agent invocation. The per-task timeout is not
/// represented here: the engine owns the deadline and classifies expiry
/// itself.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("agent invocation failed: {0}")]
    Failed(String),

    #[error("agent unavailable: {0}")]
    Unavailable(String),
}

impl InvokeError {
    /// Short classification used in the `error` field of a task outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Failed(_) => "invocation",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// The seam to the external agent collaborator: one call per task,
/// returning the agent's final text. Everything behind this trait (LLM
/// loop, tool use, sub-agents) is out of this crate's hands.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, task: &TaskRecord) -> Result<String, InvokeError>;
}
