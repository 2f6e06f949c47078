use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of work: a natural-language instruction handed to the external
/// agent, plus routing and scheduling metadata. Immutable once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,

    pub description: String,

    /// Agent profile tag. Selects which agent profile handles the task.
    #[serde(rename = "type", default = "default_agent_type")]
    pub agent_type: String,

    /// Legacy ordering constraint: ids of tasks that must succeed before
    /// this one is dispatched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,

    /// Opaque user key/values, passed through unchanged into the result.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// Per-task timeout override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

fn default_agent_type() -> String {
    "general".to_string()
}

impl TaskRecord {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            agent_type: default_agent_type(),
            blocked_by: Vec::new(),
            metadata: Map::new(),
            timeout: None,
        }
    }
}

/// Common task interface for executor graph handling.
pub trait TaskLike: Clone + Send + Sync {
    fn id(&self) -> &str;
    fn blocked_by(&self) -> &[String];
}

impl TaskLike for TaskRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn blocked_by(&self) -> &[String] {
        &self.blocked_by
    }
}
