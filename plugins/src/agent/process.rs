//! Subprocess-backed agent invoker.
//!
//! Each task spawns the configured agent command once, feeds the task
//! description on stdin, and takes stdout as the agent's reply. The task's
//! type tag is forwarded as a profile argument so one binary can serve
//! multiple agent profiles.

use std::process::Stdio;

use async_trait::async_trait;
use swarm_core::api::{AgentConfig, AgentInvoker, InvokeError, TaskRecord};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const STDERR_TAIL_BYTES: usize = 2048;

pub struct ProcessInvoker {
    cfg: AgentConfig,
}

impl ProcessInvoker {
    pub fn new(cfg: AgentConfig) -> Self {
        Self { cfg }
    }

    fn profile_for(&self, task: &TaskRecord) -> String {
        self.cfg
            .profiles
            .get(&task.agent_type)
            .cloned()
            .unwrap_or_else(|| task.agent_type.clone())
    }

    fn build_command(&self, task: &TaskRecord) -> Command {
        let mut cmd = Command::new(&self.cfg.command);
        cmd.args(&self.cfg.args);
        if !self.cfg.profile_flag.is_empty() {
            cmd.arg(&self.cfg.profile_flag).arg(self.profile_for(task));
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl AgentInvoker for ProcessInvoker {
    fn name(&self) -> &str {
        "process"
    }

    async fn invoke(&self, task: &TaskRecord) -> Result<String, InvokeError> {
        tracing::debug!(task_id = %task.id, command = %self.cfg.command, "spawning agent process");
        let mut child = self
            .build_command(task)
            .spawn()
            .map_err(|e| InvokeError::Unavailable(format!("{}: {}", self.cfg.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(task.description.as_bytes())
                .await
                .map_err(|e| InvokeError::Failed(format!("writing prompt: {}", e)))?;
            // Closing stdin signals end of prompt.
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| InvokeError::Failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail_start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
            return Err(InvokeError::Failed(format!(
                "agent exited with {}: {}",
                output.status,
                stderr[tail_start..].trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoker(command: &str, args: &[&str]) -> ProcessInvoker {
        ProcessInvoker::new(AgentConfig {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            profile_flag: String::new(),
            profiles: Default::default(),
        })
    }

    #[tokio::test]
    async fn stdout_becomes_the_reply() {
        let invoker = invoker("sh", &["-c", "cat"]);
        let task = TaskRecord::new("t", "hello agent");
        let reply = invoker.invoke(&task).await.unwrap();
        assert_eq!(reply, "hello agent");
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_failure() {
        let invoker = invoker("sh", &["-c", "echo oops >&2; exit 3"]);
        let task = TaskRecord::new("t", "whatever");
        let err = invoker.invoke(&task).await.unwrap_err();
        match err {
            InvokeError::Failed(msg) => {
                assert!(msg.contains("oops"), "message: {}", msg);
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let invoker = invoker("definitely-not-a-real-binary-xyz", &[]);
        let task = TaskRecord::new("t", "whatever");
        let err = invoker.invoke(&task).await.unwrap_err();
        assert!(matches!(err, InvokeError::Unavailable(_)));
    }
}
