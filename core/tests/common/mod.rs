#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use swarm_core::api::{AgentInvoker, InvokeError, TaskRecord};

/// Scripted stand-in for the external agent.
#[derive(Clone)]
pub enum Script {
    Reply(String),
    Fail(String),
    /// Never completes within any sane test deadline.
    Hang(Duration),
}

pub struct FakeInvoker {
    scripts: HashMap<String, Script>,
    default: Script,
    /// Order in which tasks actually reached the agent.
    pub calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl FakeInvoker {
    pub fn new(default: Script) -> Self {
        Self {
            scripts: HashMap::new(),
            default,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        }
    }

    pub fn echo() -> Self {
        Self::new(Script::Reply("done".to_string()))
    }

    pub fn script(mut self, task_id: &str, script: Script) -> Self {
        self.scripts.insert(task_id.to_string(), script);
        self
    }

    pub fn called(&self, task_id: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c == task_id)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of concurrently in-flight invocations observed.
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentInvoker for FakeInvoker {
    fn name(&self) -> &str {
        "fake"
    }

    async fn invoke(&self, task: &TaskRecord) -> Result<String, InvokeError> {
        self.calls.lock().unwrap().push(task.id.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        // Hold the slot briefly so overlap is observable.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let script = self.scripts.get(&task.id).unwrap_or(&self.default).clone();
        let result = match script {
            Script::Reply(text) => Ok(text),
            Script::Fail(msg) => Err(InvokeError::Failed(msg)),
            Script::Hang(d) => {
                tokio::time::sleep(d).await;
                Ok("late".to_string())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
