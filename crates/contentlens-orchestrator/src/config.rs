use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The `[workflow]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Upper bound for one capability task, counted once it holds a permit.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
    /// Capability tasks allowed in flight at once across every request.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
    /// Rewrite the user request after extraction.
    #[serde(default = "default_true")]
    pub refine: bool,
    /// Score extraction, refinement and every successful task.
    #[serde(default = "default_true")]
    pub judge: bool,
}

fn default_task_timeout_secs() -> u64 {
    120
}

fn default_max_concurrent_tasks() -> usize {
    16
}

fn default_true() -> bool {
    true
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            task_timeout_secs: default_task_timeout_secs(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            refine: true,
            judge: true,
        }
    }
}

impl WorkflowConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }
}
