use contentlens_core::{Capability, TaskStatus};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Counters for one capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapabilityMetrics {
    pub invocations: u64,
    pub completed: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub total_duration_ms: u64,
}

impl CapabilityMetrics {
    pub fn average_duration_ms(&self) -> u64 {
        self.total_duration_ms
            .checked_div(self.invocations)
            .unwrap_or_default()
    }
}

/// Process-wide per-capability counters, shared by every workflow run.
pub struct CapabilityMonitor {
    metrics: Arc<RwLock<HashMap<Capability, CapabilityMetrics>>>,
}

impl CapabilityMonitor {
    pub fn new() -> Self {
        let metrics = Capability::ALL
            .into_iter()
            .map(|c| (c, CapabilityMetrics::default()))
            .collect();
        Self {
            metrics: Arc::new(RwLock::new(metrics)),
        }
    }

    /// Record the outcome of one task.
    pub async fn record(&self, capability: Capability, status: TaskStatus, duration_ms: u64) {
        let mut metrics = self.metrics.write().await;
        let entry = metrics.entry(capability).or_default();
        entry.invocations += 1;
        entry.total_duration_ms += duration_ms;
        match status {
            TaskStatus::Completed => entry.completed += 1,
            TaskStatus::Failed => entry.failures += 1,
            TaskStatus::TimedOut => entry.timeouts += 1,
        }
    }

    pub async fn get(&self, capability: Capability) -> CapabilityMetrics {
        let metrics = self.metrics.read().await;
        metrics.get(&capability).cloned().unwrap_or_default()
    }

    /// Aggregate counters across all capabilities.
    pub async fn aggregate(&self) -> CapabilityMetrics {
        let metrics = self.metrics.read().await;
        let mut total = CapabilityMetrics::default();
        for m in metrics.values() {
            total.invocations += m.invocations;
            total.completed += m.completed;
            total.failures += m.failures;
            total.timeouts += m.timeouts;
            total.total_duration_ms += m.total_duration_ms;
        }
        total
    }

    /// Serialize the counters as JSON, keyed by capability name.
    pub async fn to_json(&self) -> serde_json::Value {
        let capabilities: serde_json::Map<String, serde_json::Value> = {
            let metrics = self.metrics.read().await;
            Capability::ALL
                .into_iter()
                .map(|c| {
                    let m = metrics.get(&c).cloned().unwrap_or_default();
                    let mut value = serde_json::to_value(&m).unwrap_or_default();
                    value["average_duration_ms"] = m.average_duration_ms().into();
                    (c.name().to_string(), value)
                })
                .collect()
        };
        serde_json::json!({
            "capabilities": capabilities,
            "aggregate": self.aggregate().await,
        })
    }
}

impl Default for CapabilityMonitor {
    fn default() -> Self {
        Self::new()
    }
}
