//! Observability port for workflow runs.
//!
//! The coordinator and executor report every transition through a
//! [`WorkflowObserver`] injected at construction. Emitting is synchronous
//! and infallible, so an observer can never slow down or fail a run;
//! implementations that talk to a remote backend queue the event and
//! deliver it in the background.

use chrono::{DateTime, Utc};
use contentlens_core::{Capability, Evaluation, TaskStatus};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// State of the workflow coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "cursor", rename_all = "snake_case")]
pub enum WorkflowPhase {
    Init,
    Extracted,
    Routed,
    /// Running the batch at this cursor.
    BatchRunning(usize),
    Done,
    Failed,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowPhase::Init => f.write_str("init"),
            WorkflowPhase::Extracted => f.write_str("extracted"),
            WorkflowPhase::Routed => f.write_str("routed"),
            WorkflowPhase::BatchRunning(cursor) => write!(f, "batch_running({cursor})"),
            WorkflowPhase::Done => f.write_str("done"),
            WorkflowPhase::Failed => f.write_str("failed"),
        }
    }
}

/// One observable step of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    WorkflowStarted {
        trace_id: String,
        user_request: String,
        source_lang: String,
        timestamp: DateTime<Utc>,
    },
    PhaseChanged {
        trace_id: String,
        phase: WorkflowPhase,
    },
    /// A non-capability stage finished (`extraction`, `refinement`, `routing`).
    StageCompleted {
        trace_id: String,
        stage: String,
        duration_ms: u64,
        output: serde_json::Value,
    },
    TaskFinished {
        trace_id: String,
        capability: Capability,
        status: TaskStatus,
        duration_ms: u64,
        error: Option<String>,
        output: Option<String>,
    },
    Evaluated {
        trace_id: String,
        evaluation: Evaluation,
    },
    WorkflowFinished {
        trace_id: String,
        succeeded: bool,
        error: Option<String>,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn trace_id(&self) -> &str {
        match self {
            TraceEvent::WorkflowStarted { trace_id, .. }
            | TraceEvent::PhaseChanged { trace_id, .. }
            | TraceEvent::StageCompleted { trace_id, .. }
            | TraceEvent::TaskFinished { trace_id, .. }
            | TraceEvent::Evaluated { trace_id, .. }
            | TraceEvent::WorkflowFinished { trace_id, .. } => trace_id,
        }
    }
}

/// Receives trace events. Must not block.
pub trait WorkflowObserver: Send + Sync {
    fn emit(&self, event: TraceEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {
    fn emit(&self, _event: TraceEvent) {}
}

/// Writes events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl WorkflowObserver for LogObserver {
    fn emit(&self, event: TraceEvent) {
        match &event {
            TraceEvent::TaskFinished {
                trace_id,
                capability,
                status,
                duration_ms,
                error: Some(error),
                ..
            } => warn!(
                trace_id = %trace_id,
                capability = %capability,
                status = ?status,
                duration_ms,
                error = %error,
                "Task failed"
            ),
            TraceEvent::WorkflowFinished {
                trace_id,
                succeeded: false,
                error,
                ..
            } => warn!(trace_id = %trace_id, error = ?error, "Workflow failed"),
            other => match serde_json::to_string(other) {
                Ok(json) => info!(trace_id = %other.trace_id(), event = %json, "trace"),
                Err(_) => info!(trace_id = %other.trace_id(), event = ?other, "trace"),
            },
        }
    }
}

/// Forwards every event to each inner observer.
pub struct FanoutObserver {
    observers: Vec<std::sync::Arc<dyn WorkflowObserver>>,
}

impl FanoutObserver {
    pub fn new(observers: Vec<std::sync::Arc<dyn WorkflowObserver>>) -> Self {
        Self { observers }
    }
}

impl WorkflowObserver for FanoutObserver {
    fn emit(&self, event: TraceEvent) {
        for observer in &self.observers {
            observer.emit(event.clone());
        }
    }
}
