//! Concurrent execution of one batch of capability tasks.
//!
//! Every task gets a [`TaskInput`] snapshot taken before any task in the
//! batch starts. Results come back as a [`BatchOutcome`] and are merged
//! into the state afterwards, one owned field per capability, so no task
//! ever observes a sibling's write.

use crate::monitor::CapabilityMonitor;
use crate::observer::{NoopObserver, TraceEvent, WorkflowObserver};
use crate::registry::AgentRegistry;
use crate::validation::validate_output;
use chrono::Utc;
use contentlens_core::{
    Capability, CapabilityOutput, ContentLensError, ContentLensResult, Evaluation, Judge,
    TaskInput, TaskMetadata, TaskStatus, WorkflowState,
};
use futures_util::future::join_all;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Result of one task, ready to merge.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub capability: Capability,
    /// `None` when the task failed or timed out.
    pub output: Option<CapabilityOutput>,
    pub metadata: TaskMetadata,
    pub evaluation: Option<Evaluation>,
}

impl TaskReport {
    fn aborted(capability: Capability, reason: &str) -> Self {
        let started_at = Utc::now();
        let error = ContentLensError::Orchestrator(format!("task aborted: {reason}"));
        Self {
            capability,
            output: None,
            metadata: TaskMetadata {
                agent_id: format!("{capability}_{}", started_at.timestamp_millis()),
                status: TaskStatus::Failed,
                started_at,
                duration_ms: 0,
                error: Some(error.task_message()),
                validation_passed: false,
            },
            evaluation: None,
        }
    }
}

/// All task reports of one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub reports: Vec<TaskReport>,
}

impl BatchOutcome {
    /// Capabilities that produced no output.
    pub fn failed(&self) -> Vec<Capability> {
        self.reports
            .iter()
            .filter(|r| r.output.is_none())
            .map(|r| r.capability)
            .collect()
    }

    /// Disjoint-key merge: each report writes only the fields its
    /// capability owns.
    pub fn merge_into(self, state: &mut WorkflowState) {
        for report in self.reports {
            let capability = report.capability;
            let mut metadata = report.metadata;

            match report.output {
                Some(output) => {
                    if let Err(e) = state.set_output(capability, output) {
                        let message = e.task_message();
                        warn!(capability = %capability, error = %message, "Rejected task output");
                        metadata.status = TaskStatus::Failed;
                        metadata.error = Some(message.clone());
                        metadata.validation_passed = false;
                        state.per_task_errors.insert(capability, message);
                    }
                }
                None => {
                    if let Some(error) = &metadata.error {
                        state.per_task_errors.insert(capability, error.clone());
                    }
                }
            }

            state.evaluations.extend(report.evaluation);
            state.task_metadata.insert(capability, metadata);
        }
    }
}

/// Runs batches of capability tasks.
///
/// Cheap to clone; clones share the agent registry, the concurrency
/// permits, the judge, the observer and the monitor.
#[derive(Clone)]
pub struct BatchExecutor {
    registry: Arc<AgentRegistry>,
    permits: Arc<Semaphore>,
    task_timeout: Duration,
    judge: Option<Arc<dyn Judge>>,
    observer: Arc<dyn WorkflowObserver>,
    monitor: Arc<CapabilityMonitor>,
}

impl BatchExecutor {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            permits: Arc::new(Semaphore::new(16)),
            task_timeout: Duration::from_secs(120),
            judge: None,
            observer: Arc::new(NoopObserver),
            monitor: Arc::new(CapabilityMonitor::new()),
        }
    }

    pub fn with_timeout(mut self, task_timeout: Duration) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    /// Share `permits` with other executors to cap tasks process-wide.
    pub fn with_permits(mut self, permits: Arc<Semaphore>) -> Self {
        self.permits = permits;
        self
    }

    pub fn with_max_concurrent(self, max_concurrent_tasks: usize) -> Self {
        self.with_permits(Arc::new(Semaphore::new(max_concurrent_tasks.max(1))))
    }

    pub fn with_judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn WorkflowObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<CapabilityMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn monitor(&self) -> &Arc<CapabilityMonitor> {
        &self.monitor
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Run the batch at `state.batch_cursor`, merge its results and
    /// advance the cursor by one.
    pub async fn run_batch(&self, state: &mut WorkflowState) -> ContentLensResult<()> {
        let batch = state
            .current_batch()
            .map(<[Capability]>::to_vec)
            .ok_or_else(|| {
                ContentLensError::Orchestrator(format!(
                    "no batch at cursor {} (batches: {})",
                    state.batch_cursor,
                    state.batches.len()
                ))
            })?;

        let outcome = self.execute(&batch, state).await;
        let failed = outcome.failed();
        outcome.merge_into(state);
        state.advance_cursor();

        info!(
            cursor = state.batch_cursor,
            tasks = batch.len(),
            failed = failed.len(),
            "Batch merged"
        );
        Ok(())
    }

    /// Run every task of `batch` against snapshots of `state`.
    ///
    /// A singleton batch runs inline. Larger batches spawn one task per
    /// capability and join them all; each is bounded by its own timeout.
    pub async fn execute(&self, batch: &[Capability], state: &WorkflowState) -> BatchOutcome {
        let inputs: Vec<TaskInput> = batch
            .iter()
            .map(|c| TaskInput::from_state(*c, state))
            .collect();

        info!(batch = ?batch, "Executing batch");

        if inputs.len() <= 1 {
            let mut reports = Vec::with_capacity(inputs.len());
            for input in inputs {
                let capability = input.capability;
                let report = match AssertUnwindSafe(self.run_task(input)).catch_unwind().await {
                    Ok(report) => report,
                    Err(_) => {
                        warn!(capability = %capability, "Task panicked");
                        TaskReport::aborted(capability, "task panicked")
                    }
                };
                reports.push(report);
            }
            return BatchOutcome { reports };
        }

        let (capabilities, handles): (Vec<_>, Vec<_>) = inputs
            .into_iter()
            .map(|input| {
                let executor = self.clone();
                let capability = input.capability;
                (
                    capability,
                    tokio::spawn(async move { executor.run_task(input).await }),
                )
            })
            .unzip();

        let reports = join_all(handles)
            .await
            .into_iter()
            .zip(capabilities)
            .map(|(joined, capability)| match joined {
                Ok(report) => report,
                Err(e) => {
                    warn!(capability = %capability, error = %e, "Task join failed");
                    TaskReport::aborted(capability, &e.to_string())
                }
            })
            .collect();

        BatchOutcome { reports }
    }

    async fn run_task(&self, input: TaskInput) -> TaskReport {
        let capability = input.capability;
        let trace_id = input.trace_id.clone().unwrap_or_default();
        let started_at = Utc::now();
        let agent_id = format!("{capability}_{}", started_at.timestamp_millis());
        let start = Instant::now();

        let (output, status, error) = match self.invoke(&input).await {
            Ok(output) => (Some(output), TaskStatus::Completed, None),
            Err(e) => {
                let status = match e {
                    ContentLensError::Timeout(_) => TaskStatus::TimedOut,
                    _ => TaskStatus::Failed,
                };
                let message = e.task_message();
                warn!(capability = %capability, error = %message, "Task failed");
                (None, status, Some(message))
            }
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let validation_passed = output
            .as_ref()
            .is_some_and(|o| validate_output(capability, o));

        let evaluation = match (&output, &self.judge) {
            (Some(output), Some(judge)) => {
                let text = output.as_text();
                let evaluate = judge.evaluate(capability.output_key(), &input.content, &text);
                match tokio::time::timeout(self.task_timeout, evaluate).await {
                    Ok(evaluation) => Some(evaluation),
                    Err(_) => {
                        warn!(
                            capability = %capability,
                            timeout = %format_duration(self.task_timeout),
                            "Judge timed out, skipping evaluation"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        self.monitor.record(capability, status, duration_ms).await;
        self.observer.emit(TraceEvent::TaskFinished {
            trace_id: trace_id.clone(),
            capability,
            status,
            duration_ms,
            error: error.clone(),
            output: output.as_ref().map(CapabilityOutput::as_text),
        });
        if let Some(evaluation) = &evaluation {
            self.observer.emit(TraceEvent::Evaluated {
                trace_id,
                evaluation: evaluation.clone(),
            });
        }

        TaskReport {
            capability,
            output,
            metadata: TaskMetadata {
                agent_id,
                status,
                started_at,
                duration_ms,
                error,
                validation_passed,
            },
            evaluation,
        }
    }

    /// Look up the agent, wait for a permit, then run it under the timeout.
    async fn invoke(&self, input: &TaskInput) -> ContentLensResult<CapabilityOutput> {
        let capability = input.capability;
        let agent = self.registry.get(capability).ok_or_else(|| {
            ContentLensError::Orchestrator(format!("no agent registered for '{capability}'"))
        })?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ContentLensError::Orchestrator("task permits closed".to_string()))?;

        info!(capability = %capability, "Running task");
        let run = AssertUnwindSafe(agent.run(input)).catch_unwind();
        match tokio::time::timeout(self.task_timeout, run).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ContentLensError::Agent(format!(
                "{capability} agent panicked"
            ))),
            Err(_) => Err(ContentLensError::Timeout(format!(
                "execution timed out after {}",
                format_duration(self.task_timeout)
            ))),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() > 0 && duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
