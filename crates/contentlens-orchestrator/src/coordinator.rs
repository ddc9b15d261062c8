//! The workflow state machine:
//! `Init → Extracted → Routed → BatchRunning(cursor) → Done | Failed`.

use crate::config::WorkflowConfig;
use crate::executor::BatchExecutor;
use crate::monitor::CapabilityMonitor;
use crate::observer::{NoopObserver, TraceEvent, WorkflowObserver, WorkflowPhase};
use crate::planner::plan;
use crate::registry::AgentRegistry;
use crate::router::TaskRouter;
use chrono::Utc;
use contentlens_core::{
    ContentLensError, ContentLensResult, Extractor, IntentClassifier, Judge, Refiner,
    WorkflowState,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Stop after extraction.
    pub extract_only: bool,
}

/// A run that could not produce a valid state.
///
/// Serializes as `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{error}")]
pub struct WorkflowFailure {
    pub error: String,
    #[serde(skip)]
    pub trace_id: String,
}

/// Sequences extraction, optional refinement, routing and batch execution.
///
/// Built once and shared by every request; the concurrency permits inside
/// its executor are therefore process-wide.
pub struct Workflow {
    extractor: Arc<dyn Extractor>,
    refiner: Option<Arc<dyn Refiner>>,
    judge: Option<Arc<dyn Judge>>,
    router: TaskRouter,
    executor: BatchExecutor,
    observer: Arc<dyn WorkflowObserver>,
}

impl Workflow {
    pub fn builder(extractor: Arc<dyn Extractor>, registry: Arc<AgentRegistry>) -> WorkflowBuilder {
        WorkflowBuilder {
            extractor,
            registry,
            classifier: None,
            refiner: None,
            judge: None,
            observer: Arc::new(NoopObserver),
            monitor: Arc::new(CapabilityMonitor::new()),
            config: WorkflowConfig::default(),
            permits: None,
        }
    }

    pub fn monitor(&self) -> &Arc<CapabilityMonitor> {
        self.executor.monitor()
    }

    /// Drive `state` to `Done`.
    ///
    /// Task failures are recorded in the returned state. Only a failure
    /// outside task boundaries (extraction, executor) yields
    /// [`WorkflowFailure`].
    pub async fn run(
        &self,
        mut state: WorkflowState,
        options: WorkflowOptions,
    ) -> Result<WorkflowState, WorkflowFailure> {
        let trace_id = state
            .trace_id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let start = Instant::now();

        info!(trace_id = %trace_id, request = %state.user_request, "Workflow started");
        self.observer.emit(TraceEvent::WorkflowStarted {
            trace_id: trace_id.clone(),
            user_request: state.user_request.clone(),
            source_lang: state.source_lang.clone(),
            timestamp: Utc::now(),
        });

        let result = self.drive(&mut state, options).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(
                    trace_id = %trace_id,
                    duration_ms,
                    outputs = ?state.populated_outputs(),
                    failed = state.per_task_errors.len(),
                    "Workflow complete"
                );
                self.observer.emit(TraceEvent::WorkflowFinished {
                    trace_id,
                    succeeded: true,
                    error: None,
                    duration_ms,
                });
                Ok(state)
            }
            Err(e) => {
                let message = e.to_string();
                error!(trace_id = %trace_id, error = %message, "Workflow failed");
                self.transition(&trace_id, WorkflowPhase::Failed);
                self.observer.emit(TraceEvent::WorkflowFinished {
                    trace_id: trace_id.clone(),
                    succeeded: false,
                    error: Some(message.clone()),
                    duration_ms,
                });
                Err(WorkflowFailure {
                    error: message,
                    trace_id,
                })
            }
        }
    }

    async fn drive(
        &self,
        state: &mut WorkflowState,
        options: WorkflowOptions,
    ) -> ContentLensResult<()> {
        let trace_id = state.trace_id.clone().unwrap_or_default();
        let mut phase = WorkflowPhase::Init;

        loop {
            phase = match phase {
                WorkflowPhase::Init => {
                    self.extract(state).await?;
                    WorkflowPhase::Extracted
                }
                WorkflowPhase::Extracted if options.extract_only => WorkflowPhase::Done,
                WorkflowPhase::Extracted => {
                    if !state.is_routed() {
                        self.refine(state).await;
                    }
                    self.route(state).await;
                    WorkflowPhase::Routed
                }
                WorkflowPhase::Routed | WorkflowPhase::BatchRunning(_) => {
                    if state.is_complete() {
                        WorkflowPhase::Done
                    } else {
                        let cursor = state.batch_cursor;
                        self.transition(&trace_id, WorkflowPhase::BatchRunning(cursor));
                        self.executor.run_batch(state).await?;
                        WorkflowPhase::BatchRunning(state.batch_cursor)
                    }
                }
                WorkflowPhase::Done | WorkflowPhase::Failed => return Ok(()),
            };

            if !matches!(phase, WorkflowPhase::BatchRunning(_)) {
                self.transition(&trace_id, phase);
            }
        }
    }

    fn transition(&self, trace_id: &str, phase: WorkflowPhase) {
        info!(trace_id = %trace_id, phase = %phase, "Workflow transition");
        self.observer.emit(TraceEvent::PhaseChanged {
            trace_id: trace_id.to_string(),
            phase,
        });
    }

    /// Run the extractor unless the state already carries an extraction.
    ///
    /// Extraction is mandatory: a failure or an empty record is an
    /// [`ContentLensError::Extraction`].
    pub async fn extract(&self, state: &mut WorkflowState) -> ContentLensResult<()> {
        if state.extraction.is_some() {
            return Ok(());
        }

        let start = Instant::now();
        let extraction = self
            .extractor
            .extract(&state.raw_text)
            .await
            .map_err(|e| match e {
                ContentLensError::Extraction(_) => e,
                other => ContentLensError::Extraction(other.task_message()),
            })?;

        let empty = match &extraction {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(ContentLensError::Extraction(
                "extractor returned an empty record".to_string(),
            ));
        }

        if !crate::validation::validate_extraction(&extraction) {
            warn!("Extraction has none of the expected brief fields");
            state
                .errors
                .push("Extraction has none of the expected brief fields".to_string());
        }

        self.emit_stage(state, "extraction", start, extraction.clone());
        if let Some(judge) = &self.judge {
            let evaluation = judge
                .evaluate("extraction", &state.raw_text, &extraction.to_string())
                .await;
            self.emit_evaluation(state, &evaluation);
            state.evaluations.push(evaluation);
        }

        state.extraction = Some(extraction);
        Ok(())
    }

    /// Rewrite the user request. Failures keep the original request.
    pub async fn refine(&self, state: &mut WorkflowState) {
        let (Some(refiner), Some(extraction)) = (&self.refiner, &state.extraction) else {
            return;
        };

        let start = Instant::now();
        let refined = refiner.refine(extraction, &state.user_request).await;
        match refined {
            Ok(refined) if !refined.trim().is_empty() => {
                info!(original = %state.user_request, refined = %refined, "Request refined");
                if let Some(judge) = &self.judge {
                    let evaluation = judge
                        .evaluate("refiner", &state.user_request, &refined)
                        .await;
                    self.emit_evaluation(state, &evaluation);
                    state.evaluations.push(evaluation);
                }
                state.user_request = refined;
                self.emit_stage(
                    state,
                    "refinement",
                    start,
                    serde_json::json!({ "user_request": state.user_request }),
                );
            }
            Ok(_) => {
                warn!("Refiner returned nothing, keeping original request");
                state
                    .errors
                    .push("Refinement returned nothing, kept original request".to_string());
            }
            Err(e) => {
                warn!(error = %e, "Refinement failed, keeping original request");
                state.errors.push(format!(
                    "Refinement failed, kept original request: {}",
                    e.task_message()
                ));
            }
        }
    }

    /// Compute the task plan and batches once. A no-op on a routed state.
    pub async fn route(&self, state: &mut WorkflowState) {
        if state.is_routed() {
            return;
        }

        let start = Instant::now();
        let task_plan = self.router.decide(&state.user_request).await;
        let batches = plan(&task_plan);
        info!(plan = ?task_plan, batches = ?batches, "Task plan ready");

        let registry = self.executor.registry();
        for capability in task_plan.iter().filter(|c| registry.get(**c).is_none()) {
            warn!(capability = %capability, "Planned capability has no registered agent");
            state
                .errors
                .push(format!("No agent registered for capability '{capability}'"));
        }

        state.task_plan = Some(task_plan);
        state.batches = batches;
        state.batch_cursor = 0;

        self.emit_stage(
            state,
            "routing",
            start,
            serde_json::json!({ "task_plan": state.task_plan, "batches": state.batches }),
        );
    }

    fn emit_stage(
        &self,
        state: &WorkflowState,
        stage: &str,
        start: Instant,
        output: serde_json::Value,
    ) {
        self.observer.emit(TraceEvent::StageCompleted {
            trace_id: state.trace_id.clone().unwrap_or_default(),
            stage: stage.to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            output,
        });
    }

    fn emit_evaluation(&self, state: &WorkflowState, evaluation: &contentlens_core::Evaluation) {
        self.observer.emit(TraceEvent::Evaluated {
            trace_id: state.trace_id.clone().unwrap_or_default(),
            evaluation: evaluation.clone(),
        });
    }
}

/// Builder for [`Workflow`].
pub struct WorkflowBuilder {
    extractor: Arc<dyn Extractor>,
    registry: Arc<AgentRegistry>,
    classifier: Option<Arc<dyn IntentClassifier>>,
    refiner: Option<Arc<dyn Refiner>>,
    judge: Option<Arc<dyn Judge>>,
    observer: Arc<dyn WorkflowObserver>,
    monitor: Arc<CapabilityMonitor>,
    config: WorkflowConfig,
    permits: Option<Arc<Semaphore>>,
}

impl WorkflowBuilder {
    pub fn classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn refiner(mut self, refiner: Arc<dyn Refiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn WorkflowObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn monitor(mut self, monitor: Arc<CapabilityMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Share concurrency permits with other workflows.
    pub fn permits(mut self, permits: Arc<Semaphore>) -> Self {
        self.permits = Some(permits);
        self
    }

    pub fn build(self) -> Workflow {
        let missing = self.registry.missing();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Capabilities without a registered agent");
        }

        let permits = self.permits.unwrap_or_else(|| {
            Arc::new(Semaphore::new(self.config.max_concurrent_tasks.max(1)))
        });
        let refiner = self.refiner.filter(|_| self.config.refine);
        let judge = self.judge.filter(|_| self.config.judge);

        let mut executor = BatchExecutor::new(self.registry)
            .with_timeout(self.config.task_timeout())
            .with_permits(permits)
            .with_observer(self.observer.clone())
            .with_monitor(self.monitor);
        if let Some(judge) = &judge {
            executor = executor.with_judge(judge.clone());
        }

        let router = match self.classifier {
            Some(classifier) => TaskRouter::new(classifier),
            None => TaskRouter::keyword_only(),
        };

        Workflow {
            extractor: self.extractor,
            refiner,
            judge,
            router,
            executor,
            observer: self.observer,
        }
    }
}
