//! Workflow orchestration for ContentLens.
//!
//! Decides which capabilities a request needs, groups them into batches
//! that may run concurrently, executes each batch with per-task failure
//! isolation and merges the results into the [`WorkflowState`].
//!
//! # Main types
//!
//! - [`Workflow`]: The coordinator state machine, built with [`WorkflowBuilder`].
//! - [`TaskRouter`]: Classifier-first routing with a deterministic keyword fallback.
//! - [`plan`]: Pure batch planner.
//! - [`BatchExecutor`]: Runs one batch under a global concurrency cap and per-task timeout.
//! - [`AgentRegistry`]: Dispatch table from [`Capability`] to agent.
//! - [`WorkflowObserver`]: Observability port fed with [`TraceEvent`]s.
//! - [`CapabilityMonitor`]: Process-wide per-capability counters.
//!
//! [`WorkflowState`]: contentlens_core::WorkflowState
//! [`Capability`]: contentlens_core::Capability

/// `[workflow]` configuration.
pub mod config;
/// Workflow coordinator.
pub mod coordinator;
/// Batch executor.
pub mod executor;
/// Per-capability metrics.
pub mod monitor;
/// Observability port.
pub mod observer;
/// Batch planner.
pub mod planner;
/// Capability dispatch table.
pub mod registry;
/// Task router.
pub mod router;
/// Output format checks.
pub mod validation;

pub use config::WorkflowConfig;
pub use coordinator::{Workflow, WorkflowBuilder, WorkflowFailure, WorkflowOptions};
pub use executor::{BatchExecutor, BatchOutcome, TaskReport};
pub use monitor::{CapabilityMetrics, CapabilityMonitor};
pub use observer::{
    FanoutObserver, LogObserver, NoopObserver, TraceEvent, WorkflowObserver, WorkflowPhase,
};
pub use planner::plan;
pub use registry::AgentRegistry;
pub use router::{keyword_fallback, sanitize_decision, TaskRouter};
pub use validation::{validate_extraction, validate_output};
