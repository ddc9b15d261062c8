//! Core types and error definitions for ContentLens.
//!
//! This crate provides the types shared by every ContentLens crate: the
//! per-request [`WorkflowState`], the closed set of [`Capability`] kinds,
//! the inputs and outputs exchanged with capability agents, and the narrow
//! traits (ports) through which the orchestrator reaches LLM-backed agents.
//!
//! # Main types
//!
//! - [`ContentLensError`]: Unified error enum for all ContentLens subsystems.
//! - [`ContentLensResult`]: Convenience alias for `Result<T, ContentLensError>`.
//! - [`Capability`]: One named transformation (summarize, translate, ...).
//! - [`WorkflowState`]: The mutable record threaded through one workflow run.
//! - [`TaskInput`]: Read-only snapshot handed to a single capability task.
//! - [`CapabilityOutput`]: Typed result produced by a capability task.
//! - [`ComplianceReport`]: Structured output of the compliance capability.

/// Agent-facing traits consumed by the orchestrator.
pub mod agent;
/// Capability kinds and their task inputs/outputs.
pub mod capability;
/// Compliance report types.
pub mod compliance;
/// Workflow state, evaluations and per-task metadata.
pub mod state;

pub use agent::{CapabilityAgent, Extractor, IntentClassifier, Judge, Refiner};
pub use capability::{Capability, CapabilityOutput, TaskInput};
pub use compliance::{ComplianceIssue, ComplianceReport, ComplianceStatus, IssueSeverity};
pub use state::{Evaluation, TaskMetadata, TaskStatus, WorkflowState};

// --- Error types ---

/// Top-level error type for ContentLens.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentLensError {
    /// An error raised by an agent while producing its output.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An error from an outbound HTTP request (LLM API, tracing backend).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A document could not be ingested (unsupported type, oversize, unreadable).
    #[error("File processing error: {0}")]
    Ingest(String),

    /// The mandatory extraction stage failed or produced nothing usable.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// An error from the workflow orchestrator itself.
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    /// An error from the tracing backend.
    #[error("Tracing error: {0}")]
    Tracing(String),

    /// A bounded operation did not finish in time.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContentLensError {
    /// Short, stable name of the error kind, used when formatting per-task errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentLensError::Agent(_) => "AgentError",
            ContentLensError::Http(_) => "HttpError",
            ContentLensError::Config(_) => "ConfigError",
            ContentLensError::Ingest(_) => "FileProcessingError",
            ContentLensError::Extraction(_) => "ExtractionError",
            ContentLensError::Orchestrator(_) => "OrchestratorError",
            ContentLensError::Tracing(_) => "TracingError",
            ContentLensError::Timeout(_) => "TimeoutError",
            ContentLensError::Json(_) => "JsonError",
            ContentLensError::Io(_) => "IoError",
        }
    }

    /// Formats the error as `"<Kind>: <message>"` without the display prefix.
    pub fn task_message(&self) -> String {
        let detail = match self {
            ContentLensError::Agent(m)
            | ContentLensError::Http(m)
            | ContentLensError::Config(m)
            | ContentLensError::Ingest(m)
            | ContentLensError::Extraction(m)
            | ContentLensError::Orchestrator(m)
            | ContentLensError::Tracing(m)
            | ContentLensError::Timeout(m) => m.clone(),
            ContentLensError::Json(e) => e.to_string(),
            ContentLensError::Io(e) => e.to_string(),
        };
        format!("{}: {}", self.kind(), detail)
    }
}

/// A convenience `Result` alias using [`ContentLensError`].
pub type ContentLensResult<T> = Result<T, ContentLensError>;
