//! Narrow interfaces through which the orchestrator reaches its agents.
//!
//! Every agent is a black box to the orchestrator: LLM-backed
//! implementations live in `contentlens-agent`, the rule-based compliance
//! checker in `contentlens-compliance`, and tests use in-memory fakes.

use crate::capability::{Capability, CapabilityOutput, TaskInput};
use crate::state::Evaluation;
use crate::ContentLensResult;
use async_trait::async_trait;

/// Wraps one named capability.
#[async_trait]
pub trait CapabilityAgent: Send + Sync {
    /// The capability this agent implements.
    fn capability(&self) -> Capability;

    /// Produce the capability's output from a read-only snapshot.
    async fn run(&self, input: &TaskInput) -> ContentLensResult<CapabilityOutput>;
}

/// First-stage parser that turns raw brief text into a structured record.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, raw_text: &str) -> ContentLensResult<serde_json::Value>;
}

/// Optional pre-routing stage that rewrites the user request.
#[async_trait]
pub trait Refiner: Send + Sync {
    async fn refine(
        &self,
        extraction: &serde_json::Value,
        user_request: &str,
    ) -> ContentLensResult<String>;
}

/// Primary routing decision: returns a comma-like list of capability names.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, user_request: &str) -> ContentLensResult<String>;
}

/// Quality judge. Infallible: implementations turn their own failures into
/// a low-score evaluation.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn evaluate(&self, agent_type: &str, input_context: &str, output: &str) -> Evaluation;
}
