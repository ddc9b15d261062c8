use crate::capability::{Capability, CapabilityOutput};
use crate::compliance::ComplianceReport;
use crate::{ContentLensError, ContentLensResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A quality judgment of one agent's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Which stage or capability was judged (`"extraction"`, `"analysis"`, ...).
    pub agent_type: String,
    /// Score in `1..=10`.
    pub score: u8,
    pub reasoning: String,
}

/// Terminal status of one capability task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Failed,
    TimedOut,
}

/// Execution record of one capability task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Unique id of this invocation (`"<capability>_<millis>"`).
    pub agent_id: String,
    pub status: TaskStatus,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: Option<String>,
    /// Whether the output passed its format check. `false` for failed tasks.
    pub validation_passed: bool,
}

/// The single mutable record threaded through one workflow run.
///
/// Created fresh per request, advanced by the coordinator, returned to the
/// caller once the last batch is merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub trace_id: Option<String>,
    /// Cleaned source text. Set once at start.
    pub raw_text: String,
    /// Free-form instruction. May be rewritten once by refinement.
    pub user_request: String,
    pub source_lang: String,
    pub extraction: Option<serde_json::Value>,

    pub summary: Option<String>,
    pub translation: Option<String>,
    pub analysis: Option<String>,
    pub recommendation: Option<String>,
    pub ideation: Option<String>,
    pub copy: Option<String>,
    pub compliance: Option<ComplianceReport>,

    /// Ordered capabilities chosen by the router. `None` until routed.
    pub task_plan: Option<Vec<Capability>>,
    pub batches: Vec<Vec<Capability>>,
    pub batch_cursor: usize,

    pub errors: Vec<String>,
    pub per_task_errors: BTreeMap<Capability, String>,
    pub evaluations: Vec<Evaluation>,
    pub task_metadata: BTreeMap<Capability, TaskMetadata>,
}

impl WorkflowState {
    pub fn new(
        raw_text: impl Into<String>,
        user_request: impl Into<String>,
        source_lang: impl Into<String>,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            user_request: user_request.into(),
            source_lang: source_lang.into(),
            ..Self::default()
        }
    }

    /// The text downstream readers work on: the extraction rendered as JSON
    /// when present, otherwise the raw text.
    pub fn brief_content(&self) -> String {
        match &self.extraction {
            Some(extraction) => serde_json::to_string_pretty(extraction)
                .unwrap_or_else(|_| extraction.to_string()),
            None => self.raw_text.clone(),
        }
    }

    /// Whether routing and planning already ran.
    pub fn is_routed(&self) -> bool {
        self.task_plan.is_some()
    }

    /// True once every planned batch has been executed.
    pub fn is_complete(&self) -> bool {
        self.is_routed() && self.batch_cursor >= self.batches.len()
    }

    /// The batch the cursor points at, if any remain.
    pub fn current_batch(&self) -> Option<&[Capability]> {
        self.batches.get(self.batch_cursor).map(Vec::as_slice)
    }

    /// Advance the cursor by exactly one, never past the end.
    pub fn advance_cursor(&mut self) {
        if self.batch_cursor < self.batches.len() {
            self.batch_cursor += 1;
        }
    }

    /// Whether the field owned by `capability` has been written.
    pub fn has_output(&self, capability: Capability) -> bool {
        match capability {
            Capability::Summarize => self.summary.is_some(),
            Capability::Translate => self.translation.is_some(),
            Capability::Analyze => self.analysis.is_some(),
            Capability::Recommend => self.recommendation.is_some(),
            Capability::Ideate => self.ideation.is_some(),
            Capability::Copywrite => self.copy.is_some(),
            Capability::Compliance => self.compliance.is_some(),
        }
    }

    /// Capabilities whose output field is populated, in canonical order.
    pub fn populated_outputs(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.has_output(*c))
            .collect()
    }

    /// Write the output of `capability` into the field it owns.
    ///
    /// Each field is written at most once per run; a second write or an
    /// output of the wrong shape is rejected and leaves the state untouched.
    pub fn set_output(
        &mut self,
        capability: Capability,
        output: CapabilityOutput,
    ) -> ContentLensResult<()> {
        if self.has_output(capability) {
            return Err(ContentLensError::Orchestrator(format!(
                "output '{}' already written",
                capability.output_key()
            )));
        }

        match (capability, output) {
            (Capability::Compliance, CapabilityOutput::Compliance(report)) => {
                self.compliance = Some(report);
            }
            (Capability::Compliance, CapabilityOutput::Text(_)) => {
                return Err(ContentLensError::Orchestrator(
                    "compliance must produce a structured report".to_string(),
                ));
            }
            (_, CapabilityOutput::Compliance(_)) => {
                return Err(ContentLensError::Orchestrator(format!(
                    "capability '{capability}' must produce text"
                )));
            }
            (Capability::Summarize, CapabilityOutput::Text(text)) => self.summary = Some(text),
            (Capability::Translate, CapabilityOutput::Text(text)) => {
                self.translation = Some(text);
            }
            (Capability::Analyze, CapabilityOutput::Text(text)) => self.analysis = Some(text),
            (Capability::Recommend, CapabilityOutput::Text(text)) => {
                self.recommendation = Some(text);
            }
            (Capability::Ideate, CapabilityOutput::Text(text)) => self.ideation = Some(text),
            (Capability::Copywrite, CapabilityOutput::Text(text)) => self.copy = Some(text),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_unrouted() {
        let state = WorkflowState::new("text", "analyze", "en");
        assert!(!state.is_routed());
        assert!(!state.is_complete());
        assert!(state.current_batch().is_none());
        assert!(state.populated_outputs().is_empty());
    }

    #[test]
    fn test_empty_plan_is_complete_immediately() {
        let mut state = WorkflowState::new("text", "", "en");
        state.task_plan = Some(Vec::new());
        assert!(state.is_complete());
    }

    #[test]
    fn test_cursor_never_passes_batch_count() {
        let mut state = WorkflowState::new("text", "", "en");
        state.task_plan = Some(vec![Capability::Analyze]);
        state.batches = vec![vec![Capability::Analyze]];
        state.advance_cursor();
        state.advance_cursor();
        assert_eq!(state.batch_cursor, 1);
        assert!(state.is_complete());
    }

    #[test]
    fn test_set_output_writes_owned_field_once() {
        let mut state = WorkflowState::new("text", "", "en");
        state
            .set_output(Capability::Analyze, CapabilityOutput::Text("deep".into()))
            .unwrap();
        assert_eq!(state.analysis.as_deref(), Some("deep"));

        let again = state.set_output(Capability::Analyze, CapabilityOutput::Text("x".into()));
        assert!(again.is_err());
        assert_eq!(state.analysis.as_deref(), Some("deep"));
        assert_eq!(state.populated_outputs(), vec![Capability::Analyze]);
    }

    #[test]
    fn test_set_output_rejects_wrong_shape() {
        let mut state = WorkflowState::new("text", "", "en");
        assert!(state
            .set_output(Capability::Compliance, CapabilityOutput::Text("ok".into()))
            .is_err());
        assert!(state
            .set_output(
                Capability::Summarize,
                CapabilityOutput::Compliance(ComplianceReport::clean())
            )
            .is_err());
        assert!(state.populated_outputs().is_empty());
    }

    #[test]
    fn test_state_serializes_null_outputs_and_named_error_keys() {
        let mut state = WorkflowState::new("text", "", "en");
        state
            .per_task_errors
            .insert(Capability::Ideate, "AgentError: boom".to_string());
        let json = serde_json::to_value(&state).unwrap();
        assert!(json["summary"].is_null());
        assert_eq!(json["per_task_errors"]["ideate"], "AgentError: boom");
    }
}
