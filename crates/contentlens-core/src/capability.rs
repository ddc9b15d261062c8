use crate::compliance::ComplianceReport;
use crate::state::WorkflowState;
use crate::ContentLensError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One named LLM-backed (or rule-based) transformation of a brief.
///
/// The set is closed: routing rejects anything else, so the executor never
/// sees an unknown name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Executive summary of the brief.
    Summarize,
    /// Translation of the brief (Arabic by default).
    Translate,
    /// Strategic analysis: gaps, risks, recommendations.
    Analyze,
    /// Actionable recommendations and next steps.
    Recommend,
    /// Campaign ideas and headlines.
    Ideate,
    /// Marketing copy variants (email, landing page, CTA).
    Copywrite,
    /// Compliance check of the produced content.
    Compliance,
}

impl Capability {
    /// Every capability, in canonical order.
    pub const ALL: [Capability; 7] = [
        Capability::Summarize,
        Capability::Translate,
        Capability::Analyze,
        Capability::Recommend,
        Capability::Ideate,
        Capability::Copywrite,
        Capability::Compliance,
    ];

    /// The routing name (`"summarize"`, `"translate"`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Summarize => "summarize",
            Capability::Translate => "translate",
            Capability::Analyze => "analyze",
            Capability::Recommend => "recommend",
            Capability::Ideate => "ideate",
            Capability::Copywrite => "copywrite",
            Capability::Compliance => "compliance",
        }
    }

    /// Name of the [`WorkflowState`] field this capability owns.
    pub fn output_key(&self) -> &'static str {
        match self {
            Capability::Summarize => "summary",
            Capability::Translate => "translation",
            Capability::Analyze => "analysis",
            Capability::Recommend => "recommendation",
            Capability::Ideate => "ideation",
            Capability::Copywrite => "copy",
            Capability::Compliance => "compliance",
        }
    }

    /// Whether this capability only reads the extraction/raw text and may
    /// share a batch with other readers.
    ///
    /// Translation rewrites the primary text and compliance inspects content
    /// produced by others, so both must sit behind a batch boundary.
    pub fn is_parallel_safe(&self) -> bool {
        !matches!(self, Capability::Translate | Capability::Compliance)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = ContentLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Capability::ALL
            .into_iter()
            .find(|c| c.name() == needle)
            .ok_or_else(|| ContentLensError::Orchestrator(format!("unknown capability: {s}")))
    }
}

/// The typed result of one capability task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityOutput {
    /// Free-form text produced by an LLM-backed capability.
    Text(String),
    /// Structured compliance report.
    Compliance(ComplianceReport),
}

impl CapabilityOutput {
    /// Text view of the output, used for judging and logging.
    pub fn as_text(&self) -> String {
        match self {
            CapabilityOutput::Text(text) => text.clone(),
            CapabilityOutput::Compliance(report) => {
                serde_json::to_string(report).unwrap_or_else(|_| format!("{report:?}"))
            }
        }
    }
}

/// Read-only snapshot of the state fields one capability task needs.
///
/// Built before any task in a batch starts, so sibling tasks never observe
/// each other's writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    pub capability: Capability,
    /// The text the capability works on.
    pub content: String,
    pub user_request: String,
    pub source_lang: String,
    pub trace_id: Option<String>,
}

impl TaskInput {
    /// Snapshot the fields `capability` reads from `state`.
    pub fn from_state(capability: Capability, state: &WorkflowState) -> Self {
        let content = match capability {
            Capability::Translate => state
                .summary
                .clone()
                .unwrap_or_else(|| state.raw_text.clone()),
            Capability::Compliance => state
                .copy
                .clone()
                .or_else(|| state.summary.clone())
                .or_else(|| state.translation.clone())
                .unwrap_or_else(|| state.brief_content()),
            _ => state.brief_content(),
        };

        Self {
            capability,
            content,
            user_request: state.user_request.clone(),
            source_lang: state.source_lang.clone(),
            trace_id: state.trace_id.clone(),
        }
    }
}
