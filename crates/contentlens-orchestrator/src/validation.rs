//! Format checks on capability outputs.
//!
//! A failed check is logged and recorded in the task metadata; it never
//! fails the task.

use contentlens_core::{Capability, CapabilityOutput, ComplianceReport};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

#[allow(clippy::expect_used)]
fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("hardcoded regex pattern is valid")
}

static NUMBERED: LazyLock<Regex> = LazyLock::new(|| pattern(r"\d+[.)]\s*"));
static BULLETED: LazyLock<Regex> = LazyLock::new(|| pattern(r"[-•*]\s+"));
static BOLD_TITLE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\*\*[^*\n]+\*\*"));
static ARABIC: LazyLock<Regex> = LazyLock::new(|| pattern(r"[\x{0600}-\x{06FF}]"));

const EXTRACTION_KEYS: [&str; 7] = [
    "CampaignName",
    "Brand",
    "TargetAudience",
    "CoreMessage",
    "ActionableDataPoints",
    "CallToAction",
    "AdvertiserContact",
];

const ANALYSIS_MARKERS: [&str; 10] = [
    "missing",
    "unclear",
    "recommendation",
    "risk",
    "opportunity",
    "strength",
    "weakness",
    "threat",
    "analysis",
    "insight",
];

/// Whether the extraction carries at least one expected brief field.
pub fn validate_extraction(extraction: &serde_json::Value) -> bool {
    match extraction {
        serde_json::Value::Object(map) => EXTRACTION_KEYS.iter().any(|k| map.contains_key(*k)),
        serde_json::Value::String(s) => s.trim().len() > 50,
        _ => false,
    }
}

/// Check the output of `capability` against its expected format.
pub fn validate_output(capability: Capability, output: &CapabilityOutput) -> bool {
    let valid = match (capability, output) {
        (Capability::Compliance, CapabilityOutput::Compliance(report)) => valid_report(report),
        (Capability::Compliance, CapabilityOutput::Text(_)) => false,
        (_, CapabilityOutput::Compliance(_)) => false,
        (_, CapabilityOutput::Text(text)) => valid_text(capability, text),
    };
    if !valid {
        warn!(
            capability = %capability,
            length = output.as_text().len(),
            "Output failed format validation"
        );
    }
    valid
}

fn valid_text(capability: Capability, text: &str) -> bool {
    let trimmed = text.trim();
    let lower = text.to_lowercase();
    match capability {
        Capability::Summarize => trimmed.len() >= 10 && text.len() < 1000,
        Capability::Translate => trimmed.len() >= 10 && ARABIC.is_match(text),
        Capability::Analyze => {
            trimmed.len() >= 50 && ANALYSIS_MARKERS.iter().any(|m| lower.contains(m))
        }
        Capability::Recommend => {
            trimmed.len() >= 20
                && (NUMBERED.is_match(text)
                    || BULLETED.is_match(text)
                    || lower.contains("recommendation"))
        }
        Capability::Ideate => {
            trimmed.len() >= 50
                && (NUMBERED.find_iter(text).count() >= 2
                    || BOLD_TITLE.find_iter(text).count() >= 2)
        }
        Capability::Copywrite => {
            let markers = [
                lower.contains("variant"),
                lower.contains("subject"),
                lower.contains("body"),
                lower.contains("cta") || lower.contains("call to action"),
            ];
            trimmed.len() >= 30 && markers.iter().filter(|m| **m).count() >= 2
        }
        Capability::Compliance => false,
    }
}

fn valid_report(report: &ComplianceReport) -> bool {
    report.issue_count == report.issues.len()
        && report
            .issues
            .iter()
            .all(|issue| !issue.matched.is_empty() && !issue.description.is_empty())
}
