//! Deterministic compliance checking of marketing content.
//!
//! No LLM is involved, so the compliance capability behaves identically in
//! tests, CI and production.
//!
//! # Main types
//!
//! - [`ComplianceRules`]: Keyword lists per severity.
//! - [`ComplianceChecker`]: Scans text and builds a [`ComplianceReport`].
//! - [`ComplianceAgent`]: The compliance capability agent.

use async_trait::async_trait;
use contentlens_core::{
    Capability, CapabilityAgent, CapabilityOutput, ComplianceIssue, ComplianceReport,
    ContentLensResult, IssueSeverity, TaskInput,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Keyword lists per severity. Matching is case-insensitive substring search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRules {
    #[serde(default = "default_block")]
    pub block: Vec<String>,
    #[serde(default = "default_privacy")]
    pub privacy: Vec<String>,
    #[serde(default = "default_review")]
    pub review: Vec<String>,
}

fn to_owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

fn default_block() -> Vec<String> {
    to_owned(&["spam", "sell personal", "sell data", "harvest", "cookie stuffing"])
}

fn default_privacy() -> Vec<String> {
    to_owned(&[
        "personal data",
        "ssn",
        "social security",
        "credit card",
        "dob",
        "date of birth",
    ])
}

fn default_review() -> Vec<String> {
    to_owned(&["guarantee", "risk-free", "no risk", "best ever", "unlimited"])
}

impl Default for ComplianceRules {
    fn default() -> Self {
        Self {
            block: default_block(),
            privacy: default_privacy(),
            review: default_review(),
        }
    }
}

/// Scans content against [`ComplianceRules`].
#[derive(Debug, Clone, Default)]
pub struct ComplianceChecker {
    rules: ComplianceRules,
}

impl ComplianceChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ComplianceRules) -> Self {
        Self { rules }
    }

    /// Check `content` and report every matched keyword.
    pub fn check(&self, content: &str) -> ComplianceReport {
        let lower = content.to_lowercase();
        let mut issues = Vec::new();

        let groups = [
            (IssueSeverity::Block, &self.rules.block),
            (IssueSeverity::Privacy, &self.rules.privacy),
            (IssueSeverity::Review, &self.rules.review),
        ];

        for (severity, keywords) in groups {
            for keyword in keywords {
                if lower.contains(&keyword.to_lowercase()) {
                    issues.push(ComplianceIssue {
                        severity,
                        matched: keyword.clone(),
                        description: describe(severity, keyword),
                    });
                }
            }
        }

        ComplianceReport::from_issues(issues)
    }
}

fn describe(severity: IssueSeverity, keyword: &str) -> String {
    match severity {
        IssueSeverity::Block => format!("Prohibited practice: contains '{keyword}'"),
        IssueSeverity::Privacy => format!("Handles sensitive personal data: contains '{keyword}'"),
        IssueSeverity::Review => format!("Unsubstantiated marketing claim: contains '{keyword}'"),
    }
}

/// The compliance capability.
#[derive(Debug, Clone, Default)]
pub struct ComplianceAgent {
    checker: ComplianceChecker,
}

impl ComplianceAgent {
    pub fn new(checker: ComplianceChecker) -> Self {
        Self { checker }
    }
}

#[async_trait]
impl CapabilityAgent for ComplianceAgent {
    fn capability(&self) -> Capability {
        Capability::Compliance
    }

    async fn run(&self, input: &TaskInput) -> ContentLensResult<CapabilityOutput> {
        info!(chars = input.content.len(), "Compliance checking content");
        let report = self.checker.check(&input.content);
        info!(
            status = ?report.status,
            issues = report.issue_count,
            risk_score = report.risk_score,
            "Compliance check complete"
        );
        Ok(CapabilityOutput::Compliance(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentlens_core::ComplianceStatus;

    #[test]
    fn test_clean_copy_is_ok() {
        let report = ComplianceChecker::new().check("Discover our new spring collection today.");
        assert_eq!(report.status, ComplianceStatus::Ok);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_selling_personal_data_blocks() {
        let report = ComplianceChecker::new().check("We will sell personal data to partners.");
        assert_eq!(report.status, ComplianceStatus::Block);
        assert!(report
            .issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Block));
        // "personal data" also matches the privacy list
        assert!(report
            .issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Privacy));
        assert_eq!(report.issue_count, report.issues.len());
    }

    #[test]
    fn test_marketing_claims_need_review() {
        let report = ComplianceChecker::new().check("Results GUARANTEED, completely risk-free!");
        assert_eq!(report.status, ComplianceStatus::Review);
        assert_eq!(report.risk_score, 4);
    }

    #[test]
    fn test_custom_rules() {
        let rules = ComplianceRules {
            block: vec!["lottery".to_string()],
            privacy: vec![],
            review: vec![],
        };
        let report = ComplianceChecker::with_rules(rules).check("Win the lottery");
        assert_eq!(report.status, ComplianceStatus::Block);
        assert_eq!(report.issues[0].matched, "lottery");
    }

    #[test]
    fn test_partial_rules_keep_defaults() {
        let rules: ComplianceRules = toml::from_str(r#"review = ["miracle"]"#).unwrap();
        assert_eq!(rules.review, vec!["miracle"]);
        assert_eq!(rules.block, ComplianceRules::default().block);

        let report = ComplianceChecker::with_rules(rules).check("A miracle cream, guaranteed");
        assert_eq!(report.status, ComplianceStatus::Review);
        assert_eq!(report.issue_count, 1);
    }

    #[tokio::test]
    async fn test_agent_returns_structured_report() {
        let agent = ComplianceAgent::default();
        let input = TaskInput {
            capability: Capability::Compliance,
            content: "Sign up and we sell personal data".to_string(),
            user_request: "check compliance".to_string(),
            source_lang: "en".to_string(),
            trace_id: None,
        };
        match agent.run(&input).await.unwrap() {
            CapabilityOutput::Compliance(report) => {
                assert_eq!(report.status, ComplianceStatus::Block);
            }
            other => panic!("expected compliance report, got {other:?}"),
        }
    }
}
