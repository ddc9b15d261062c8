use serde::{Deserialize, Serialize};

/// Overall verdict of a compliance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Ok,
    Review,
    Block,
}

/// Severity of a single compliance issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Block,
    Privacy,
    Review,
}

impl IssueSeverity {
    /// Contribution of one issue of this severity to the risk score.
    pub fn weight(&self) -> u32 {
        match self {
            IssueSeverity::Block => 10,
            IssueSeverity::Privacy => 5,
            IssueSeverity::Review => 2,
        }
    }
}

/// A single matched rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub severity: IssueSeverity,
    /// The keyword that matched.
    #[serde(rename = "match")]
    pub matched: String,
    pub description: String,
}

/// Structured output of the compliance capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub status: ComplianceStatus,
    pub issues: Vec<ComplianceIssue>,
    pub issue_count: usize,
    pub risk_score: u32,
}

impl ComplianceReport {
    /// Build a report, deriving status, count and risk score from the issues.
    pub fn from_issues(issues: Vec<ComplianceIssue>) -> Self {
        let status = if issues.iter().any(|i| i.severity == IssueSeverity::Block) {
            ComplianceStatus::Block
        } else if issues.is_empty() {
            ComplianceStatus::Ok
        } else {
            ComplianceStatus::Review
        };
        let risk_score = issues.iter().map(|i| i.severity.weight()).sum();

        Self {
            status,
            issue_count: issues.len(),
            issues,
            risk_score,
        }
    }

    /// Report for content with no findings.
    pub fn clean() -> Self {
        Self::from_issues(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: IssueSeverity, matched: &str) -> ComplianceIssue {
        ComplianceIssue {
            severity,
            matched: matched.to_string(),
            description: format!("contains '{matched}'"),
        }
    }

    #[test]
    fn test_clean_report_is_ok() {
        let report = ComplianceReport::clean();
        assert_eq!(report.status, ComplianceStatus::Ok);
        assert_eq!(report.issue_count, 0);
        assert_eq!(report.risk_score, 0);
    }

    #[test]
    fn test_block_dominates_review() {
        let report = ComplianceReport::from_issues(vec![
            issue(IssueSeverity::Review, "guarantee"),
            issue(IssueSeverity::Block, "spam"),
        ]);
        assert_eq!(report.status, ComplianceStatus::Block);
        assert_eq!(report.issue_count, 2);
        assert_eq!(report.risk_score, 12);
    }

    #[test]
    fn test_privacy_only_is_review() {
        let report = ComplianceReport::from_issues(vec![issue(IssueSeverity::Privacy, "ssn")]);
        assert_eq!(report.status, ComplianceStatus::Review);
    }

    #[test]
    fn test_issue_serializes_match_field() {
        let json = serde_json::to_value(issue(IssueSeverity::Block, "spam")).unwrap();
        assert_eq!(json["match"], "spam");
        assert_eq!(json["severity"], "block");
    }
}
