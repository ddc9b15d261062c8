//! Task routing: free-text request to an ordered list of capabilities.

use contentlens_core::{Capability, IntentClassifier};
use regex::Regex;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

#[allow(clippy::expect_used)]
fn keyword_regex(alternatives: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).expect("hardcoded regex pattern is valid")
}

static TRANSLATE: LazyLock<Regex> =
    LazyLock::new(|| keyword_regex(r"translat\w*|arabic|french|spanish|german|language"));
static ANALYZE: LazyLock<Regex> = LazyLock::new(|| {
    keyword_regex(r"analy\w*|audit\w*|review\w*|assess\w*|risks?|deep dive|evaluat\w*|report")
});
static SUMMARIZE: LazyLock<Regex> = LazyLock::new(|| {
    keyword_regex(r"summar\w*|tl;?dr|overview|recap|full report|short version")
});
static RECOMMEND: LazyLock<Regex> = LazyLock::new(|| {
    keyword_regex(r"recommend\w*|suggest\w*|advice|advise|next steps?|improve\w*|full report")
});
static IDEATE: LazyLock<Regex> = LazyLock::new(|| {
    keyword_regex(
        r"campaigns?|ideas?|ideation|ideate|headlines?|brainstorm\w*|concepts?|taglines?|slogans?",
    )
});
static COPYWRITE: LazyLock<Regex> =
    LazyLock::new(|| keyword_regex(r"e-?mails?|copy\w*|landing( page)?s?|cta|call to action"));
static COMPLIANCE: LazyLock<Regex> =
    LazyLock::new(|| keyword_regex(r"complian\w*|gdpr|privacy|opt-?out|consent|legal"));

/// Decides which capabilities a request needs.
///
/// The classifier is consulted first; an error or an answer with no
/// recognized capability falls back to [`keyword_fallback`]. Never fails.
#[derive(Clone, Default)]
pub struct TaskRouter {
    classifier: Option<Arc<dyn IntentClassifier>>,
}

impl TaskRouter {
    pub fn new(classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// A router that only uses keyword matching.
    pub fn keyword_only() -> Self {
        Self { classifier: None }
    }

    /// Ordered, deduplicated, non-empty list of capabilities for `user_request`.
    pub async fn decide(&self, user_request: &str) -> Vec<Capability> {
        if let Some(classifier) = &self.classifier {
            match classifier.classify(user_request).await {
                Ok(raw) => {
                    let decision = sanitize_decision(&raw);
                    if !decision.is_empty() {
                        info!(?decision, "Router decision");
                        return decision;
                    }
                    warn!(raw = %raw, "Router decision inconclusive, using keyword fallback");
                }
                Err(e) => {
                    warn!(error = %e, "Router classifier failed, using keyword fallback");
                }
            }
        }

        let decision = keyword_fallback(user_request);
        info!(?decision, "Router fallback decision");
        decision
    }
}

/// Map a classifier answer onto known capabilities.
///
/// Unknown tokens and repeats are dropped; first-mention order is kept.
pub fn sanitize_decision(raw: &str) -> Vec<Capability> {
    let mut decision = Vec::new();
    for token in raw.split(|c: char| !c.is_ascii_alphanumeric()) {
        if let Ok(capability) = Capability::from_str(token) {
            if !decision.contains(&capability) {
                decision.push(capability);
            }
        }
    }
    decision
}

/// Deterministic keyword routing. Defaults to `[analyze]`.
pub fn keyword_fallback(user_request: &str) -> Vec<Capability> {
    let mut tasks = Vec::new();

    if TRANSLATE.is_match(user_request) {
        tasks.push(Capability::Translate);
    }
    if ANALYZE.is_match(user_request) {
        tasks.push(Capability::Analyze);
    }
    if SUMMARIZE.is_match(user_request) {
        tasks.insert(0, Capability::Summarize);
    }
    if RECOMMEND.is_match(user_request) {
        tasks.push(Capability::Recommend);
    }
    if IDEATE.is_match(user_request) {
        tasks.push(Capability::Ideate);
    }
    if COPYWRITE.is_match(user_request) {
        tasks.push(Capability::Copywrite);
    }
    if COMPLIANCE.is_match(user_request) {
        tasks.push(Capability::Compliance);
    }

    if tasks.is_empty() {
        tasks.push(Capability::Analyze);
    }
    tasks
}
