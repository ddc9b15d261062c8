use crate::llm::LlmClient;
use async_trait::async_trait;
use contentlens_core::{ContentLensResult, IntentClassifier};
use tracing::info;

const SYSTEM_PROMPT: &str = "You are an Intent Classifier for a Media AI system. Read the user \
request and decide which agents must handle it, in the order they should run.

OPTIONS:
- summarize: the user wants a shorter version, a summary or a TL;DR.
- translate: the user mentions Arabic or another language.
- analyze: the user wants a deep dive, strategic audit or risk assessment.
- recommend: the user wants suggestions or next steps.
- ideate: the user wants campaign ideas or headlines.
- copywrite: the user wants email, landing page or CTA copy.
- compliance: the user asks about compliance, GDPR, privacy or opt-out.

Return only a comma-separated list of option names.";

/// LLM-backed routing decision.
pub struct LlmIntentClassifier {
    client: LlmClient,
}

impl LlmIntentClassifier {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, user_request: &str) -> ContentLensResult<String> {
        info!(model = %self.client.model_id(), "Classifying intent");
        let prompt = format!("USER REQUEST: {user_request}\n\nDECISION:");
        let decision = self.client.complete(Some(SYSTEM_PROMPT), &prompt).await?;
        Ok(decision.to_lowercase())
    }
}
