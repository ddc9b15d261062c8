use crate::llm::LlmClient;
use async_trait::async_trait;
use contentlens_core::{ContentLensError, ContentLensResult, Refiner};
use tracing::info;

const SYSTEM_PROMPT: &str = "You are a Prompt Refinement AI. Rewrite the user's request so it is \
specific, actionable and aligned with the extracted document information. Keep the original \
intent. Answer with the refined request only.";

/// LLM-backed rewrite of the user request before routing.
pub struct LlmRefiner {
    client: LlmClient,
}

impl LlmRefiner {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Refiner for LlmRefiner {
    async fn refine(
        &self,
        extraction: &serde_json::Value,
        user_request: &str,
    ) -> ContentLensResult<String> {
        info!(model = %self.client.model_id(), "Refiner starting");

        let prompt = format!(
            "EXTRACTED INFORMATION:\n{extraction}\n\nORIGINAL USER REQUEST:\n{user_request}\n\nREFINED REQUEST:"
        );
        let refined = self.client.complete(Some(SYSTEM_PROMPT), &prompt).await?;
        let refined = refined.trim();

        if refined.is_empty() {
            return Err(ContentLensError::Agent(
                "refiner returned an empty request".to_string(),
            ));
        }
        Ok(refined.to_string())
    }
}
