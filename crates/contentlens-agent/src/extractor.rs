use crate::llm::LlmClient;
use async_trait::async_trait;
use contentlens_core::{ContentLensError, ContentLensResult, Extractor};
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are a specialized Media Analysis AI. You extract structured \
information from raw text briefs provided by advertising agencies. Output MUST be strictly \
valid JSON with no conversational filler. If a field is missing in the text, set it to null. \
Use the language found in the text.";

const FIELDS: &str = "\
- CampaignName: the name of the campaign
- Brand: the brand name
- TargetAudience: description of the target audience
- CoreMessage: the main message or tagline
- ActionableDataPoints: object with LaunchDate, PrimaryChannel, Budget, Goal, CreativeRequirements
- CallToAction: the CTA text
- AdvertiserContact: object with name, email, phone";

/// LLM-backed first-stage parser of a marketing brief.
pub struct LlmExtractor {
    client: LlmClient,
}

impl LlmExtractor {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, raw_text: &str) -> ContentLensResult<serde_json::Value> {
        info!(model = %self.client.model_id(), chars = raw_text.len(), "Extractor starting");

        let prompt = format!(
            "Extract these fields where present:\n{FIELDS}\n\nUSER TEXT TO ANALYZE:\n{raw_text}"
        );
        let response = self.client.complete(Some(SYSTEM_PROMPT), &prompt).await?;

        let value = parse_json_object(&response).map_err(|e| {
            warn!(error = %e, "Extractor returned unparsable output");
            e
        })?;

        info!("Extraction completed");
        Ok(value)
    }
}

/// Parse the first JSON object in an LLM response, tolerating code fences
/// and leading/trailing prose.
pub fn parse_json_object(response: &str) -> ContentLensResult<serde_json::Value> {
    let start = response.find('{');
    let end = response.rfind('}');

    let candidate = match (start, end) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => {
            return Err(ContentLensError::Extraction(
                "extractor response contains no JSON object".to_string(),
            ))
        }
    };

    let value: serde_json::Value = serde_json::from_str(candidate)
        .map_err(|e| ContentLensError::Extraction(format!("invalid JSON from extractor: {e}")))?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(ContentLensError::Extraction(
            "extractor response is not a JSON object".to_string(),
        ))
    }
}
