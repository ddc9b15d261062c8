use super::LlmBackend;
use crate::config::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use contentlens_core::{ContentLensError, ContentLensResult};
use std::time::Duration;

/// OpenAI-compatible chat completions backend.
///
/// Works with Ollama, OpenAI, OpenRouter, Groq and any other provider that
/// serves `/v1/chat/completions`.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: ModelConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, http }
    }

    fn build_messages(&self, system_prompt: Option<&str>, prompt: &str) -> Vec<serde_json::Value> {
        let mut api_messages: Vec<serde_json::Value> = Vec::new();

        if let Some(sys) = system_prompt {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }
        api_messages.push(serde_json::json!({
            "role": "user",
            "content": prompt
        }));

        api_messages
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Content-Type", "application/json");

        let request = if self.config.api_key.is_empty() {
            request
        } else {
            request.header("Authorization", format!("Bearer {}", self.config.api_key))
        };

        // OpenRouter requires extra headers
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request.header("X-Title", "ContentLens")
        } else {
            request
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, system_prompt: Option<&str>, prompt: &str) -> ContentLensResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": self.build_messages(system_prompt, prompt),
            "stream": false,
        });

        let request = self.add_provider_headers(self.http.post(&url));

        let resp = request
            .json(&body)
            .send()
            .await
            .map_err(|e| ContentLensError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ContentLensError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(ContentLensError::Http(format!(
                "LLM API error {status}: {resp_body}"
            )));
        }

        parse_openai_response(&resp_body)
    }
}

/// Pull the assistant text out of a chat completions response body.
pub fn parse_openai_response(body: &serde_json::Value) -> ContentLensResult<String> {
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| ContentLensError::Agent(format!("LLM response has no content: {body}")))?;

    Ok(content.trim().to_string())
}
