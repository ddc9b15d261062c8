use crate::backends::openai::OpenAiBackend;
use crate::backends::LlmBackend;
use crate::config::{LlmProvider, ModelConfig};
use contentlens_core::ContentLensResult;
use std::sync::Arc;

/// LLM client that dispatches to the correct provider backend.
///
/// Cheap to clone; agents built from the same configuration can share one.
#[derive(Clone)]
pub struct LlmClient {
    backend: Arc<dyn LlmBackend>,
    model_id: String,
}

impl LlmClient {
    pub fn new(config: ModelConfig) -> Self {
        let model_id = config.model_id.clone();
        let backend: Arc<dyn LlmBackend> = match config.provider {
            LlmProvider::Ollama
            | LlmProvider::OpenAi
            | LlmProvider::OpenRouter
            | LlmProvider::Groq => Arc::new(OpenAiBackend::new(config)),
        };
        Self { backend, model_id }
    }

    /// Create from a pre-built backend (custom providers, tests).
    pub fn from_backend(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            model_id: "custom".to_string(),
        }
    }

    /// Model identifier, for logging.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Single-turn completion.
    pub async fn complete(&self, system_prompt: Option<&str>, prompt: &str) -> ContentLensResult<String> {
        self.backend.complete(system_prompt, prompt).await
    }
}
