pub mod openai;

use async_trait::async_trait;
use contentlens_core::ContentLensResult;

/// Trait for LLM provider backends.
///
/// Every agent in this crate issues single-turn completions: an optional
/// system prompt plus one user prompt, answered with plain text.
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `LlmBackend` for your struct
/// 3. Add the variant to `LlmProvider` in `config.rs`
/// 4. Wire it up in `LlmClient::new()` in `llm.rs`
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, system_prompt: Option<&str>, prompt: &str) -> ContentLensResult<String>;
}
