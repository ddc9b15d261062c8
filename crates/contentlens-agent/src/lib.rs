//! LLM backends and LLM-backed agents for ContentLens.
//!
//! Every agent here implements one of the ports defined in
//! `contentlens-core` on top of a single-turn [`LlmClient`] completion.

pub mod backends;
pub mod capabilities;
pub mod classifier;
pub mod config;
pub mod extractor;
pub mod judge;
pub mod llm;
pub mod refiner;

pub use capabilities::{llm_capability_agents, PromptAgent};
pub use classifier::LlmIntentClassifier;
pub use config::{AgentKind, LlmProvider, LlmSettings, ModelConfig, ModelOverride};
pub use extractor::LlmExtractor;
pub use judge::LlmJudge;
pub use llm::LlmClient;
pub use refiner::LlmRefiner;
