use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama server through its OpenAI-compatible endpoint. No API key needed.
    #[default]
    Ollama,
    OpenAi,
    OpenRouter,
    /// Groq cloud inference: OpenAI-compatible API.
    Groq,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model_id() -> String {
    "llama3.1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    110
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model_id: default_model_id(),
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelConfig {
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url.trim_end_matches('/')
        } else {
            match self.provider {
                LlmProvider::Ollama => "http://localhost:11434",
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::OpenRouter => "https://openrouter.ai/api",
                LlmProvider::Groq => "https://api.groq.com/openai",
            }
        }
    }
}

/// Which agent a model override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Extractor,
    Refiner,
    Router,
    Judge,
    Summarizer,
    Translator,
    Analyzer,
    Recommender,
    Ideation,
    Copywriter,
}

impl AgentKind {
    /// Key used in the `[llm.models]` table.
    pub fn key(&self) -> &'static str {
        match self {
            AgentKind::Extractor => "extractor",
            AgentKind::Refiner => "refiner",
            AgentKind::Router => "router",
            AgentKind::Judge => "judge",
            AgentKind::Summarizer => "summarizer",
            AgentKind::Translator => "translator",
            AgentKind::Analyzer => "analyzer",
            AgentKind::Recommender => "recommender",
            AgentKind::Ideation => "ideation",
            AgentKind::Copywriter => "copywriter",
        }
    }

    /// Temperature used when no override is configured.
    ///
    /// Extraction, routing and judging want deterministic output; creative
    /// capabilities keep the base temperature.
    fn default_temperature(&self) -> Option<f32> {
        match self {
            AgentKind::Extractor | AgentKind::Router | AgentKind::Judge => Some(0.0),
            AgentKind::Translator | AgentKind::Refiner => Some(0.2),
            _ => None,
        }
    }
}

/// Per-agent override of the base model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelOverride {
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// The `[llm]` configuration section: one base model plus per-agent overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(flatten)]
    pub base: ModelConfig,
    #[serde(default)]
    pub models: HashMap<String, ModelOverride>,
}

impl LlmSettings {
    /// Resolve the model configuration for one agent.
    pub fn model_for(&self, kind: AgentKind) -> ModelConfig {
        let mut config = self.base.clone();
        if let Some(temperature) = kind.default_temperature() {
            config.temperature = temperature;
        }
        if let Some(model_override) = self.models.get(kind.key()) {
            if let Some(model_id) = &model_override.model_id {
                config.model_id = model_id.clone();
            }
            if let Some(temperature) = model_override.temperature {
                config.temperature = temperature;
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_local_ollama() {
        let config = ModelConfig::default();
        assert_eq!(config.provider, LlmProvider::Ollama);
        assert_eq!(config.base_url(), "http://localhost:11434");
        assert_eq!(config.model_id, "llama3.1");
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let config = ModelConfig {
            api_base_url: Some("http://ollama:11434/".to_string()),
            ..ModelConfig::default()
        };
        assert_eq!(config.base_url(), "http://ollama:11434");
    }

    #[test]
    fn test_model_for_applies_override() {
        let mut settings = LlmSettings::default();
        settings.models.insert(
            "router".to_string(),
            ModelOverride {
                model_id: Some("mistral".to_string()),
                temperature: None,
            },
        );

        let router = settings.model_for(AgentKind::Router);
        assert_eq!(router.model_id, "mistral");
        assert_eq!(router.temperature, 0.0);

        let analyzer = settings.model_for(AgentKind::Analyzer);
        assert_eq!(analyzer.model_id, "llama3.1");
        assert_eq!(analyzer.temperature, 0.7);
    }

    #[test]
    fn test_settings_parse_from_toml() {
        let toml_str = r#"
            provider = "openai"
            model_id = "gpt-4o-mini"
            api_key = "sk-test"

            [models.translator]
            model_id = "gpt-4o"
            temperature = 0.1
        "#;
        let settings: LlmSettings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.base.provider, LlmProvider::OpenAi);
        let translator = settings.model_for(AgentKind::Translator);
        assert_eq!(translator.model_id, "gpt-4o");
        assert_eq!(translator.temperature, 0.1);
    }
}
