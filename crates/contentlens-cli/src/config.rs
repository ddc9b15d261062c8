//! `contentlens.toml` loading.
//!
//! Every section is optional. Values from the environment (and `.env`)
//! override the file for the settings that usually hold secrets or differ
//! per deployment.

use contentlens_agent::{LlmProvider, LlmSettings};
use contentlens_compliance::ComplianceRules;
use contentlens_gateway::LangfuseConfig;
use contentlens_ingest::IngestConfig;
use contentlens_orchestrator::WorkflowConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentLensConfig {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub compliance: ComplianceRules,
    #[serde(default)]
    pub langfuse: LangfuseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}

impl ContentLensConfig {
    /// Read `path`, falling back to defaults when it does not exist.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::parse(&text).map_err(|e| {
                anyhow::anyhow!("Failed to parse config file '{}': {e}", path.display())
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file '{}': {e}",
                path.display()
            )),
        }
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply `LANGFUSE_*` and `OLLAMA_BASE_URL` overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("LANGFUSE_PUBLIC_KEY") {
            self.langfuse.public_key = key;
        }
        if let Some(key) = non_empty("LANGFUSE_SECRET_KEY") {
            self.langfuse.secret_key = key;
        }
        if let Some(host) = non_empty("LANGFUSE_HOST") {
            self.langfuse.host = host;
        }
        if self.llm.base.provider == LlmProvider::Ollama {
            if let Some(url) = non_empty("OLLAMA_BASE_URL") {
                self.llm.base.api_base_url = Some(url);
            }
        }
    }
}
