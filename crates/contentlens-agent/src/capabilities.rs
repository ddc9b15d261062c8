//! The six LLM-backed capabilities.
//!
//! Each one is a [`PromptAgent`]: a fixed system prompt plus a user prompt
//! rendered from the task snapshot. Compliance is rule-based and lives in
//! `contentlens-compliance`.

use crate::config::{AgentKind, LlmSettings};
use crate::llm::LlmClient;
use async_trait::async_trait;
use contentlens_core::{
    Capability, CapabilityAgent, CapabilityOutput, ContentLensError, ContentLensResult, TaskInput,
};
use std::sync::Arc;
use tracing::info;

const SUMMARIZER_PROMPT: &str = "You are a senior Media Strategist. Summarize the extracted brief \
data as a 30-second read for a busy Creative Director: one sentence 'Big Idea', three bullet \
points for execution, and one critical deadline or constraint.";

const TRANSLATOR_PROMPT: &str = "You are a professional Arabic translator specializing in media and \
advertising. Translate the provided content into Modern Standard Arabic. Keep industry terms such \
as CTR, Brief and Target Audience in English where commonly used. If the content is JSON, translate \
the values and keep the keys in English.";

const ANALYZER_PROMPT: &str = "You are a Senior Media Planner. Analyze the advertising brief: \
identify missing information (budget, timeline, target audience), suggest three strategic \
recommendations, and identify potential risks such as tight deadlines or vague KPIs.";

const RECOMMENDER_PROMPT: &str = "You are a marketing strategist. Give a numbered list of concrete, \
actionable recommendations and next steps for this campaign, tailored to the user's request.";

const IDEATION_PROMPT: &str = "You are a creative director. Propose at least three distinct campaign \
ideas. Number each idea and give it a bold title, a headline and a one-line rationale.";

const COPYWRITER_PROMPT: &str = "You are a senior copywriter. Write two copy variants for the brief. \
Label each as 'Variant N' with a Subject line, a Body and a CTA.";

/// A capability implemented as one LLM completion.
pub struct PromptAgent {
    capability: Capability,
    system_prompt: &'static str,
    client: LlmClient,
}

impl PromptAgent {
    pub fn summarizer(client: LlmClient) -> Self {
        Self::new(Capability::Summarize, SUMMARIZER_PROMPT, client)
    }

    pub fn translator(client: LlmClient) -> Self {
        Self::new(Capability::Translate, TRANSLATOR_PROMPT, client)
    }

    pub fn analyzer(client: LlmClient) -> Self {
        Self::new(Capability::Analyze, ANALYZER_PROMPT, client)
    }

    pub fn recommender(client: LlmClient) -> Self {
        Self::new(Capability::Recommend, RECOMMENDER_PROMPT, client)
    }

    pub fn ideation(client: LlmClient) -> Self {
        Self::new(Capability::Ideate, IDEATION_PROMPT, client)
    }

    pub fn copywriter(client: LlmClient) -> Self {
        Self::new(Capability::Copywrite, COPYWRITER_PROMPT, client)
    }

    fn new(capability: Capability, system_prompt: &'static str, client: LlmClient) -> Self {
        Self {
            capability,
            system_prompt,
            client,
        }
    }

    fn render_prompt(&self, input: &TaskInput) -> String {
        match self.capability {
            Capability::Recommend | Capability::Copywrite => format!(
                "BRIEF DATA:\n{}\n\nUSER REQUEST:\n{}",
                input.content, input.user_request
            ),
            Capability::Translate => format!("DOCUMENT CONTENT:\n{}", input.content),
            _ => format!("BRIEF DATA:\n{}", input.content),
        }
    }
}

#[async_trait]
impl CapabilityAgent for PromptAgent {
    fn capability(&self) -> Capability {
        self.capability
    }

    async fn run(&self, input: &TaskInput) -> ContentLensResult<CapabilityOutput> {
        if self.capability == Capability::Translate && input.source_lang == "ar" {
            info!("Content already in Arabic, skipping translation");
            return Ok(CapabilityOutput::Text(format!(
                "Note: Content is already in Arabic. Original: {}",
                input.content
            )));
        }

        info!(
            capability = %self.capability,
            model = %self.client.model_id(),
            "Running capability agent"
        );
        let text = self
            .client
            .complete(Some(self.system_prompt), &self.render_prompt(input))
            .await?;

        if text.trim().is_empty() {
            return Err(ContentLensError::Agent(format!(
                "{} agent returned empty output",
                self.capability
            )));
        }
        Ok(CapabilityOutput::Text(text))
    }
}

/// Build every LLM-backed capability agent from the `[llm]` settings.
pub fn llm_capability_agents(settings: &LlmSettings) -> Vec<Arc<dyn CapabilityAgent>> {
    let client = |kind| LlmClient::new(settings.model_for(kind));
    vec![
        Arc::new(PromptAgent::summarizer(client(AgentKind::Summarizer))),
        Arc::new(PromptAgent::translator(client(AgentKind::Translator))),
        Arc::new(PromptAgent::analyzer(client(AgentKind::Analyzer))),
        Arc::new(PromptAgent::recommender(client(AgentKind::Recommender))),
        Arc::new(PromptAgent::ideation(client(AgentKind::Ideation))),
        Arc::new(PromptAgent::copywriter(client(AgentKind::Copywriter))),
    ]
}
