use crate::llm::LlmClient;
use async_trait::async_trait;
use contentlens_core::{Evaluation, Judge};
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are an AI Quality Judge. Evaluate AI-generated content for a \
specific agent type on relevance, accuracy, completeness, clarity and overall quality. Give a \
score from 1 to 10 (10 being perfect) and brief reasoning.";

const DEFAULT_SCORE: u8 = 5;

/// LLM-as-judge scoring of agent outputs.
pub struct LlmJudge {
    client: LlmClient,
}

impl LlmJudge {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn evaluate(&self, agent_type: &str, input_context: &str, output: &str) -> Evaluation {
        let prompt = format!(
            "AGENT TYPE: {agent_type}\nINPUT CONTEXT: {input_context}\nOUTPUT TO EVALUATE: {output}\n\n\
             Answer in this format:\nSCORE: [1-10]\nREASONING: [brief explanation]"
        );

        match self.client.complete(Some(SYSTEM_PROMPT), &prompt).await {
            Ok(response) => {
                let evaluation = parse_judgement(agent_type, &response);
                info!(agent_type, score = evaluation.score, "Judge scored output");
                evaluation
            }
            Err(e) => {
                warn!(agent_type, error = %e, "Judge evaluation failed");
                Evaluation {
                    agent_type: agent_type.to_string(),
                    score: 1,
                    reasoning: format!("Evaluation error: {e}"),
                }
            }
        }
    }
}

/// Parse `SCORE:` and `REASONING:` lines. Scores are clamped to `1..=10`;
/// a missing or unparsable score falls back to 5.
pub fn parse_judgement(agent_type: &str, response: &str) -> Evaluation {
    let mut score = DEFAULT_SCORE;
    let mut reasoning = "Evaluation failed to parse".to_string();

    for line in response.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix("SCORE:") {
            let digits: String = value
                .trim()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(parsed) = digits.parse::<u32>() {
                score = parsed.clamp(1, 10) as u8;
            }
        } else if let Some(value) = line.strip_prefix("REASONING:") {
            reasoning = value.trim().to_string();
        }
    }

    Evaluation {
        agent_type: agent_type.to_string(),
        score,
        reasoning,
    }
}
