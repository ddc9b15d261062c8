#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use contentlens_core::{
    Capability, CapabilityAgent, CapabilityOutput, ContentLensError, ContentLensResult,
    Evaluation, Extractor, Judge, Refiner, TaskInput,
};
use contentlens_orchestrator::{AgentRegistry, TraceEvent, WorkflowObserver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct FakeExtractor {
    reply: Result<serde_json::Value, String>,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn brief() -> Arc<Self> {
        Self::returning(serde_json::json!({
            "CampaignName": "Ramadan Offers",
            "Brand": "Acme",
            "TargetAudience": "Families in the Gulf region",
        }))
    }

    pub fn returning(value: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(value),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract(&self, _raw_text: &str) -> ContentLensResult<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(ContentLensError::Http)
    }
}

/// Capability agent with a canned reply (or failure) that counts calls and
/// records the content it was given.
pub struct FakeAgent {
    capability: Capability,
    reply: Result<String, String>,
    pub calls: AtomicUsize,
    pub inputs: Mutex<Vec<String>>,
}

impl FakeAgent {
    pub fn replying(capability: Capability, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            capability,
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(capability: Capability, message: &str) -> Arc<Self> {
        Arc::new(Self {
            capability,
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityAgent for FakeAgent {
    fn capability(&self) -> Capability {
        self.capability
    }

    async fn run(&self, input: &TaskInput) -> ContentLensResult<CapabilityOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.content.clone());
        self.reply
            .clone()
            .map(CapabilityOutput::Text)
            .map_err(ContentLensError::Agent)
    }
}

/// One replying fake per text capability.
pub fn text_agents() -> Vec<Arc<FakeAgent>> {
    vec![
        FakeAgent::replying(Capability::Summarize, "Big idea: family iftar moments."),
        FakeAgent::replying(Capability::Translate, "عروض رمضان للعائلات"),
        FakeAgent::replying(Capability::Analyze, "Missing: budget. Risk: tight timeline."),
        FakeAgent::replying(Capability::Recommend, "1. Confirm budget\n2. Add KPIs"),
        FakeAgent::replying(Capability::Ideate, "1. **Iftar Table**\n2. **Night Lights**"),
        FakeAgent::replying(Capability::Copywrite, "Variant 1\nSubject: Ramadan deals\nCTA: Shop now"),
    ]
}

pub fn registry_of(agents: &[Arc<FakeAgent>]) -> AgentRegistry {
    AgentRegistry::with_agents(
        agents
            .iter()
            .map(|a| a.clone() as Arc<dyn CapabilityAgent>),
    )
}

pub struct FakeRefiner(pub Result<&'static str, &'static str>);

#[async_trait]
impl Refiner for FakeRefiner {
    async fn refine(
        &self,
        _extraction: &serde_json::Value,
        _user_request: &str,
    ) -> ContentLensResult<String> {
        self.0
            .map(str::to_string)
            .map_err(|e| ContentLensError::Agent(e.to_string()))
    }
}

pub struct FakeJudge;

#[async_trait]
impl Judge for FakeJudge {
    async fn evaluate(&self, agent_type: &str, _input: &str, _output: &str) -> Evaluation {
        Evaluation {
            agent_type: agent_type.to_string(),
            score: 7,
            reasoning: "Solid.".to_string(),
        }
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<TraceEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl WorkflowObserver for RecordingObserver {
    fn emit(&self, event: TraceEvent) {
        self.events.lock().unwrap().push(event);
    }
}
