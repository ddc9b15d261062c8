//! Wires configuration into a ready-to-serve [`AppState`].

use crate::config::ContentLensConfig;
use contentlens_agent::{
    llm_capability_agents, AgentKind, LlmClient, LlmExtractor, LlmIntentClassifier, LlmJudge,
    LlmRefiner,
};
use contentlens_compliance::{ComplianceAgent, ComplianceChecker};
use contentlens_gateway::{AppState, LangfuseClient, LangfuseObserver, TraceBackend};
use contentlens_ingest::FileLoader;
use contentlens_orchestrator::{
    AgentRegistry, FanoutObserver, LogObserver, Workflow, WorkflowObserver,
};
use std::sync::Arc;
use tracing::info;

/// Build the workflow, loader and tracing backend described by `config`.
///
/// Must run inside a Tokio runtime when Langfuse is configured.
pub fn build_state(config: &ContentLensConfig) -> anyhow::Result<AppState> {
    let llm = &config.llm;
    let client = |kind| LlmClient::new(llm.model_for(kind));

    let mut registry = AgentRegistry::with_agents(llm_capability_agents(llm));
    registry.register(Arc::new(ComplianceAgent::new(ComplianceChecker::with_rules(
        config.compliance.clone(),
    ))));
    info!(count = registry.agent_count(), "Capability agents registered");

    let mut observers: Vec<Arc<dyn WorkflowObserver>> = vec![Arc::new(LogObserver)];
    let mut tracer: Option<Arc<dyn TraceBackend>> = None;
    if config.langfuse.is_configured() {
        let langfuse = Arc::new(LangfuseClient::new(config.langfuse.clone())?);
        observers.push(Arc::new(LangfuseObserver::new(langfuse.clone())));
        tracer = Some(langfuse);
        info!(host = %config.langfuse.host, "Langfuse tracing enabled");
    } else {
        info!("Langfuse not configured, tracing to logs only");
    }

    let workflow = Workflow::builder(
        Arc::new(LlmExtractor::new(client(AgentKind::Extractor))),
        Arc::new(registry),
    )
    .classifier(Arc::new(LlmIntentClassifier::new(client(AgentKind::Router))))
    .refiner(Arc::new(LlmRefiner::new(client(AgentKind::Refiner))))
    .judge(Arc::new(LlmJudge::new(client(AgentKind::Judge))))
    .observer(Arc::new(FanoutObserver::new(observers)))
    .config(config.workflow.clone())
    .build();

    let mut state = AppState::new(
        Arc::new(workflow),
        Arc::new(FileLoader::new(config.ingest.clone())),
    );
    if let Some(tracer) = tracer {
        state = state.with_tracer(tracer);
    }
    Ok(state)
}
