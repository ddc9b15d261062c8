//! End-to-end workflow runs with fake agents.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use contentlens_compliance::ComplianceAgent;
use contentlens_core::{
    Capability, CapabilityAgent, ComplianceStatus, IssueSeverity, TaskStatus, WorkflowState,
};
use contentlens_orchestrator::{
    AgentRegistry, TraceEvent, Workflow, WorkflowConfig, WorkflowOptions, WorkflowPhase,
};
use std::sync::Arc;
use Capability::*;

fn workflow(agents: &[Arc<FakeAgent>]) -> Workflow {
    Workflow::builder(FakeExtractor::brief(), Arc::new(registry_of(agents))).build()
}

fn request(text: &str) -> WorkflowState {
    WorkflowState::new("Ramadan Offers brief. Target audience: families.", text, "en")
}

#[tokio::test]
async fn test_translate_then_analyze() {
    let agents = text_agents();
    let state = workflow(&agents)
        .run(request("Translate to Arabic and analyze"), WorkflowOptions::default())
        .await
        .unwrap();

    assert_eq!(state.task_plan, Some(vec![Translate, Analyze]));
    assert_eq!(state.batches, vec![vec![Translate], vec![Analyze]]);
    assert_eq!(state.batch_cursor, 2);
    assert!(state.translation.is_some());
    assert!(state.analysis.is_some());
    assert!(state.summary.is_none());
    assert!(state.compliance.is_none());
    assert_eq!(state.populated_outputs(), vec![Translate, Analyze]);
    assert!(state.per_task_errors.is_empty());
}

#[tokio::test]
async fn test_full_report_runs_one_parallel_batch() {
    let agents = text_agents();
    let state = workflow(&agents)
        .run(request("Give me a full report"), WorkflowOptions::default())
        .await
        .unwrap();

    assert_eq!(state.task_plan, Some(vec![Summarize, Analyze, Recommend]));
    assert_eq!(state.batches, vec![vec![Summarize, Analyze, Recommend]]);
    assert_eq!(state.batch_cursor, 1);
    assert_eq!(state.populated_outputs(), vec![Summarize, Analyze, Recommend]);
}

#[tokio::test]
async fn test_unrecognized_request_defaults_to_analysis() {
    let agents = text_agents();
    let state = workflow(&agents)
        .run(request("Hello there, thanks!"), WorkflowOptions::default())
        .await
        .unwrap();

    assert_eq!(state.batches, vec![vec![Analyze]]);
    assert_eq!(state.populated_outputs(), vec![Analyze]);
}

#[tokio::test]
async fn test_compliance_checks_generated_copy() {
    let copywriter = FakeAgent::replying(
        Copywrite,
        "Variant 1\nSubject: Join now\nBody: We sell personal data to partners.",
    );
    let registry = AgentRegistry::with_agents([
        copywriter as Arc<dyn CapabilityAgent>,
        Arc::new(ComplianceAgent::default()) as Arc<dyn CapabilityAgent>,
    ]);
    let workflow = Workflow::builder(FakeExtractor::brief(), Arc::new(registry)).build();

    let state = workflow
        .run(
            request("Write an email and check compliance"),
            WorkflowOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(state.batches, vec![vec![Copywrite], vec![Compliance]]);
    let report = state.compliance.expect("compliance report");
    assert_eq!(report.status, ComplianceStatus::Block);
    assert!(report
        .issues
        .iter()
        .any(|issue| issue.severity == IssueSeverity::Block));
    assert!(state.task_metadata[&Compliance].validation_passed);
}

#[tokio::test]
async fn test_failed_task_leaves_siblings_and_later_batches_intact() {
    let mut agents = text_agents();
    agents.retain(|a| a.capability() != Analyze);
    agents.push(FakeAgent::failing(Analyze, "model unavailable"));

    let state = workflow(&agents)
        .run(
            request("Summarize, translate, then analyze and suggest ideas"),
            WorkflowOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        state.batches,
        vec![
            vec![Summarize],
            vec![Translate],
            vec![Analyze, Recommend, Ideate]
        ]
    );
    assert_eq!(state.populated_outputs(), vec![Summarize, Translate, Recommend, Ideate]);
    assert_eq!(state.per_task_errors.len(), 1);
    assert_eq!(state.per_task_errors[&Analyze], "AgentError: model unavailable");
    assert_eq!(state.task_metadata[&Analyze].status, TaskStatus::Failed);
    assert_eq!(state.batch_cursor, 3);
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn test_extraction_failure_fails_the_run() {
    let agents = text_agents();
    let workflow =
        Workflow::builder(FakeExtractor::failing("connection refused"), Arc::new(registry_of(&agents)))
            .build();

    let failure = workflow
        .run(request("Give me a full report"), WorkflowOptions::default())
        .await
        .unwrap_err();

    let json = serde_json::to_value(&failure).unwrap();
    assert_eq!(json.as_object().unwrap().len(), 1);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("HttpError: connection refused"));
    assert!(agents.iter().all(|a| a.call_count() == 0));
}

#[tokio::test]
async fn test_empty_extraction_fails_the_run() {
    let agents = text_agents();
    for empty in [serde_json::json!({}), serde_json::Value::Null] {
        let workflow = Workflow::builder(
            FakeExtractor::returning(empty),
            Arc::new(registry_of(&agents)),
        )
        .build();
        let failure = workflow
            .run(request("analyze"), WorkflowOptions::default())
            .await
            .unwrap_err();
        assert!(failure.error.contains("empty record"));
    }
    assert!(agents.iter().all(|a| a.call_count() == 0));
}

#[tokio::test]
async fn test_routing_is_idempotent() {
    let agents = text_agents();
    let workflow = workflow(&agents);
    let mut state = request("Translate to Arabic and analyze");
    workflow.extract(&mut state).await.unwrap();
    workflow.route(&mut state).await;
    let routed = state.clone();

    workflow.route(&mut state).await;
    assert_eq!(state, routed);
}

#[tokio::test]
async fn test_rerunning_a_finished_state_does_nothing_new() {
    let extractor = FakeExtractor::brief();
    let agents = text_agents();
    let workflow = Workflow::builder(extractor.clone(), Arc::new(registry_of(&agents))).build();

    let first = workflow
        .run(request("Give me a full report"), WorkflowOptions::default())
        .await
        .unwrap();
    let second = workflow
        .run(first.clone(), WorkflowOptions::default())
        .await
        .unwrap();

    assert_eq!(second, first);
    assert_eq!(extractor.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(agents.iter().all(|a| a.call_count() <= 1));
}

#[tokio::test]
async fn test_extract_only_stops_after_extraction() {
    let agents = text_agents();
    let state = workflow(&agents)
        .run(
            request("Give me a full report"),
            WorkflowOptions { extract_only: true },
        )
        .await
        .unwrap();

    assert!(state.extraction.is_some());
    assert!(state.task_plan.is_none());
    assert!(state.populated_outputs().is_empty());
    assert!(agents.iter().all(|a| a.call_count() == 0));
}

#[tokio::test]
async fn test_trace_events_bracket_the_run() {
    let agents = text_agents();
    let observer = Arc::new(RecordingObserver::default());
    let workflow = Workflow::builder(FakeExtractor::brief(), Arc::new(registry_of(&agents)))
        .observer(observer.clone())
        .build();

    let state = workflow
        .run(request("Translate to Arabic and analyze"), WorkflowOptions::default())
        .await
        .unwrap();
    let trace_id = state.trace_id.clone().unwrap();
    assert!(uuid::Uuid::parse_str(&trace_id).is_ok());

    let events = observer.events();
    assert!(matches!(events.first(), Some(TraceEvent::WorkflowStarted { .. })));
    assert!(matches!(
        events.last(),
        Some(TraceEvent::WorkflowFinished { succeeded: true, .. })
    ));
    assert!(events.iter().all(|e| e.trace_id() == trace_id));

    let phases: Vec<WorkflowPhase> = events
        .iter()
        .filter_map(|e| match e {
            TraceEvent::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            WorkflowPhase::Extracted,
            WorkflowPhase::Routed,
            WorkflowPhase::BatchRunning(0),
            WorkflowPhase::BatchRunning(1),
            WorkflowPhase::Done,
        ]
    );

    let finished = events
        .iter()
        .filter(|e| matches!(e, TraceEvent::TaskFinished { .. }))
        .count();
    assert_eq!(finished, 2);
}

#[tokio::test]
async fn test_failed_run_emits_failed_phase() {
    let observer = Arc::new(RecordingObserver::default());
    let workflow = Workflow::builder(FakeExtractor::failing("down"), Arc::new(AgentRegistry::new()))
        .observer(observer.clone())
        .build();

    let failure = workflow
        .run(request("analyze"), WorkflowOptions::default())
        .await
        .unwrap_err();

    let events = observer.events();
    assert!(events.iter().any(|e| matches!(
        e,
        TraceEvent::PhaseChanged {
            phase: WorkflowPhase::Failed,
            ..
        }
    )));
    assert!(events.iter().all(|e| e.trace_id() == failure.trace_id));
}

#[tokio::test]
async fn test_refiner_rewrites_request_before_routing() {
    let agents = text_agents();
    let workflow = Workflow::builder(FakeExtractor::brief(), Arc::new(registry_of(&agents)))
        .refiner(Arc::new(FakeRefiner(Ok("Translate the brief into Arabic"))))
        .build();

    let state = workflow
        .run(request("make it readable for our Dubai team"), WorkflowOptions::default())
        .await
        .unwrap();

    assert_eq!(state.user_request, "Translate the brief into Arabic");
    assert_eq!(state.task_plan, Some(vec![Translate]));
}

#[tokio::test]
async fn test_failing_refiner_keeps_request() {
    let agents = text_agents();
    let workflow = Workflow::builder(FakeExtractor::brief(), Arc::new(registry_of(&agents)))
        .refiner(Arc::new(FakeRefiner(Err("timeout"))))
        .build();

    let state = workflow
        .run(request("Give me a full report"), WorkflowOptions::default())
        .await
        .unwrap();

    assert_eq!(state.user_request, "Give me a full report");
    assert_eq!(state.task_plan, Some(vec![Summarize, Analyze, Recommend]));
    assert_eq!(
        state.errors,
        vec!["Refinement failed, kept original request: AgentError: timeout".to_string()]
    );
    assert!(state.per_task_errors.is_empty());
}

#[tokio::test]
async fn test_blank_refinement_is_recorded() {
    let agents = text_agents();
    let workflow = Workflow::builder(FakeExtractor::brief(), Arc::new(registry_of(&agents)))
        .refiner(Arc::new(FakeRefiner(Ok("   "))))
        .build();

    let state = workflow
        .run(request("recap"), WorkflowOptions::default())
        .await
        .unwrap();

    assert_eq!(state.user_request, "recap");
    assert_eq!(state.errors.len(), 1);
    assert!(state.errors[0].starts_with("Refinement returned nothing"));
}

#[tokio::test]
async fn test_unregistered_capability_is_reported() {
    let agents = text_agents();
    let state = workflow(&agents)
        .run(request("Check GDPR compliance"), WorkflowOptions::default())
        .await
        .unwrap();

    assert_eq!(state.task_plan, Some(vec![Compliance]));
    assert_eq!(
        state.errors,
        vec!["No agent registered for capability 'compliance'".to_string()]
    );
    assert!(state.per_task_errors[&Compliance].starts_with("OrchestratorError: no agent"));
    assert!(state.is_complete());
}

#[tokio::test]
async fn test_extraction_without_brief_fields_is_reported() {
    let agents = text_agents();
    let workflow = Workflow::builder(
        FakeExtractor::returning(serde_json::json!({"Note": "no structured fields"})),
        Arc::new(registry_of(&agents)),
    )
    .build();

    let state = workflow
        .run(request("recap"), WorkflowOptions::default())
        .await
        .unwrap();

    assert_eq!(
        state.errors,
        vec!["Extraction has none of the expected brief fields".to_string()]
    );
    assert_eq!(state.summary.as_deref(), Some("Big idea: family iftar moments."));
}

#[tokio::test]
async fn test_disabled_refinement_is_skipped() {
    let agents = text_agents();
    let config = WorkflowConfig {
        refine: false,
        ..WorkflowConfig::default()
    };
    let workflow = Workflow::builder(FakeExtractor::brief(), Arc::new(registry_of(&agents)))
        .refiner(Arc::new(FakeRefiner(Ok("Translate the brief into Arabic"))))
        .config(config)
        .build();

    let state = workflow
        .run(request("Give me a full report"), WorkflowOptions::default())
        .await
        .unwrap();
    assert_eq!(state.user_request, "Give me a full report");
}

#[tokio::test]
async fn test_judge_records_every_stage() {
    let agents = text_agents();
    let workflow = Workflow::builder(FakeExtractor::brief(), Arc::new(registry_of(&agents)))
        .refiner(Arc::new(FakeRefiner(Ok("Give me a full report"))))
        .judge(Arc::new(FakeJudge))
        .build();

    let state = workflow
        .run(request("everything please"), WorkflowOptions::default())
        .await
        .unwrap();

    let judged: Vec<&str> = state
        .evaluations
        .iter()
        .map(|e| e.agent_type.as_str())
        .collect();
    assert_eq!(judged[..2], ["extraction", "refiner"]);
    assert_eq!(judged.len(), 5);
    assert!(judged.contains(&"summary"));
    assert!(judged.contains(&"analysis"));
    assert!(judged.contains(&"recommendation"));
}

#[tokio::test]
async fn test_monitor_is_shared_across_runs() {
    let agents = text_agents();
    let workflow = workflow(&agents);
    for _ in 0..3 {
        workflow
            .run(request("analyze"), WorkflowOptions::default())
            .await
            .unwrap();
    }
    let metrics = workflow.monitor().get(Analyze).await;
    assert_eq!(metrics.invocations, 3);
    assert_eq!(metrics.completed, 3);
}
