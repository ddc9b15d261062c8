//! Langfuse tracing backend.
//!
//! [`LangfuseClient`] talks to the Langfuse public API with HTTP basic auth.
//! [`LangfuseObserver`] feeds workflow [`TraceEvent`]s into the ingestion
//! endpoint from a background task so that emitting never blocks a run.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use contentlens_core::{ContentLensError, ContentLensResult};
use contentlens_orchestrator::{TraceEvent, WorkflowObserver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Most events sent in one ingestion request.
const MAX_BATCH: usize = 50;

/// Events queued for delivery before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

fn default_host() -> String {
    "https://cloud.langfuse.com".to_string()
}

/// `[langfuse]` configuration section. Tracing is off unless both keys are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangfuseConfig {
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for LangfuseConfig {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            secret_key: String::new(),
            host: default_host(),
        }
    }
}

impl LangfuseConfig {
    pub fn is_configured(&self) -> bool {
        !self.public_key.trim().is_empty() && !self.secret_key.trim().is_empty()
    }
}

/// One entry of an ingestion batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub body: serde_json::Value,
}

impl IngestionEvent {
    fn new(kind: &str, body: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind: kind.to_string(),
            body,
        }
    }
}

/// A score attached to a trace by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualScore {
    pub trace_id: String,
    pub agent_name: String,
    pub value: f64,
    pub comment: Option<String>,
}

/// What the scoring endpoint needs from a tracing backend.
#[async_trait]
pub trait TraceBackend: Send + Sync {
    async fn trace_exists(&self, trace_id: &str) -> ContentLensResult<bool>;

    async fn create_score(&self, score: ManualScore) -> ContentLensResult<()>;
}

/// HTTP client for the Langfuse public API.
pub struct LangfuseClient {
    http: reqwest::Client,
    config: LangfuseConfig,
}

impl LangfuseClient {
    pub fn new(config: LangfuseConfig) -> ContentLensResult<Self> {
        if !config.is_configured() {
            return Err(ContentLensError::Config(
                "Langfuse public_key and secret_key are required".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ContentLensError::Tracing(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.host.trim_end_matches('/'), path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .basic_auth(&self.config.public_key, Some(&self.config.secret_key))
    }

    /// Send one ingestion batch.
    pub async fn ingest(&self, batch: &[IngestionEvent]) -> ContentLensResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let response = self
            .request(reqwest::Method::POST, "/api/public/ingestion")
            .json(&serde_json::json!({ "batch": batch }))
            .send()
            .await
            .map_err(|e| ContentLensError::Tracing(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ContentLensError::Tracing(format!(
                "ingestion returned {status}: {text}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TraceBackend for LangfuseClient {
    async fn trace_exists(&self, trace_id: &str) -> ContentLensResult<bool> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/api/public/traces/{trace_id}"),
            )
            .send()
            .await
            .map_err(|e| ContentLensError::Tracing(e.to_string()))?;

        match response.status() {
            s if s.is_success() => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            s => Err(ContentLensError::Tracing(format!(
                "trace lookup returned {s}"
            ))),
        }
    }

    async fn create_score(&self, score: ManualScore) -> ContentLensResult<()> {
        let body = serde_json::json!({
            "id": Uuid::new_v4().to_string(),
            "traceId": score.trace_id,
            "name": format!("{}_manual_score", score.agent_name),
            "value": score.value,
            "comment": score.comment.unwrap_or_else(|| "Manual user score".to_string()),
            "dataType": "NUMERIC",
        });
        let response = self
            .request(reqwest::Method::POST, "/api/public/scores")
            .json(&body)
            .send()
            .await
            .map_err(|e| ContentLensError::Tracing(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentLensError::Tracing(format!(
                "score creation returned {status}"
            )));
        }
        Ok(())
    }
}

/// Map a workflow event onto the Langfuse ingestion model.
///
/// The run is one trace keyed by its `trace_id`; stages and capability
/// tasks become spans, phase changes become events and judge evaluations
/// become scores.
pub fn to_ingestion(event: &TraceEvent) -> IngestionEvent {
    match event {
        TraceEvent::WorkflowStarted {
            trace_id,
            user_request,
            source_lang,
            timestamp,
        } => IngestionEvent::new(
            "trace-create",
            serde_json::json!({
                "id": trace_id,
                "name": "document_workflow",
                "timestamp": timestamp,
                "input": { "user_request": user_request, "source_lang": source_lang },
            }),
        ),
        TraceEvent::PhaseChanged { trace_id, phase } => IngestionEvent::new(
            "event-create",
            serde_json::json!({
                "id": Uuid::new_v4().to_string(),
                "traceId": trace_id,
                "name": format!("phase:{phase}"),
                "metadata": phase,
            }),
        ),
        TraceEvent::StageCompleted {
            trace_id,
            stage,
            duration_ms,
            output,
        } => IngestionEvent::new(
            "span-create",
            span_body(trace_id, stage, *duration_ms, output.clone(), None),
        ),
        TraceEvent::TaskFinished {
            trace_id,
            capability,
            status,
            duration_ms,
            error,
            output,
        } => {
            let mut body = span_body(
                trace_id,
                capability.name(),
                *duration_ms,
                output.clone().map(Into::into).unwrap_or_default(),
                error.as_deref(),
            );
            body["metadata"]["status"] = serde_json::to_value(status).unwrap_or_default();
            IngestionEvent::new("span-create", body)
        }
        TraceEvent::Evaluated {
            trace_id,
            evaluation,
        } => IngestionEvent::new(
            "score-create",
            serde_json::json!({
                "id": Uuid::new_v4().to_string(),
                "traceId": trace_id,
                "name": format!("{}_quality", evaluation.agent_type),
                "value": evaluation.score,
                "comment": evaluation.reasoning,
            }),
        ),
        TraceEvent::WorkflowFinished {
            trace_id,
            succeeded,
            error,
            duration_ms,
        } => IngestionEvent::new(
            "trace-create",
            serde_json::json!({
                "id": trace_id,
                "output": { "succeeded": succeeded, "error": error },
                "metadata": { "duration_ms": duration_ms },
            }),
        ),
    }
}

fn span_body(
    trace_id: &str,
    name: &str,
    duration_ms: u64,
    output: serde_json::Value,
    error: Option<&str>,
) -> serde_json::Value {
    let end = Utc::now();
    let start = end - ChronoDuration::milliseconds(duration_ms as i64);
    let mut body = serde_json::json!({
        "id": Uuid::new_v4().to_string(),
        "traceId": trace_id,
        "name": name,
        "startTime": start,
        "endTime": end,
        "output": output,
        "metadata": { "duration_ms": duration_ms },
    });
    if let Some(error) = error {
        body["level"] = "ERROR".into();
        body["statusMessage"] = error.into();
    }
    body
}

/// Observer that ships events to Langfuse in the background.
///
/// Events wait in a bounded queue; when it is full new events are dropped
/// with a warning, as are delivery failures. Must be created inside a
/// Tokio runtime.
pub struct LangfuseObserver {
    tx: mpsc::Sender<TraceEvent>,
}

impl LangfuseObserver {
    pub fn new(client: Arc<LangfuseClient>) -> Self {
        Self::with_capacity(client, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(client: Arc<LangfuseClient>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<TraceEvent>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(first) = rx.recv().await {
                let mut batch = vec![to_ingestion(&first)];
                while batch.len() < MAX_BATCH {
                    match rx.try_recv() {
                        Ok(event) => batch.push(to_ingestion(&event)),
                        Err(_) => break,
                    }
                }
                match client.ingest(&batch).await {
                    Ok(()) => debug!(events = batch.len(), "Langfuse batch sent"),
                    Err(e) => warn!(error = %e, events = batch.len(), "Langfuse ingestion failed"),
                }
            }
        });

        Self { tx }
    }
}

impl WorkflowObserver for LangfuseObserver {
    fn emit(&self, event: TraceEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(trace_id = %event.trace_id(), "Langfuse queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Langfuse observer task has stopped, dropping event");
            }
        }
    }
}
