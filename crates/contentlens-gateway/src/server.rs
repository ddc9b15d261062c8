use crate::error::ApiError;
use crate::langfuse::{ManualScore, TraceBackend};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use contentlens_core::WorkflowState;
use contentlens_ingest::{prepare_document, FileLoader};
use contentlens_orchestrator::{Workflow, WorkflowOptions};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_USER_REQUEST: &str = "Analyze this document";

/// Room for the multipart envelope on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Shared application state.
pub struct AppState {
    pub workflow: Arc<Workflow>,
    pub loader: Arc<FileLoader>,
    /// `None` when no tracing backend is configured.
    pub tracer: Option<Arc<dyn TraceBackend>>,
}

impl AppState {
    pub fn new(workflow: Arc<Workflow>, loader: Arc<FileLoader>) -> Self {
        Self {
            workflow,
            loader,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn TraceBackend>) -> Self {
        self.tracer = Some(tracer);
        self
    }
}

/// The HTTP gateway.
pub struct GatewayServer;

impl GatewayServer {
    pub fn build(state: AppState) -> Router {
        let body_limit = state.loader.config().max_file_size_bytes() + MULTIPART_OVERHEAD_BYTES;

        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/api/process-document", post(process_document_handler))
            .route("/api/score-agent", post(score_agent_handler))
            .route("/api/metrics", get(metrics_handler))
            .layer(DefaultBodyLimit::max(body_limit as usize))
            .with_state(Arc::new(state))
    }
}

async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({"message": "ContentLens API is running"}))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "contentlens"}))
}

struct Upload {
    file_name: String,
    bytes: Bytes,
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

async fn process_document_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<WorkflowState>, ApiError> {
    let mut upload = None;
    let mut user_request = DEFAULT_USER_REQUEST.to_string();
    let mut options = WorkflowOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                upload = Some(Upload { file_name, bytes });
            }
            "user_request" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                if !text.trim().is_empty() {
                    user_request = text;
                }
            }
            "extract_only" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                options.extract_only = parse_flag(&text);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("Missing file upload".to_string()))?;
    info!(
        file = %upload.file_name,
        request = %user_request,
        extract_only = options.extract_only,
        "Document received"
    );

    // The loader validates by extension, so the temp file keeps the upload's.
    let suffix = Path::new(&upload.file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let temp = tempfile::Builder::new()
        .prefix("contentlens-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tokio::fs::write(temp.path(), &upload.bytes)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let document = prepare_document(&state.loader, temp.path())
        .await
        .map_err(|e| {
            error!(file = %upload.file_name, error = %e, "Document ingestion failed");
            ApiError::from(e)
        })?;
    drop(temp);

    let initial = WorkflowState::new(document.text, user_request, document.source_lang);
    let result = state.workflow.run(initial, options).await.map_err(|failure| {
        error!(trace_id = %failure.trace_id, error = %failure.error, "Workflow failed");
        ApiError::Internal(failure.error)
    })?;

    Ok(Json(result))
}

/// Body of `POST /api/score-agent`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    pub trace_id: String,
    pub agent_name: String,
    pub score: f64,
    #[serde(default)]
    pub comment: Option<String>,
}

async fn score_agent_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tracer = state
        .tracer
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Langfuse not configured".to_string()))?;

    let exists = tracer.trace_exists(&request.trace_id).await.map_err(|e| {
        error!(trace_id = %request.trace_id, error = %e, "Trace lookup failed");
        ApiError::Internal(e.to_string())
    })?;
    if !exists {
        return Err(ApiError::NotFound("Trace not found".to_string()));
    }

    tracer
        .create_score(ManualScore {
            trace_id: request.trace_id.clone(),
            agent_name: request.agent_name.clone(),
            value: request.score,
            comment: request.comment,
        })
        .await
        .map_err(|e| {
            error!(trace_id = %request.trace_id, error = %e, "Scoring failed");
            ApiError::Internal(e.to_string())
        })?;

    info!(
        agent = %request.agent_name,
        score = request.score,
        trace_id = %request.trace_id,
        "Agent scored"
    );
    Ok(Json(serde_json::json!({
        "status": "score recorded",
        "trace_id": request.trace_id,
    })))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.workflow.monitor().to_json().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use contentlens_core::{ContentLensResult, Extractor};
    use contentlens_ingest::IngestConfig;
    use contentlens_orchestrator::AgentRegistry;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct StubExtractor;

    #[async_trait]
    impl Extractor for StubExtractor {
        async fn extract(&self, _raw_text: &str) -> ContentLensResult<serde_json::Value> {
            Ok(serde_json::json!({"Brand": "Acme"}))
        }
    }

    #[derive(Default)]
    struct StubTracer {
        known: Vec<String>,
        scores: Mutex<Vec<ManualScore>>,
    }

    #[async_trait]
    impl TraceBackend for StubTracer {
        async fn trace_exists(&self, trace_id: &str) -> ContentLensResult<bool> {
            Ok(self.known.iter().any(|t| t == trace_id))
        }

        async fn create_score(&self, score: ManualScore) -> ContentLensResult<()> {
            self.scores.lock().unwrap().push(score);
            Ok(())
        }
    }

    fn app_state() -> AppState {
        let workflow = Workflow::builder(Arc::new(StubExtractor), Arc::new(AgentRegistry::new())).build();
        AppState::new(
            Arc::new(workflow),
            Arc::new(FileLoader::new(IngestConfig::default())),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn score_request(body: serde_json::Value) -> Request<Body> {
        Request::post("/api/score-agent")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("False"));
        assert!(!parse_flag(""));
    }

    #[tokio::test]
    async fn test_health() {
        let app = GatewayServer::build(app_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "contentlens");
    }

    #[tokio::test]
    async fn test_root() {
        let app = GatewayServer::build(app_state());
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "ContentLens API is running");
    }

    #[tokio::test]
    async fn test_metrics_lists_capabilities() {
        let app = GatewayServer::build(app_state());
        let response = app
            .oneshot(Request::get("/api/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["aggregate"]["invocations"], 0);
        assert!(body["capabilities"]["summarize"].is_object());
    }

    #[tokio::test]
    async fn test_score_without_tracer_is_unavailable() {
        let app = GatewayServer::build(app_state());
        let response = app
            .oneshot(score_request(serde_json::json!({
                "trace_id": "t-1", "agent_name": "analysis", "score": 4.0
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["detail"], "Langfuse not configured");
    }

    #[tokio::test]
    async fn test_score_unknown_trace() {
        let tracer = Arc::new(StubTracer::default());
        let app = GatewayServer::build(app_state().with_tracer(tracer.clone()));
        let response = app
            .oneshot(score_request(serde_json::json!({
                "trace_id": "missing", "agent_name": "analysis", "score": 4.0
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["detail"], "Trace not found");
        assert!(tracer.scores.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_score_recorded() {
        let tracer = Arc::new(StubTracer {
            known: vec!["t-1".to_string()],
            ..StubTracer::default()
        });
        let app = GatewayServer::build(app_state().with_tracer(tracer.clone()));
        let response = app
            .oneshot(score_request(serde_json::json!({
                "trace_id": "t-1", "agent_name": "ideation", "score": 9.5, "comment": "Great"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "score recorded");
        assert_eq!(body["trace_id"], "t-1");

        let scores = tracer.scores.lock().unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].agent_name, "ideation");
        assert_eq!(scores[0].comment.as_deref(), Some("Great"));
    }

    #[tokio::test]
    async fn test_process_without_file_is_bad_request() {
        let app = GatewayServer::build(app_state());
        let body = "--XBOUNDARY\r\n\
                    Content-Disposition: form-data; name=\"user_request\"\r\n\r\n\
                    Summarize\r\n\
                    --XBOUNDARY--\r\n";
        let request = Request::post("/api/process-document")
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "Missing file upload");
    }
}
