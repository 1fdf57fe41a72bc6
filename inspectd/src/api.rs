//! HTTP API for the inspect daemon.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Running an event synchronously
//! - Queueing an event as a background job
//! - Job status
//! - Stored metric runs

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use inspect_domain::{ActionResult, ArtifactId, CorrelationId, Event};
use inspect_exec::ActionError;
use inspect_store::{MetricRunRepository, StoredMetricRun};

use crate::error::DaemonError;
use crate::job_runner::{JobRunner, JobStatus};

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState<R: MetricRunRepository + 'static> {
    pub runner: Arc<JobRunner>,
    pub repository: Arc<R>,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response after queueing a job.
#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub id: CorrelationId,
    pub status: String,
}

/// Job status response.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub id: CorrelationId,
    #[serde(flatten)]
    pub status: JobStatus,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router<R>(state: Arc<ApiState<R>>) -> Router
where
    R: MetricRunRepository + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/actions/:id", post(run_action_handler))
        .route("/jobs/:id", post(submit_job_handler))
        .route("/jobs/:id", get(job_status_handler))
        .route("/metric-runs/:id", get(metric_run_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Run an event to completion and return its envelope.
///
/// Refused once the runner has shut down, like queued jobs.
async fn run_action_handler<R>(
    State(state): State<Arc<ApiState<R>>>,
    Path(id): Path<String>,
    payload: Result<Json<Event>, JsonRejection>,
) -> Result<Json<ActionResult>, ApiError>
where
    R: MetricRunRepository + 'static,
{
    let event = parse_event(payload)?;
    if state.runner.is_shutdown() {
        return Err(to_error_response(DaemonError::Shutdown));
    }

    let id = CorrelationId::new(id);
    let result = state
        .runner
        .registry()
        .dispatch(&event, &id)
        .await
        .map_err(|e| to_error_response(e.into()))?;

    Ok(Json(result))
}

/// Queue an event as a background job.
async fn submit_job_handler<R>(
    State(state): State<Arc<ApiState<R>>>,
    Path(id): Path<String>,
    payload: Result<Json<Event>, JsonRejection>,
) -> Result<(StatusCode, Json<JobAccepted>), ApiError>
where
    R: MetricRunRepository + 'static,
{
    let event = parse_event(payload)?;
    let id = CorrelationId::new(id);
    state
        .runner
        .submit(id.clone(), event)
        .await
        .map_err(to_error_response)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            id,
            status: "queued".to_string(),
        }),
    ))
}

/// Get the status of a job.
async fn job_status_handler<R>(
    State(state): State<Arc<ApiState<R>>>,
    Path(id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError>
where
    R: MetricRunRepository + 'static,
{
    let id = CorrelationId::new(id);
    let status = state.runner.status(&id).await.map_err(to_error_response)?;

    Ok(Json(JobStatusResponse { id, status }))
}

/// Get a stored metric run.
async fn metric_run_handler<R>(
    State(state): State<Arc<ApiState<R>>>,
    Path(id): Path<String>,
) -> Result<Json<StoredMetricRun>, ApiError>
where
    R: MetricRunRepository + 'static,
{
    let id = ArtifactId::new(id);
    let stored = state
        .repository
        .find_by_id(&id)
        .await
        .map_err(|e| to_error_response(e.into()))?
        .ok_or_else(|| to_error_response(DaemonError::MetricRunNotFound(id)))?;

    Ok(Json(stored))
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_event(payload: Result<Json<Event>, JsonRejection>) -> Result<Event, ApiError> {
    payload
        .map(|Json(event)| event)
        .map_err(|rejection| to_error_response(DaemonError::InvalidEvent(rejection.body_text())))
}

fn to_error_response(error: DaemonError) -> ApiError {
    let status = match &error {
        DaemonError::Action(action_error) => match action_error {
            ActionError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ActionError::UnknownEvent(_) | ActionError::UnexpectedEvent { .. } => {
                StatusCode::BAD_REQUEST
            },
            ActionError::ResourceResolution(_) => StatusCode::BAD_GATEWAY,
            ActionError::Computation(_) | ActionError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        },
        DaemonError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
        DaemonError::JobNotFound(_) | DaemonError::MetricRunNotFound(_) => StatusCode::NOT_FOUND,
        DaemonError::DuplicateJob(_) => StatusCode::CONFLICT,
        DaemonError::Shutdown => StatusCode::SERVICE_UNAVAILABLE,
        DaemonError::Store(_) | DaemonError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            error_type: error.kind().to_string(),
        }),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use inspect_exec::{
        ActionRegistry, ColumnDescriptiveMetricsAction, InspectorError, StubBatchInspector,
        StubDataContext,
    };
    use inspect_store::MemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::event_bus::EventBus;

    struct TestApp {
        router: Router,
        context: Arc<StubDataContext>,
        inspector: Arc<StubBatchInspector>,
        store: Arc<MemoryStore>,
        runner: Arc<JobRunner>,
    }

    fn create_test_app() -> TestApp {
        let context = Arc::new(StubDataContext::new());
        context.add_asset("sales_db", "orders", "orders-uuid");
        context.add_batch("sales_db", "orders", "2024-06-01");
        let inspector = Arc::new(StubBatchInspector::new(&["id", "amount"], dec!(120)));
        let store = Arc::new(MemoryStore::new());

        let action =
            ColumnDescriptiveMetricsAction::new(context.clone(), inspector.clone(), store.clone());
        let registry = Arc::new(ActionRegistry::new().register(Arc::new(action)));
        let runner = Arc::new(JobRunner::new(
            registry,
            Arc::new(EventBus::new(100)),
            2,
            CancellationToken::new(),
        ));

        let state = Arc::new(ApiState {
            runner: runner.clone(),
            repository: store.clone(),
        });

        TestApp {
            router: create_router(state),
            context,
            inspector,
            store,
            runner,
        }
    }

    fn metrics_event(datasource: &str) -> Value {
        json!({
            "type": "RunColumnDescriptiveMetricsEvent",
            "datasource_name": datasource,
            "data_asset_name": "orders",
        })
    }

    fn post(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let (status, body) = send(&app.router, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_run_action_returns_envelope() {
        let app = create_test_app();

        let (status, body) =
            send(&app.router, post("/actions/req-123", &metrics_event("sales_db"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "req-123");
        assert_eq!(body["type"], "RunColumnDescriptiveMetricsEvent");
        assert_eq!(body["created_resources"][0]["type"], "MetricRun");
        assert_eq!(app.store.metric_run_count(), 1);

        // The artifact is retrievable under the reported id
        let resource_id = body["created_resources"][0]["resource_id"].as_str().unwrap();
        let (status, stored) =
            send(&app.router, get(&format!("/metric-runs/{}", resource_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["run"]["data_asset_id"], "orders-uuid");
    }

    #[tokio::test]
    async fn test_run_action_missing_datasource() {
        let app = create_test_app();

        let (status, body) =
            send(&app.router, post("/actions/req-1", &metrics_event("missing_db"))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "ResourceNotFound");
        assert!(body["error"].as_str().unwrap().contains("missing_db"));
        assert_eq!(app.inspector.call_count(), 0);
        assert_eq!(app.store.metric_run_count(), 0);
    }

    #[tokio::test]
    async fn test_run_action_unknown_event() {
        let app = create_test_app();

        let (status, body) =
            send(&app.router, post("/actions/req-1", &json!({ "type": "SomethingElse" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "UnknownEvent");
        assert!(body["error"].as_str().unwrap().contains("SomethingElse"));
    }

    #[tokio::test]
    async fn test_run_action_invalid_payload_is_json_error() {
        let app = create_test_app();

        let (status, body) = send(&app.router, post("/actions/req-1", &metrics_event(""))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "InvalidEvent");
        assert!(body["error"].as_str().unwrap().contains("must not be empty"));

        let missing_asset = json!({
            "type": "RunColumnDescriptiveMetricsEvent",
            "datasource_name": "sales_db",
        });
        let (status, body) = send(&app.router, post("/actions/req-1", &missing_asset)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "InvalidEvent");
        assert!(body["error"].as_str().unwrap().contains("data_asset_name"));

        assert_eq!(app.inspector.call_count(), 0);
        assert_eq!(app.store.metric_run_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_job_invalid_payload_is_json_error() {
        let app = create_test_app();

        let request = Request::builder()
            .method("POST")
            .uri("/jobs/job-1")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "InvalidEvent");
        assert!(matches!(
            app.runner.status(&"job-1".into()).await,
            Err(DaemonError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_run_action_after_shutdown() {
        let app = create_test_app();
        app.runner.shutdown();

        let (status, body) =
            send(&app.router, post("/actions/req-1", &metrics_event("sales_db"))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error_type"], "Shutdown");
        assert_eq!(app.inspector.call_count(), 0);
        assert_eq!(app.store.metric_run_count(), 0);
    }

    #[tokio::test]
    async fn test_run_action_resolution_failure() {
        let app = create_test_app();
        app.context.set_fail_next_build(true);

        let (status, body) =
            send(&app.router, post("/actions/req-1", &metrics_event("sales_db"))).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error_type"], "ResourceResolutionError");
    }

    #[tokio::test]
    async fn test_run_action_computation_failure() {
        let app = create_test_app();
        app.inspector
            .set_fail_next(Some(InspectorError::Timeout("query timed out".to_string())));

        let (status, body) =
            send(&app.router, post("/actions/req-1", &metrics_event("sales_db"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error_type"], "ComputationError");
        assert_eq!(app.store.metric_run_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_job_and_poll() {
        let app = create_test_app();

        let (status, body) =
            send(&app.router, post("/jobs/job-1", &metrics_event("sales_db"))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["status"], "queued");

        // Poll until the job settles
        let mut body = Value::Null;
        for _ in 0..100 {
            let (status, polled) = send(&app.router, get("/jobs/job-1")).await;
            assert_eq!(status, StatusCode::OK);
            if polled["status"] == "completed" || polled["status"] == "failed" {
                body = polled;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(body["status"], "completed");
        assert_eq!(body["id"], "job-1");
        assert_eq!(body["result"]["created_resources"][0]["type"], "MetricRun");
        assert_eq!(app.runner.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_submit_duplicate_job() {
        let app = create_test_app();

        let (first, _) = send(&app.router, post("/jobs/job-1", &metrics_event("sales_db"))).await;
        let (second, body) =
            send(&app.router, post("/jobs/job-1", &metrics_event("sales_db"))).await;

        assert_eq!(first, StatusCode::ACCEPTED);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(body["error_type"], "DuplicateJob");
    }

    #[tokio::test]
    async fn test_unknown_job_not_found() {
        let app = create_test_app();

        let (status, body) = send(&app.router, get("/jobs/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "JobNotFound");
    }

    #[tokio::test]
    async fn test_unknown_metric_run_not_found() {
        let app = create_test_app();

        let (status, body) = send(&app.router, get("/metric-runs/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "MetricRunNotFound");
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_unavailable() {
        let app = create_test_app();
        app.runner.shutdown();

        let (status, body) =
            send(&app.router, post("/jobs/job-1", &metrics_event("sales_db"))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error_type"], "Shutdown");
    }
}
