use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::error::SchedulerError;
use crate::scheduler::{parse_scheduled_time, Job, JobId, JobStatus, Scheduler, SortKey};

#[derive(Clone)]
pub struct ApiState {
    pub scheduler: Arc<Scheduler>,
}

#[derive(Deserialize)]
pub struct SubmitJobRequest {
    pub script: String,
}

#[derive(Deserialize, Default)]
struct SubmitParams {
    #[serde(default)]
    blocking: bool,
    scheduled_time: Option<String>,
}

#[derive(Deserialize, Default)]
struct ListParams {
    status: Option<String>,
    sort: Option<String>,
    #[serde(default)]
    ascending: bool,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct RemovedResponse {
    removed: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    jobs: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub status: u16,
    pub timestamp: DateTime<Utc>,
    pub causes: BTreeMap<String, String>,
}

/// Scheduler errors rendered as JSON responses.
pub struct ApiError(SchedulerError);

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            SchedulerError::Validation(_) | SchedulerError::MissingField { .. } => {
                StatusCode::BAD_REQUEST
            }
            SchedulerError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulerError::StateConflict { .. } => StatusCode::CONFLICT,
            SchedulerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut causes = BTreeMap::new();
        causes.insert(self.0.kind().to_string(), self.0.to_string());

        let body = ErrorResponse {
            status: status.as_u16(),
            timestamp: Utc::now(),
            causes,
        };
        (status, Json(body)).into_response()
    }
}

// Malformed ids, query strings and bodies are validation errors
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(SchedulerError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(SchedulerError::Validation(rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(SchedulerError::Validation(rejection.body_text()))
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Blank query values count as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/jobs",
            get(list_jobs_handler)
                .post(submit_job_handler)
                .delete(remove_finished_handler),
        )
        .route(
            "/api/jobs/:id",
            get(get_job_handler).delete(remove_job_handler),
        )
        .route("/api/jobs/:id/stop", post(stop_job_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn run_api(
    addr: SocketAddr,
    state: ApiState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = router(state);

    tracing::info!(addr = %addr, "Starting HTTP API");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn health_handler(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        jobs: state.scheduler.store().len(),
    })
}

async fn submit_job_handler(
    State(state): State<ApiState>,
    params: Result<Query<SubmitParams>, QueryRejection>,
    payload: Result<Json<SubmitJobRequest>, JsonRejection>,
) -> ApiResult<Job> {
    let Query(params) = params?;
    let Json(payload) = payload?;
    let scheduled_time = non_empty(params.scheduled_time)
        .map(|raw| parse_scheduled_time(&raw))
        .transpose()?;

    let job = state
        .scheduler
        .submit(payload.script, params.blocking, scheduled_time)
        .await?;
    Ok(Json(job))
}

async fn list_jobs_handler(
    State(state): State<ApiState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Vec<Job>> {
    let Query(params) = params?;
    let sort = match non_empty(params.sort) {
        Some(raw) => raw.parse::<SortKey>()?,
        None => SortKey::Id,
    };
    let jobs = match non_empty(params.status) {
        Some(raw) => {
            let status = raw.parse::<JobStatus>()?;
            state
                .scheduler
                .list_by_status(status, sort, params.ascending)?
        }
        None => state.scheduler.list(sort, params.ascending)?,
    };
    Ok(Json(jobs))
}

async fn get_job_handler(
    State(state): State<ApiState>,
    id: Result<Path<JobId>, PathRejection>,
) -> ApiResult<Job> {
    let Path(id) = id?;
    Ok(Json(state.scheduler.get(id)?))
}

async fn stop_job_handler(
    State(state): State<ApiState>,
    id: Result<Path<JobId>, PathRejection>,
) -> ApiResult<MessageResponse> {
    let Path(id) = id?;
    state.scheduler.stop(id)?;
    Ok(Json(MessageResponse {
        message: format!("job {} has been stopped", id),
    }))
}

async fn remove_finished_handler(State(state): State<ApiState>) -> Json<RemovedResponse> {
    Json(RemovedResponse {
        removed: state.scheduler.remove_all_terminal(),
    })
}

async fn remove_job_handler(
    State(state): State<ApiState>,
    id: Result<Path<JobId>, PathRejection>,
) -> ApiResult<Job> {
    let Path(id) = id?;
    Ok(Json(state.scheduler.remove_by_id(id)?))
}
