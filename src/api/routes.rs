use crate::api::ApiError;
use crate::output::FilteredCorpus;
use crate::service::CrawlService;
use crate::state::{JobId, JobSnapshot, JobStatus, PageRecord};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

type AppState = State<Arc<CrawlService>>;

#[derive(Debug, Deserialize)]
pub struct CrawlParams {
    pub url: String,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CrawlAccepted {
    pub job_id: JobId,
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub urls: Vec<String>,
}

// Malformed ids are reported like unknown ones
fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    raw.parse().map_err(|_| ApiError {
        status: StatusCode::NOT_FOUND,
        detail: format!("Job not found: {}", raw),
    })
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello, world!" }))
}

pub async fn start_crawl(
    State(service): AppState,
    Query(params): Query<CrawlParams>,
) -> Result<Json<CrawlAccepted>, ApiError> {
    if params.url.trim().is_empty() {
        return Err(ApiError::bad_request("url must not be empty"));
    }

    let snapshot = service.submit(&params.url, params.max_pages)?;
    Ok(Json(CrawlAccepted {
        job_id: snapshot.job_id,
        status: snapshot.status,
    }))
}

pub async fn status(
    State(service): AppState,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let job_id = parse_job_id(&job_id)?;
    Ok(Json(service.status(job_id)?))
}

pub async fn cancel(
    State(service): AppState,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let job_id = parse_job_id(&job_id)?;
    Ok(Json(service.cancel(job_id)?))
}

pub async fn get_output(
    State(service): AppState,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<PageRecord>>, ApiError> {
    let job_id = parse_job_id(&job_id)?;
    Ok(Json(service.output(job_id)?))
}

pub async fn filtered_output(
    State(service): AppState,
    Path(job_id): Path<String>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<FilteredCorpus>, ApiError> {
    let job_id = parse_job_id(&job_id)?;
    Ok(Json(service.filtered_output(job_id, &request.urls)?))
}

pub async fn purge(
    State(service): AppState,
    Path(job_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let job_id = parse_job_id(&job_id)?;
    service.purge(job_id)?;
    Ok(StatusCode::NO_CONTENT)
}
