//! HTTP API over the crawl service
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | GET | `/` | greeting |
//! | POST | `/crawl?url=..&max_pages=N` | queued job id |
//! | GET | `/status/:job_id` | job snapshot |
//! | POST | `/cancel/:job_id` | job snapshot after the cancel request |
//! | GET | `/get-output/:job_id` | corpus array |
//! | POST | `/filtered-output/:job_id` | filtered corpus |
//! | DELETE | `/jobs/:job_id` | purge from the registry |

mod routes;

use crate::service::CrawlService;
use crate::CrawlError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the API router
pub fn router(service: Arc<CrawlService>) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/crawl", post(routes::start_crawl))
        .route("/status/:job_id", get(routes::status))
        .route("/cancel/:job_id", post(routes::cancel))
        .route("/get-output/:job_id", get(routes::get_output))
        .route("/filtered-output/:job_id", post(routes::filtered_output))
        .route("/jobs/:job_id", delete(routes::purge))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Error returned by handlers, rendered as `{"detail": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<CrawlError> for ApiError {
    fn from(error: CrawlError) -> Self {
        let status = match &error {
            CrawlError::JobNotFound(_) | CrawlError::OutputNotFound(_) => StatusCode::NOT_FOUND,
            CrawlError::OutputNotReady(_) => StatusCode::CONFLICT,
            CrawlError::InvalidRequest(_) | CrawlError::Url(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", error);
        }

        Self {
            status,
            detail: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
