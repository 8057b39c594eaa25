//! # Operational Endpoints
//!
//! Kubernetes probes and Prometheus exposition. These routes are mounted
//! outside the API group, so the bearer gate does not apply to them.
//!
//! They do pass through the rate limiter and draw from the caller's bucket.
//! A kubelet probing from one node address shares that bucket with any other
//! traffic from the same address; at the default 5 tokens/s a probe period
//! of a few seconds stays well clear of it.
//!
//! - GET /health/liveness: process is up
//! - GET /health/readiness: Postgres and Redis (when configured) answer
//! - GET /metrics: Prometheus text format

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(metrics))
}

#[utoipa::path(
    get,
    path = "/health/liveness",
    responses((status = 200, description = "Process is alive", body = String)),
    tag = "health"
)]
async fn liveness() -> &'static str {
    "ok"
}

#[utoipa::path(
    get,
    path = "/health/readiness",
    responses(
        (status = 200, description = "All configured dependencies answer", body = String),
        (status = 503, description = "A dependency is unreachable", body = ErrorBody),
    ),
    tag = "health"
)]
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if let Some(pool) = &state.db {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("database: {e}")))?;
    }
    if let Some(cache) = &state.cache {
        cache
            .ping()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("cache: {e}")))?;
    }
    Ok("ready")
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
