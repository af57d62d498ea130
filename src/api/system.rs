//! Service health probes. All three endpoints are unauthenticated so
//! orchestrators can poll them without credentials.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DbHealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// `GET /health`
///
/// Liveness probe with service metadata.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /ready`
///
/// Readiness probe; the process answers as soon as the router is up.
pub async fn ready() -> impl IntoResponse {
    Json(ApiResponse::success(ReadyResponse { status: "READY" }))
}

/// `GET /health-db`
///
/// Database connectivity probe. 503 when the store cannot answer a
/// trivial query.
pub async fn health_db(State(state): State<Arc<AppState>>) -> Response {
    match state.store().ping().await {
        Ok(()) => Json(ApiResponse::success(DbHealthResponse {
            status: "healthy",
            database: "connected",
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::<()>::error("Database unavailable")),
            )
                .into_response()
        }
    }
}
