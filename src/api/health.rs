//! Health check endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub services: ServiceHealth,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub db: &'static str,
}

/// `GET /api/health`: 200 when the store answers, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> Response {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                services: ServiceHealth { db: "healthy" },
                timestamp: Utc::now(),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    services: ServiceHealth { db: "unhealthy" },
                    timestamp: Utc::now(),
                }),
            )
                .into_response()
        }
    }
}
