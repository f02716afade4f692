use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status, always "ok" while the process is serving
    pub status: String,
    /// API version
    pub version: String,
    /// Entries currently held in the result cache (stale ones included)
    pub cache_entries: usize,
    /// Distinct clients tracked by the rate limiter
    pub tracked_clients: usize,
}

/// Health check endpoint. Exempt from rate limiting.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub(crate) async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_entries: state.weather.cached_entries().await,
        tracked_clients: state.rate_limiter.tracked_clients().await,
    })
}
