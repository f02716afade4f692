use axum::routing::get;
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::rate_limit::RateLimiter;
use crate::services::weather::WeatherService;

pub mod cities;
pub mod health;
pub mod limiter;
pub mod weather;

/// Shared application state, alive for the whole process.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) weather: Arc<WeatherService>,
    pub(crate) rate_limiter: Arc<RateLimiter>,
    pub(crate) trust_forwarded_for: bool,
}

/// Build the API router.
///
/// Weather, forecast and cities routes sit behind the per-client rate
/// limiter; the health check does not.
pub(crate) fn api_router(state: AppState) -> Router {
    let limited_routes = Router::new()
        .route("/api/weather", get(weather::get_current_weather))
        .route("/api/forecast", get(weather::get_forecast))
        .route("/api/cities", get(cities::get_default_cities))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            limiter::rate_limit,
        ))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .with_state(state);

    // Read-only API, restrict methods to GET
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    Router::new()
        .merge(health_routes)
        .merge(limited_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
