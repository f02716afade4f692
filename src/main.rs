// Weather Proxy API v0.1
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::{AppConfig, UNITS};
use routes::AppState;
use services::clock::{Clock, SystemClock};
use services::openweather::OpenWeatherClient;
use services::rate_limit::RateLimiter;
use services::weather::WeatherService;

/// Weather Proxy API OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Proxy API",
        version = "0.1.0",
        description = "Front end for a third-party weather provider. \
            Normalizes current conditions with a hazard severity score, \
            summarises 3-hourly forecasts into daily figures, caches results \
            in memory and rate limits each client.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Current conditions and forecasts"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::get_current_weather,
        routes::weather::get_forecast,
        routes::cities::get_default_cities,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            models::CurrentWeather,
            models::DailyForecastSummary,
            models::ForecastResult,
            models::CityWeather,
            models::SeverityLevel,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_proxy_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    config.log_api_key_warnings();

    let client = OpenWeatherClient::new(&config.api_url, &config.api_key, UNITS)?;
    let capacity = NonZeroUsize::new(config.cache_capacity)
        .ok_or_else(|| errors::WeatherError::Config("CACHE_CAPACITY must be at least 1".into()))?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let app_state = AppState {
        weather: Arc::new(WeatherService::new(
            client,
            capacity,
            config.cache_ttl_secs,
            clock.clone(),
        )),
        rate_limiter: Arc::new(RateLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window_secs,
            clock,
        )),
        trust_forwarded_for: config.trust_forwarded_for,
    };

    tracing::info!(
        "Cache: {} entries, TTL {}s; rate limit: {} requests per {}s",
        config.cache_capacity,
        config.cache_ttl_secs,
        config.rate_limit_max_requests,
        config.rate_limit_window_secs
    );
    if config.trust_forwarded_for {
        tracing::info!("Rate limiting clients by X-Forwarded-For");
    }

    let app = routes::api_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
