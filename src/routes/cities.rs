use axum::extract::State;
use axum::Json;

use crate::models::CityWeather;
use crate::routes::AppState;

/// Current weather for the built-in list of default cities.
///
/// Always returns 200. Cities that could not be fetched appear as
/// `{city, error}` entries in place of their weather.
#[utoipa::path(
    get,
    path = "/api/cities",
    tag = "Weather",
    responses(
        (status = 200, description = "Weather (or error) per default city", body = Vec<CityWeather>),
        (status = 429, description = "Client rate limit exceeded", body = crate::errors::ErrorResponse),
    )
)]
pub(crate) async fn get_default_cities(State(state): State<AppState>) -> Json<Vec<CityWeather>> {
    Json(state.weather.default_cities().await)
}
