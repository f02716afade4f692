//! Weather HTTP endpoints.
//!
//! - GET /api/weather?city=&state=&country=  or  ?lat=&lon=
//! - GET /api/forecast (same parameters)

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{ErrorResponse, WeatherError};
use crate::models::{CurrentWeather, ForecastResult};
use crate::routes::AppState;
use crate::services::query::LocationQuery;

/// Location lookup parameters: either a place name or a coordinate pair.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LocationParams {
    /// City name (e.g. "New York")
    pub city: Option<String>,
    /// State or province (e.g. "NY")
    pub state: Option<String>,
    /// ISO 3166 country code (e.g. "US")
    pub country: Option<String>,
    /// Latitude, -90 to 90
    pub lat: Option<f64>,
    /// Longitude, -180 to 180
    pub lon: Option<f64>,
}

impl LocationParams {
    /// Validate the parameters into a location query.
    pub fn into_query(self) -> Result<LocationQuery, WeatherError> {
        let has_city = self.city.as_deref().is_some_and(|c| !c.trim().is_empty());

        match (self.lat, self.lon) {
            (Some(_), Some(_)) if has_city => Err(WeatherError::Validation(
                "Provide either a city or lat/lon, not both".to_string(),
            )),
            (Some(lat), Some(lon)) => LocationQuery::coordinates(lat, lon),
            (Some(_), None) | (None, Some(_)) => Err(WeatherError::Validation(
                "Both lat and lon are required for a coordinate lookup".to_string(),
            )),
            (None, None) => LocationQuery::place(
                self.city.as_deref().unwrap_or_default(),
                self.state.as_deref(),
                self.country.as_deref(),
            ),
        }
    }
}

/// Validate raw query parameters, reporting unparseable values as
/// validation errors rather than axum's plain-text rejection.
fn location_query(
    params: Result<Query<LocationParams>, QueryRejection>,
) -> Result<LocationQuery, WeatherError> {
    let Query(params) = params.map_err(|rejection| {
        WeatherError::Validation(format!("Invalid query parameters: {}", rejection.body_text()))
    })?;
    params.into_query()
}

/// Get current weather conditions with a severity assessment.
#[utoipa::path(
    get,
    path = "/api/weather",
    tag = "Weather",
    params(LocationParams),
    responses(
        (status = 200, description = "Current conditions", body = CurrentWeather),
        (status = 400, description = "Invalid location parameters", body = ErrorResponse),
        (status = 404, description = "Location not found", body = ErrorResponse),
        (status = 429, description = "Client rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Weather provider error", body = ErrorResponse),
        (status = 504, description = "Weather provider timed out", body = ErrorResponse),
    )
)]
pub(crate) async fn get_current_weather(
    State(state): State<AppState>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> Result<Json<CurrentWeather>, WeatherError> {
    let query = location_query(params)?;
    let weather = state.weather.current(&query).await?;
    Ok(Json(weather))
}

/// Get a daily forecast summary for up to five days.
#[utoipa::path(
    get,
    path = "/api/forecast",
    tag = "Weather",
    params(LocationParams),
    responses(
        (status = 200, description = "Daily forecast summaries", body = ForecastResult),
        (status = 400, description = "Invalid location parameters", body = ErrorResponse),
        (status = 404, description = "Location not found", body = ErrorResponse),
        (status = 429, description = "Client rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Weather provider error", body = ErrorResponse),
        (status = 504, description = "Weather provider timed out", body = ErrorResponse),
    )
)]
pub(crate) async fn get_forecast(
    State(state): State<AppState>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> Result<Json<ForecastResult>, WeatherError> {
    let query = location_query(params)?;
    let forecast = state.weather.forecast(&query).await?;
    Ok(Json(forecast))
}
