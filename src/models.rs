//! Result payloads produced by the weather service.
//!
//! Every field the provider may omit is an `Option` and serializes as
//! `null` ("unknown"). Nothing is silently replaced with a plausible-looking
//! default.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

/// Three-level hazard classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum SeverityLevel {
    Low,
    Moderate,
    High,
}

/// Current conditions for one location, normalized from the provider payload.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CurrentWeather {
    /// Resolved location name (e.g. "Fremont")
    pub city: Option<String>,
    /// ISO country code reported by the provider
    pub country: Option<String>,
    /// Air temperature, °F
    pub temperature: Option<i64>,
    /// Apparent temperature, °F
    pub feels_like: Option<i64>,
    /// Title-cased condition text (e.g. "Light Rain")
    pub description: Option<String>,
    /// Provider icon code (e.g. "10d")
    pub icon: Option<String>,
    /// Relative humidity, %
    pub humidity: Option<f64>,
    /// Wind speed, mph
    pub wind_speed: Option<f64>,
    /// Sea-level pressure, hPa
    pub pressure: Option<f64>,
    /// Visibility, km
    pub visibility: Option<f64>,
    /// Sunrise, unix epoch seconds
    pub sunrise: Option<i64>,
    /// Sunset, unix epoch seconds
    pub sunset: Option<i64>,
    /// Offset from UTC, seconds
    pub timezone: Option<i64>,
    /// Rain volume over the last hour, mm
    pub rain_amount: Option<f64>,
    pub umbrella_needed: bool,
    pub thunderstorm: bool,
    pub tornado: bool,
    pub severity_index: SeverityLevel,
    /// Synthetic hazard score, 0–100
    pub severity_score: u8,
}

/// One calendar day reduced from 3-hourly forecast points.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyForecastSummary {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    /// English weekday name (e.g. "Monday")
    pub weekday: String,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_avg: Option<i64>,
    /// Most frequent condition text of the day
    pub description: Option<String>,
    /// Most frequent icon code of the day
    pub icon: Option<String>,
    pub humidity_avg: Option<i64>,
    pub wind_speed_avg: Option<f64>,
    /// Highest probability of precipitation across the day, 0–100;
    /// `null` when no point carried one
    pub precipitation_chance: Option<u8>,
}

/// Daily forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ForecastResult {
    pub city: Option<String>,
    pub country: Option<String>,
    /// Up to five days, ascending by date
    pub days: Vec<DailyForecastSummary>,
}

/// Entry in the default-cities listing: either a result or the reason it failed.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CityWeather {
    Ok(CurrentWeather),
    Failed { city: String, error: String },
}
