//! OpenWeatherMap client for current conditions and 5-day/3-hour forecasts.
//!
//! See: https://openweathermap.org/current and https://openweathermap.org/forecast5
//!
//! Each call is a single GET with a bounded timeout. Failures come back as
//! typed [`WeatherError`]s; nothing is retried here.

use serde::Deserialize;
use std::time::Duration;

use crate::config::{is_usable_api_key, UPSTREAM_TIMEOUT_SECS};
use crate::errors::WeatherError;
use crate::helpers::title_case;
use crate::services::aggregate::ForecastPoint;
use crate::services::query::LocationQuery;

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
/// Longest slice of an error body echoed back in `WeatherError::Upstream`.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Client for the OpenWeatherMap API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    units: String,
    timeout: Duration,
}

/// Current conditions as reported by the provider, before scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentConditions {
    pub city: Option<String>,
    pub country: Option<String>,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
    pub visibility_m: Option<f64>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub timezone: Option<i64>,
    pub rain_amount: Option<f64>,
    /// Provider condition codes (e.g. 500 = light rain, 781 = tornado)
    pub condition_ids: Vec<u32>,
}

/// Raw 3-hourly forecast for one location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawForecast {
    pub city: Option<String>,
    pub country: Option<String>,
    /// Location's offset from UTC in seconds
    pub utc_offset_secs: Option<i64>,
    pub points: Vec<ForecastPoint>,
}

// --- OpenWeatherMap JSON response types ---

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    name: Option<String>,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    wind: Option<OwmWind>,
    visibility: Option<f64>,
    sys: Option<OwmSys>,
    timezone: Option<i64>,
    rain: Option<OwmRain>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    id: Option<u32>,
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwmRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
    city: Option<OwmCity>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    wind: Option<OwmWind>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    name: Option<String>,
    country: Option<String>,
    timezone: Option<i64>,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: &str, units: &str) -> Result<Self, WeatherError> {
        Self::with_timeout(
            base_url,
            api_key,
            units,
            Duration::from_secs(UPSTREAM_TIMEOUT_SECS),
        )
    }

    pub(crate) fn with_timeout(
        base_url: &str,
        api_key: &str,
        units: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            units: units.to_string(),
            timeout,
        })
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    /// Fetch current conditions for a location.
    pub async fn fetch_current(
        &self,
        query: &LocationQuery,
    ) -> Result<CurrentConditions, WeatherError> {
        let body = self.get(CURRENT_PATH, query).await?;
        let parsed: OwmCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;
        Ok(parse_current(parsed))
    }

    /// Fetch the 3-hourly forecast for a location.
    pub async fn fetch_forecast(&self, query: &LocationQuery) -> Result<RawForecast, WeatherError> {
        let body = self.get(FORECAST_PATH, query).await?;
        let parsed: OwmForecastResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;
        Ok(parse_forecast(parsed))
    }

    /// Issue the GET and return the body of a 2xx response.
    async fn get(&self, path: &str, query: &LocationQuery) -> Result<String, WeatherError> {
        if !is_usable_api_key(&self.api_key) {
            return Err(WeatherError::Config(
                "Weather API key not configured. Set WEATHER_API_KEY.".to_string(),
            ));
        }

        let mut params = query.provider_params();
        params.push(("appid", self.api_key.clone()));
        params.push(("units", self.units.clone()));

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        match status.as_u16() {
            401 => return Err(WeatherError::Auth),
            404 => return Err(WeatherError::NotFound(query.provider_q())),
            429 => return Err(WeatherError::UpstreamRateLimit),
            _ => {}
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            tracing::warn!("Weather provider returned HTTP {} for {}", status, path);
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(body)
    }

    fn transport_error(&self, err: reqwest::Error) -> WeatherError {
        if err.is_timeout() {
            WeatherError::Timeout(self.timeout)
        } else {
            WeatherError::Connection(err.to_string())
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn parse_current(resp: OwmCurrentResponse) -> CurrentConditions {
    let primary = resp.weather.first();
    let sys = resp.sys.as_ref();

    CurrentConditions {
        city: non_empty(resp.name),
        country: non_empty(sys.and_then(|s| s.country.clone())),
        temperature: resp.main.temp,
        feels_like: resp.main.feels_like,
        description: primary
            .and_then(|w| w.description.as_deref())
            .map(title_case),
        icon: primary.and_then(|w| w.icon.clone()),
        humidity: resp.main.humidity,
        wind_speed: resp.wind.and_then(|w| w.speed),
        pressure: resp.main.pressure,
        visibility_m: resp.visibility,
        sunrise: sys.and_then(|s| s.sunrise),
        sunset: sys.and_then(|s| s.sunset),
        timezone: resp.timezone,
        rain_amount: resp.rain.and_then(|r| r.one_hour.or(r.three_hours)),
        condition_ids: resp.weather.iter().filter_map(|w| w.id).collect(),
    }
}

fn parse_forecast(resp: OwmForecastResponse) -> RawForecast {
    let points = resp
        .list
        .into_iter()
        .map(|item| {
            let primary = item.weather.first();
            ForecastPoint {
                timestamp: item.dt,
                temperature: item.main.as_ref().and_then(|m| m.temp),
                humidity: item.main.as_ref().and_then(|m| m.humidity),
                wind_speed: item.wind.and_then(|w| w.speed),
                description: primary
                    .and_then(|w| w.description.as_deref())
                    .map(title_case),
                icon: primary.and_then(|w| w.icon.clone()),
                pop: item.pop,
            }
        })
        .collect();

    let (city, country, utc_offset_secs) = match resp.city {
        Some(c) => (non_empty(c.name), non_empty(c.country), c.timezone),
        None => (None, None, None),
    };

    RawForecast {
        city,
        country,
        utc_offset_secs,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef";

    fn client(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::new(&server.uri(), TEST_KEY, "imperial").unwrap()
    }

    fn fremont() -> LocationQuery {
        LocationQuery::place("Fremont", Some("CA"), Some("US")).unwrap()
    }

    fn current_json() -> serde_json::Value {
        serde_json::json!({
            "coord": { "lon": -121.98, "lat": 37.55 },
            "weather": [
                { "id": 501, "main": "Rain", "description": "moderate rain", "icon": "10d" }
            ],
            "main": {
                "temp": 61.6,
                "feels_like": 60.8,
                "pressure": 1012,
                "humidity": 82
            },
            "visibility": 8000,
            "wind": { "speed": 12.66, "deg": 200 },
            "rain": { "1h": 2.5 },
            "sys": { "country": "US", "sunrise": 1772374800, "sunset": 1772416200 },
            "timezone": -28800,
            "name": "Fremont",
            "cod": 200
        })
    }

    #[tokio::test]
    async fn test_fetch_current_parses_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Fremont,CA,US"))
            .and(query_param("appid", TEST_KEY))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_json()))
            .expect(1)
            .mount(&server)
            .await;

        let current = client(&server).fetch_current(&fremont()).await.unwrap();
        assert_eq!(current.city.as_deref(), Some("Fremont"));
        assert_eq!(current.country.as_deref(), Some("US"));
        assert_eq!(current.temperature, Some(61.6));
        assert_eq!(current.description.as_deref(), Some("Moderate Rain"));
        assert_eq!(current.icon.as_deref(), Some("10d"));
        assert_eq!(current.humidity, Some(82.0));
        assert_eq!(current.visibility_m, Some(8000.0));
        assert_eq!(current.rain_amount, Some(2.5));
        assert_eq!(current.timezone, Some(-28800));
        assert_eq!(current.condition_ids, vec![501]);
    }

    #[tokio::test]
    async fn test_fetch_current_by_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "37.5500"))
            .and(query_param("lon", "-121.9800"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_json()))
            .expect(1)
            .mount(&server)
            .await;

        let q = LocationQuery::coordinates(37.55, -121.98).unwrap();
        assert!(client(&server).fetch_current(&q).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_fields_degrade_to_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "main": { "temp": 50.0 },
                "name": ""
            })))
            .mount(&server)
            .await;

        let current = client(&server).fetch_current(&fremont()).await.unwrap();
        assert_eq!(current.temperature, Some(50.0));
        assert_eq!(current.city, None);
        assert_eq!(current.humidity, None);
        assert_eq!(current.visibility_m, None);
        assert_eq!(current.wind_speed, None);
        assert_eq!(current.description, None);
        assert!(current.condition_ids.is_empty());
    }

    #[tokio::test]
    async fn test_missing_main_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "Fremont" })),
            )
            .mount(&server)
            .await;

        let err = client(&server).fetch_current(&fremont()).await.unwrap_err();
        assert!(matches!(err, WeatherError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).fetch_forecast(&fremont()).await.unwrap_err();
        assert!(matches!(err, WeatherError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_status_codes_map_to_typed_errors() {
        let cases = [
            (401, WeatherError::Auth),
            (404, WeatherError::NotFound("Fremont,CA,US".to_string())),
            (429, WeatherError::UpstreamRateLimit),
        ];
        for (status, expected) in cases {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let err = client(&server).fetch_current(&fremont()).await.unwrap_err();
            assert_eq!(err, expected, "HTTP {}", status);
        }
    }

    #[tokio::test]
    async fn test_other_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server).fetch_current(&fremont()).await.unwrap_err();
        assert_eq!(
            err,
            WeatherError::Upstream {
                status: 503,
                body: "maintenance".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_json()))
            .expect(0)
            .mount(&server)
            .await;

        for key in ["", "your_api_key_here"] {
            let client = OpenWeatherClient::new(&server.uri(), key, "imperial").unwrap();
            let err = client.fetch_current(&fremont()).await.unwrap_err();
            assert!(matches!(err, WeatherError::Config(_)));
        }
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_json())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_timeout(
            &server.uri(),
            TEST_KEY,
            "imperial",
            Duration::from_millis(100),
        )
        .unwrap();
        let err = client.fetch_current(&fremont()).await.unwrap_err();
        assert_eq!(err, WeatherError::Timeout(Duration::from_millis(100)));
        assert!(err.to_string().ends_with("within 100ms"));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_connection_error() {
        // Port 1 is reserved and nothing listens there
        let client = OpenWeatherClient::new("http://127.0.0.1:1", TEST_KEY, "imperial").unwrap();
        let err = client.fetch_current(&fremont()).await.unwrap_err();
        assert!(matches!(err, WeatherError::Connection(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_forecast_parses_points() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": "200",
                "list": [
                    {
                        "dt": 1772323200,
                        "main": { "temp": 55.2, "humidity": 70 },
                        "weather": [{ "id": 800, "description": "clear sky", "icon": "01n" }],
                        "wind": { "speed": 4.1 },
                        "pop": 0.1
                    },
                    { "dt": 1772334000 }
                ],
                "city": { "name": "Tokyo", "country": "JP", "timezone": 32400 }
            })))
            .mount(&server)
            .await;

        let forecast = client(&server).fetch_forecast(&fremont()).await.unwrap();
        assert_eq!(forecast.city.as_deref(), Some("Tokyo"));
        assert_eq!(forecast.utc_offset_secs, Some(32400));
        assert_eq!(forecast.points.len(), 2);
        assert_eq!(forecast.points[0].temperature, Some(55.2));
        assert_eq!(forecast.points[0].description.as_deref(), Some("Clear Sky"));
        assert_eq!(forecast.points[0].pop, Some(0.1));
        assert_eq!(forecast.points[1].temperature, None);
    }

    #[tokio::test]
    async fn test_forecast_without_list_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": { "name": "Tokyo" }
            })))
            .mount(&server)
            .await;

        let err = client(&server).fetch_forecast(&fremont()).await.unwrap_err();
        assert!(matches!(err, WeatherError::MalformedResponse(_)));
    }
}
