//! Weather query orchestration.
//!
//! Resolution per request:
//!   1. Build the normalized cache key and check the result cache
//!   2. On a miss, fetch from the provider (no cache lock held)
//!   3. Transform: severity scoring (current) or daily aggregation (forecast)
//!   4. Cache the transformed result and return it
//!
//! Provider failures are returned as-is and never cached.

use futures::future::join_all;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::errors::WeatherError;
use crate::helpers::{opt_round_1dp, opt_round_whole};
use crate::models::{CityWeather, CurrentWeather, ForecastResult};
use crate::services::aggregate::aggregate;
use crate::services::cache::TtlCache;
use crate::services::clock::Clock;
use crate::services::openweather::{CurrentConditions, OpenWeatherClient, RawForecast};
use crate::services::query::{CacheKey, LocationQuery, QueryKind};
use crate::services::severity::{score, SeverityInputs};

/// Cities shown on the landing page: (name, state, country).
pub const DEFAULT_CITIES: &[(&str, Option<&str>, &str)] = &[
    ("Fremont", Some("CA"), "US"),
    ("New York", Some("NY"), "US"),
    ("Los Angeles", Some("CA"), "US"),
    ("Chennai", Some("Tamil Nadu"), "IN"),
    ("Beijing", None, "CN"),
    ("Tokyo", None, "JP"),
    ("Budapest", None, "HU"),
    ("Phuket", None, "TH"),
    ("Dubai", None, "AE"),
];

const TORNADO_CONDITION: u32 = 781;

/// A transformed, cacheable result.
#[derive(Debug, Clone)]
pub enum CachedPayload {
    Current(CurrentWeather),
    Forecast(ForecastResult),
}

/// Composes the cache, provider client, scorer and aggregator.
///
/// Constructed once at startup and shared for the process lifetime.
pub struct WeatherService {
    cache: TtlCache<CacheKey, CachedPayload>,
    client: OpenWeatherClient,
}

impl WeatherService {
    pub fn new(
        client: OpenWeatherClient,
        cache_capacity: NonZeroUsize,
        cache_ttl_secs: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache: TtlCache::new(cache_capacity, cache_ttl_secs, clock),
            client,
        }
    }

    /// Current conditions with severity scoring.
    pub async fn current(&self, query: &LocationQuery) -> Result<CurrentWeather, WeatherError> {
        let key = CacheKey::new(QueryKind::Current, query, self.client.units());

        if let Some(CachedPayload::Current(hit)) = self.cache.get(&key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(hit);
        }
        tracing::debug!("Cache miss for {}, fetching from provider", key);

        let conditions = self.client.fetch_current(query).await?;
        let result = build_current_weather(conditions);

        self.cache
            .set(key, CachedPayload::Current(result.clone()))
            .await;
        Ok(result)
    }

    /// Daily forecast summaries (up to five days).
    pub async fn forecast(&self, query: &LocationQuery) -> Result<ForecastResult, WeatherError> {
        let key = CacheKey::new(QueryKind::Forecast, query, self.client.units());

        if let Some(CachedPayload::Forecast(hit)) = self.cache.get(&key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(hit);
        }
        tracing::debug!("Cache miss for {}, fetching from provider", key);

        let raw = self.client.fetch_forecast(query).await?;
        let result = build_forecast(raw);

        self.cache
            .set(key, CachedPayload::Forecast(result.clone()))
            .await;
        Ok(result)
    }

    /// Current conditions for every default city, fetched concurrently.
    ///
    /// A failing city is reported inline instead of failing the whole list.
    pub async fn default_cities(&self) -> Vec<CityWeather> {
        let lookups = DEFAULT_CITIES.iter().map(|&(name, state, country)| async move {
            let result = match LocationQuery::place(name, state, Some(country)) {
                Ok(query) => self.current(&query).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(weather) => CityWeather::Ok(weather),
                Err(e) => {
                    tracing::warn!("Default city {} failed: {}", name, e);
                    CityWeather::Failed {
                        city: name.to_string(),
                        error: e.to_string(),
                    }
                }
            }
        });
        join_all(lookups).await
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.len().await
    }
}

/// Derive condition flags, score severity and round values for display.
pub fn build_current_weather(c: CurrentConditions) -> CurrentWeather {
    let thunderstorm = c.condition_ids.iter().any(|id| (200..300).contains(id));
    let tornado = c.condition_ids.contains(&TORNADO_CONDITION);
    let wet_condition = c
        .condition_ids
        .iter()
        .any(|id| (300..400).contains(id) || (500..600).contains(id));
    let umbrella_needed =
        thunderstorm || wet_condition || c.rain_amount.is_some_and(|r| r > 0.0);

    let severity = score(&SeverityInputs {
        temperature: c.temperature,
        wind_speed: c.wind_speed,
        rain_amount: c.rain_amount,
        has_thunderstorm: thunderstorm,
        has_tornado: tornado,
        visibility_m: c.visibility_m,
        humidity_pct: c.humidity,
    });

    CurrentWeather {
        city: c.city,
        country: c.country,
        temperature: opt_round_whole(c.temperature),
        feels_like: opt_round_whole(c.feels_like),
        description: c.description,
        icon: c.icon,
        humidity: c.humidity,
        wind_speed: opt_round_1dp(c.wind_speed),
        pressure: c.pressure,
        visibility: opt_round_1dp(c.visibility_m.map(|m| m / 1000.0)),
        sunrise: c.sunrise,
        sunset: c.sunset,
        timezone: c.timezone,
        rain_amount: c.rain_amount,
        umbrella_needed,
        thunderstorm,
        tornado,
        severity_index: severity.level,
        severity_score: severity.score,
    }
}

pub fn build_forecast(raw: RawForecast) -> ForecastResult {
    let offset = raw
        .utc_offset_secs
        .and_then(|s| i32::try_from(s).ok())
        .unwrap_or(0);
    ForecastResult {
        city: raw.city,
        country: raw.country,
        days: aggregate(&raw.points, offset),
    }
}
