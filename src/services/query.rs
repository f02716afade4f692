//! Validated location queries and their cache keys.

use std::fmt;

use crate::errors::WeatherError;

const MAX_NAME_LEN: usize = 100;

/// Where to look up weather: a named place or a coordinate pair.
///
/// Only constructed through [`LocationQuery::place`] and
/// [`LocationQuery::coordinates`], which validate their inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Place {
        name: String,
        state: Option<String>,
        country: Option<String>,
    },
    Coordinates {
        latitude: f64,
        longitude: f64,
    },
}

/// Which provider endpoint a cached result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Current,
    Forecast,
}

impl QueryKind {
    fn as_str(self) -> &'static str {
        match self {
            QueryKind::Current => "current",
            QueryKind::Forecast => "forecast",
        }
    }
}

/// Normalized cache key. Logically identical queries produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(kind: QueryKind, query: &LocationQuery, units: &str) -> Self {
        let location = match query {
            LocationQuery::Place { .. } => format!("q={}", query.provider_q().to_lowercase()),
            LocationQuery::Coordinates {
                latitude,
                longitude,
            } => format!("lat={},lon={}", coord(*latitude), coord(*longitude)),
        };
        Self(format!("{}:{}:{}", kind.as_str(), location, units))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl LocationQuery {
    /// Validate and normalize a place-name query.
    ///
    /// Blank `state`/`country` are treated as absent. Whitespace is trimmed
    /// and collapsed; the country code is uppercased.
    pub fn place(
        name: &str,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Result<Self, WeatherError> {
        let name = collapse_whitespace(name);
        if name.is_empty() {
            return Err(WeatherError::Validation("City name is required".to_string()));
        }
        validate_place_part("City name", &name)?;

        let state = state.map(collapse_whitespace).filter(|s| !s.is_empty());
        if let Some(state) = &state {
            validate_place_part("State", state)?;
        }

        let country = country
            .map(collapse_whitespace)
            .filter(|c| !c.is_empty())
            .map(|c| c.to_uppercase());
        if let Some(country) = &country {
            let len = country.chars().count();
            if !(2..=3).contains(&len) || !country.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(WeatherError::Validation(
                    "Country must be a 2-3 letter country code".to_string(),
                ));
            }
        }

        Ok(LocationQuery::Place {
            name,
            state,
            country,
        })
    }

    /// Validate a coordinate pair.
    pub fn coordinates(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        // NaN fails every range check, so test finiteness first
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherError::Validation(format!(
                "Latitude must be between -90 and 90, got {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::Validation(format!(
                "Longitude must be between -180 and 180, got {}",
                longitude
            )));
        }
        Ok(LocationQuery::Coordinates {
            latitude,
            longitude,
        })
    }

    /// The provider's free-text `q` value, e.g. "New York,NY,US".
    pub fn provider_q(&self) -> String {
        match self {
            LocationQuery::Place {
                name,
                state,
                country,
            } => std::iter::once(name.as_str())
                .chain(state.as_deref())
                .chain(country.as_deref())
                .collect::<Vec<_>>()
                .join(","),
            LocationQuery::Coordinates {
                latitude,
                longitude,
            } => format!("{},{}", coord(*latitude), coord(*longitude)),
        }
    }

    /// Query-string parameters identifying this location to the provider.
    pub fn provider_params(&self) -> Vec<(&'static str, String)> {
        match self {
            LocationQuery::Place { .. } => vec![("q", self.provider_q())],
            LocationQuery::Coordinates {
                latitude,
                longitude,
            } => vec![
                ("lat", coord(*latitude)),
                ("lon", coord(*longitude)),
            ],
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn validate_place_part(label: &str, value: &str) -> Result<(), WeatherError> {
    if value.chars().count() > MAX_NAME_LEN {
        return Err(WeatherError::Validation(format!(
            "{} must be at most {} characters",
            label, MAX_NAME_LEN
        )));
    }
    let allowed = |c: char| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | ',' | '.');
    if !value.chars().all(allowed) {
        return Err(WeatherError::Validation(format!(
            "{} may only contain letters, spaces, hyphens, apostrophes, commas and periods",
            label
        )));
    }
    Ok(())
}

/// Four-decimal coordinate text. Values that round to zero print as
/// `0.0000`, never `-0.0000`.
fn coord(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    format!("{:.4}", rounded + 0.0)
}
