use std::str::FromStr;

use crate::errors::WeatherError;
use crate::helpers::try_duration_secs;

const DEFAULT_API_URL: &str = "https://api.openweathermap.org";
const PLACEHOLDER_API_KEY: &str = "your_api_key_here";
/// Provider keys are normally 32 characters; anything much shorter is suspect.
const MIN_PLAUSIBLE_KEY_LEN: usize = 20;

/// Upstream request timeout. Not configurable.
pub const UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Unit system sent to the provider for the whole process.
pub const UNITS: &str = "imperial";

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_url: String,
    pub port: u16,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
    /// Key rate limiting on `X-Forwarded-For` instead of the peer address.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            port: 5000,
            cache_ttl_secs: 300,
            cache_capacity: 256,
            rate_limit_max_requests: 100,
            rate_limit_window_secs: 3600,
            trust_forwarded_for: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, WeatherError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source.
    fn from_lookup<F>(lookup: F) -> Result<Self, WeatherError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            api_key: lookup("WEATHER_API_KEY")
                .map(|k| k.trim().to_string())
                .unwrap_or_default(),
            api_url: lookup("WEATHER_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            cache_ttl_secs: parse_var(&lookup, "CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            cache_capacity: parse_var(&lookup, "CACHE_CAPACITY", defaults.cache_capacity)?,
            rate_limit_max_requests: parse_var(
                &lookup,
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            )?,
            rate_limit_window_secs: parse_var(
                &lookup,
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )?,
            trust_forwarded_for: parse_var(
                &lookup,
                "TRUST_FORWARDED_FOR",
                defaults.trust_forwarded_for,
            )?,
        };

        if config.cache_capacity == 0 {
            return Err(WeatherError::Config(
                "CACHE_CAPACITY must be at least 1".to_string(),
            ));
        }
        if config.rate_limit_max_requests == 0 || config.rate_limit_window_secs == 0 {
            return Err(WeatherError::Config(
                "RATE_LIMIT_MAX_REQUESTS and RATE_LIMIT_WINDOW_SECS must be positive".to_string(),
            ));
        }

        for (name, secs) in [
            ("CACHE_TTL_SECS", config.cache_ttl_secs),
            ("RATE_LIMIT_WINDOW_SECS", config.rate_limit_window_secs),
        ] {
            if try_duration_secs(secs).is_none() {
                return Err(WeatherError::Config(format!(
                    "{} is out of range: {}",
                    name, secs
                )));
            }
        }

        Ok(config)
    }

    /// Whether a usable provider credential is configured.
    pub fn has_api_key(&self) -> bool {
        is_usable_api_key(&self.api_key)
    }

    /// Emit startup warnings about the provider credential.
    pub fn log_api_key_warnings(&self) {
        if !self.has_api_key() {
            tracing::warn!(
                "WEATHER_API_KEY not set or using placeholder value; \
                 every weather request will fail until a key is configured"
            );
        } else if self.api_key.len() < MIN_PLAUSIBLE_KEY_LEN {
            tracing::warn!(
                "WEATHER_API_KEY appears to be invalid (too short, {} chars)",
                self.api_key.len()
            );
        }
    }
}

pub(crate) fn is_usable_api_key(key: &str) -> bool {
    !key.is_empty() && key != PLACEHOLDER_API_KEY
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, WeatherError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| WeatherError::Config(format!("{} has an invalid value: {:?}", name, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.cache_capacity, 256);
        assert_eq!(config.rate_limit_max_requests, 100);
        assert_eq!(config.rate_limit_window_secs, 3600);
        assert_eq!(config.api_url, "https://api.openweathermap.org");
        assert!(!config.has_api_key());
        assert!(!config.trust_forwarded_for);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("WEATHER_API_KEY", "0123456789abcdef0123456789abcdef"),
            ("WEATHER_API_URL", "http://localhost:9000/"),
            ("PORT", "8080"),
            ("CACHE_TTL_SECS", "60"),
            ("CACHE_CAPACITY", "16"),
            ("RATE_LIMIT_MAX_REQUESTS", "5"),
            ("RATE_LIMIT_WINDOW_SECS", "30"),
            ("TRUST_FORWARDED_FOR", "true"),
        ]))
        .unwrap();

        assert!(config.has_api_key());
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.cache_capacity, 16);
        assert_eq!(config.rate_limit_max_requests, 5);
        assert_eq!(config.rate_limit_window_secs, 30);
        assert!(config.trust_forwarded_for);
    }

    #[test]
    fn test_placeholder_key_is_not_usable() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("WEATHER_API_KEY", "your_api_key_here")]))
                .unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("CACHE_TTL_SECS", "five")])).unwrap_err();
        assert!(matches!(err, WeatherError::Config(msg) if msg.contains("CACHE_TTL_SECS")));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("CACHE_CAPACITY", "0")])).unwrap_err();
        assert!(matches!(err, WeatherError::Config(_)));
    }

    #[test]
    fn test_out_of_range_durations_rejected() {
        for (name, value) in [
            ("CACHE_TTL_SECS", "10000000000000000"),
            ("CACHE_TTL_SECS", "18446744073709551615"),
            ("RATE_LIMIT_WINDOW_SECS", "18446744073709551615"),
        ] {
            let err = AppConfig::from_lookup(lookup_from(&[(name, value)])).unwrap_err();
            assert!(
                matches!(&err, WeatherError::Config(msg) if msg.contains(name)),
                "{} = {} gave {:?}",
                name,
                value,
                err
            );
        }
    }

    #[test]
    fn test_invalid_trust_flag_is_config_error() {
        let err =
            AppConfig::from_lookup(lookup_from(&[("TRUST_FORWARDED_FOR", "maybe")])).unwrap_err();
        assert!(matches!(err, WeatherError::Config(_)));
    }
}
