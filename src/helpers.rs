//! Shared numeric and text helpers for shaping provider values.
//!
//! Rounding helpers return `None` for non-finite inputs (NaN, ±Inf) so a
//! garbage reading degrades to "unknown" instead of a fake number.

use chrono::Duration;

/// Round to one decimal place.
pub(crate) fn round_1dp(v: f64) -> Option<f64> {
    if !v.is_finite() {
        tracing::warn!("round_1dp received non-finite value {}, treating as unknown", v);
        return None;
    }
    Some((v * 10.0).round() / 10.0)
}

/// Round to the nearest whole number.
pub(crate) fn round_whole(v: f64) -> Option<i64> {
    if !v.is_finite() {
        tracing::warn!("round_whole received non-finite value {}, treating as unknown", v);
        return None;
    }
    Some(v.round() as i64)
}

pub(crate) fn opt_round_1dp(v: Option<f64>) -> Option<f64> {
    v.and_then(round_1dp)
}

pub(crate) fn opt_round_whole(v: Option<f64>) -> Option<i64> {
    v.and_then(round_whole)
}

/// Arithmetic mean, `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Whole seconds as a `chrono::Duration`, `None` if out of range.
pub(crate) fn try_duration_secs(secs: u64) -> Option<Duration> {
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}

/// Like [`try_duration_secs`], saturating at `Duration::MAX`.
pub(crate) fn duration_secs_saturating(secs: u64) -> Duration {
    try_duration_secs(secs).unwrap_or(Duration::MAX)
}

/// Capitalise the first letter of every whitespace-separated word.
pub(crate) fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
