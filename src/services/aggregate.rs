//! Daily forecast aggregation.
//!
//! Reduces the provider's 3-hourly forecast points to one summary per
//! calendar day (in the location's local time), keeping at most five days.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use std::collections::BTreeMap;

use crate::helpers::{mean, opt_round_1dp, opt_round_whole};
use crate::models::DailyForecastSummary;

/// Maximum number of days returned.
pub const MAX_FORECAST_DAYS: usize = 5;

/// One raw forecast sample as extracted from the provider response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastPoint {
    /// Unix epoch seconds (UTC)
    pub timestamp: i64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// Probability of precipitation, 0.0–1.0
    pub pop: Option<f64>,
}

/// Group points by local calendar date and summarise each day.
///
/// `utc_offset_secs` is the location's offset from UTC; an out-of-range
/// offset falls back to UTC. Output is ascending by date.
pub fn aggregate(points: &[ForecastPoint], utc_offset_secs: i32) -> Vec<DailyForecastSummary> {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| {
        tracing::warn!("Invalid UTC offset {}s, grouping days in UTC", utc_offset_secs);
        Utc.fix()
    });

    let mut days: BTreeMap<NaiveDate, Vec<&ForecastPoint>> = BTreeMap::new();
    for point in points {
        let Some(utc_time) = DateTime::from_timestamp(point.timestamp, 0) else {
            tracing::warn!("Skipping forecast point with invalid timestamp {}", point.timestamp);
            continue;
        };
        let date = utc_time.with_timezone(&offset).date_naive();
        days.entry(date).or_default().push(point);
    }

    days.into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(|(date, day_points)| summarise_day(date, &day_points))
        .collect()
}

fn summarise_day(date: NaiveDate, points: &[&ForecastPoint]) -> DailyForecastSummary {
    let temps: Vec<f64> = points.iter().filter_map(|p| p.temperature).collect();
    let humidities: Vec<f64> = points.iter().filter_map(|p| p.humidity).collect();
    let winds: Vec<f64> = points.iter().filter_map(|p| p.wind_speed).collect();

    let temp_min = temps.iter().copied().reduce(f64::min);
    let temp_max = temps.iter().copied().reduce(f64::max);

    let max_pop = points
        .iter()
        .filter_map(|p| p.pop)
        .filter(|p| p.is_finite())
        .reduce(f64::max);

    DailyForecastSummary {
        date,
        weekday: date.format("%A").to_string(),
        temp_min: opt_round_1dp(temp_min),
        temp_max: opt_round_1dp(temp_max),
        temp_avg: opt_round_whole(mean(&temps)),
        description: mode(points.iter().filter_map(|p| p.description.as_deref())),
        icon: mode(points.iter().filter_map(|p| p.icon.as_deref())),
        humidity_avg: opt_round_whole(mean(&humidities)),
        wind_speed_avg: opt_round_1dp(mean(&winds)),
        precipitation_chance: max_pop.map(|p| (p * 100.0).round().clamp(0.0, 100.0) as u8),
    }
}

/// Most frequent value; on a tie, the one seen first wins.
fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}
