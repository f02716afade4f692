//! Additive hazard score over raw meteorological readings.
//!
//! Each factor contributes a fixed number of points by threshold band;
//! the total is capped at 100 and bucketed into a `SeverityLevel`.
//!
//! Inputs use imperial units (°F, mph) except rain (mm) and visibility
//! (metres), which the provider reports in metric regardless of units.

use crate::models::SeverityLevel;

/// Temperature considered comfortable; deviation from it adds points.
const COMFORT_TEMP_F: f64 = 70.0;
/// Assumed visibility when the provider omits it (contributes nothing).
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;
/// Assumed humidity when the provider omits it (contributes nothing).
const DEFAULT_HUMIDITY_PCT: f64 = 50.0;

const MAX_SCORE: u32 = 100;
const HIGH_THRESHOLD: u8 = 60;
const MODERATE_THRESHOLD: u8 = 30;

/// Readings fed to the scorer.
///
/// Missing visibility and humidity fall back to neutral values so the
/// scorer always has a complete input. Missing temperature, wind and rain
/// contribute no points.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityInputs {
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub rain_amount: Option<f64>,
    pub has_thunderstorm: bool,
    pub has_tornado: bool,
    pub visibility_m: Option<f64>,
    pub humidity_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityAssessment {
    pub level: SeverityLevel,
    pub score: u8,
}

/// Score a set of readings. Deterministic and side-effect free.
pub fn score(inputs: &SeverityInputs) -> SeverityAssessment {
    let mut points: u32 = 0;

    let deviation = inputs
        .temperature
        .map(|t| (t - COMFORT_TEMP_F).abs())
        .unwrap_or(0.0);
    // Temperature bands are inclusive: a 30° deviation scores the full 30
    points += banded(deviation, [(30.0, 30), (20.0, 20), (10.0, 10)], |v, b| v >= b);

    points += banded(
        inputs.wind_speed.unwrap_or(0.0),
        [(50.0, 30), (30.0, 20), (15.0, 10)],
        |v, b| v > b,
    );

    points += banded(
        inputs.rain_amount.unwrap_or(0.0),
        [(50.0, 25), (20.0, 15), (5.0, 5)],
        |v, b| v > b,
    );

    if inputs.has_tornado {
        points += 50;
    } else if inputs.has_thunderstorm {
        points += 25;
    }

    let visibility_km = inputs.visibility_m.unwrap_or(DEFAULT_VISIBILITY_M) / 1000.0;
    points += if visibility_km < 0.5 {
        20
    } else if visibility_km < 2.0 {
        10
    } else if visibility_km < 5.0 {
        5
    } else {
        0
    };

    let humidity = inputs.humidity_pct.unwrap_or(DEFAULT_HUMIDITY_PCT);
    points += if humidity > 90.0 {
        10
    } else if humidity < 20.0 {
        5
    } else {
        0
    };

    let score = points.min(MAX_SCORE) as u8;
    SeverityAssessment {
        level: classify(score),
        score,
    }
}

pub fn classify(score: u8) -> SeverityLevel {
    if score >= HIGH_THRESHOLD {
        SeverityLevel::High
    } else if score >= MODERATE_THRESHOLD {
        SeverityLevel::Moderate
    } else {
        SeverityLevel::Low
    }
}

/// Points for the first band whose lower bound `value` passes.
/// Bands must be ordered from highest bound to lowest.
fn banded(value: f64, bands: [(f64, u32); 3], passes: fn(f64, f64) -> bool) -> u32 {
    bands
        .iter()
        .find(|(bound, _)| passes(value, *bound))
        .map(|(_, pts)| *pts)
        .unwrap_or(0)
}
