//! Trend engine for bounded score series
//!
//! All functions take values ordered oldest to newest; the x coordinate of each
//! value is its index (0..n-1). Degenerate input never divides by zero: series
//! shorter than two points have slope 0 and improvement 0.

use crate::rubric::clamp_percent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days in each half of the improvement comparison
pub const IMPROVEMENT_WINDOW: usize = 7;

/// Days projected forward by the point forecast
pub const FORECAST_HORIZON_DAYS: f64 = 7.0;

/// Slopes closer to zero than this are reported as stable
const SLOPE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > SLOPE_EPSILON {
            TrendDirection::Improving
        } else if slope < -SLOPE_EPSILON {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Declining => write!(f, "declining"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Ordinary least-squares slope
///
/// `slope = (n·Σxy − Σx·Σy) / (n·Σx² − (Σx)²)` with `x = 0..n-1`.
pub fn slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_xx) = values.iter().enumerate().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sxx), (i, y)| {
            let x = i as f64;
            (sx + x, sy + y, sxy + x * y, sxx + x * x)
        },
    );

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Mean of the last 7 values minus mean of the 7 before them
///
/// With fewer than 14 values the earlier half is whatever precedes the last 7.
/// Returns 0 when either half is empty.
pub fn improvement(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let split = values.len().saturating_sub(IMPROVEMENT_WINDOW);
    let recent = &values[split..];
    let previous = &values[split.saturating_sub(IMPROVEMENT_WINDOW)..split];

    if recent.is_empty() || previous.is_empty() {
        return 0.0;
    }

    average(recent) - average(previous)
}

/// Point forecast `current + slope·horizon`, clamped to [0, 100]
pub fn forecast(values: &[f64], horizon: f64) -> f64 {
    match values.last() {
        Some(current) => clamp_percent(current + slope(values) * horizon),
        None => 0.0,
    }
}

fn average(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Slope, direction, improvement and 7-day forecast of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub slope: f64,
    pub direction: TrendDirection,
    pub improvement: f64,
    pub current: f64,
    pub forecast_7d: f64,
}

impl TrendSummary {
    pub fn from_series(values: &[f64]) -> Self {
        let slope = slope(values);
        Self {
            slope,
            direction: TrendDirection::from_slope(slope),
            improvement: improvement(values),
            current: values.last().copied().unwrap_or(0.0),
            forecast_7d: forecast(values, FORECAST_HORIZON_DAYS),
        }
    }
}
