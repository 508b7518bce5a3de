//! Declarative rubric tables and the shared band-scoring routine
//!
//! Every domain scorer is a table of `(metric, rule, weight)` entries. A rule turns
//! one raw window metric into a 0-100 sub-score; the rubric total is the weighted
//! sum of the clamped sub-scores.
//!
//! # Band scoring
//!
//! Most rules are piecewise-constant bands:
//! - value inside the **ideal** range earns full credit (100)
//! - value inside the **tolerance** range earns partial credit (70)
//! - anything else earns the **floor** credit (40)
//!
//! Range bounds are inclusive.

use std::collections::BTreeMap;

/// Credit for a value inside the ideal band
pub const IDEAL_CREDIT: f64 = 100.0;

/// Credit for a value inside the tolerance band
pub const TOLERANCE_CREDIT: f64 = 70.0;

/// Credit for a value outside both bands
pub const FLOOR_CREDIT: f64 = 40.0;

/// Clamp to [0, 100], mapping NaN to 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// How a raw metric becomes a sub-score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Ideal / tolerance / floor bands
    Band { ideal: Range, tolerance: Range },

    /// `offset + scale × value`
    Linear { scale: f64, offset: f64 },

    /// `100 − |value − target| / target × 100`, floored at 0
    Accuracy { target: f64 },
}

impl Rule {
    /// Identity mapping for metrics already on a 0-100 scale
    pub const PERCENT: Rule = Rule::Linear {
        scale: 1.0,
        offset: 0.0,
    };

    pub const fn band(ideal: (f64, f64), tolerance: (f64, f64)) -> Rule {
        Rule::Band {
            ideal: Range::new(ideal.0, ideal.1),
            tolerance: Range::new(tolerance.0, tolerance.1),
        }
    }

    /// Evaluate to a clamped 0-100 sub-score
    pub fn evaluate(&self, value: f64) -> f64 {
        let raw = match *self {
            Rule::Band { ideal, tolerance } => band_score(value, ideal, tolerance),
            Rule::Linear { scale, offset } => offset + scale * value,
            Rule::Accuracy { target } => {
                if target == 0.0 {
                    0.0
                } else {
                    100.0 - (value - target).abs() / target * 100.0
                }
            }
        };
        clamp_percent(raw)
    }
}

/// Piecewise-constant band credit
pub fn band_score(value: f64, ideal: Range, tolerance: Range) -> f64 {
    if ideal.contains(value) {
        IDEAL_CREDIT
    } else if tolerance.contains(value) {
        TOLERANCE_CREDIT
    } else {
        FLOOR_CREDIT
    }
}

/// One row of a rubric table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubricEntry {
    /// Key into the scorer's raw metric map
    pub metric: &'static str,
    pub rule: Rule,
    pub weight: f64,
}

impl RubricEntry {
    pub const fn new(metric: &'static str, rule: Rule, weight: f64) -> Self {
        Self {
            metric,
            rule,
            weight,
        }
    }
}

/// Per-metric sub-scores plus the weighted total
#[derive(Debug, Clone, PartialEq)]
pub struct RubricResult {
    pub sub_scores: BTreeMap<&'static str, f64>,
    pub total: f64,
}

/// Evaluate a rubric table against a metric map
///
/// Metrics absent from the map are left out and the remaining weights are
/// renormalized; a map with none of the rubric's metrics scores zero.
pub fn evaluate(rubric: &[RubricEntry], metrics: &BTreeMap<String, f64>) -> RubricResult {
    let mut sub_scores = BTreeMap::new();
    let mut total = 0.0;
    let mut present_weight = 0.0;
    let mut missing = false;

    for entry in rubric {
        match metrics.get(entry.metric) {
            Some(value) => {
                let sub_score = entry.rule.evaluate(*value);
                total += sub_score * entry.weight;
                present_weight += entry.weight;
                sub_scores.insert(entry.metric, sub_score);
            }
            None => missing = true,
        }
    }

    if missing {
        let full_weight: f64 = rubric.iter().map(|entry| entry.weight).sum();
        total = if present_weight > 0.0 {
            total * full_weight / present_weight
        } else {
            0.0
        };
    }

    RubricResult {
        sub_scores,
        total: clamp_percent(total),
    }
}
