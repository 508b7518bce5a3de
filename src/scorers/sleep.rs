//! Sleep scoring
//!
//! # Sports Science Background
//!
//! Sleep is the single largest recovery lever available to an athlete:
//!
//! - **Duration**: 7-9 hours is the ideal band for adult athletes; 6-10 hours is
//!   tolerable for short stretches. Anything outside that range impairs glycogen
//!   resynthesis and reaction time.
//! - **Quality**: device or self-reported score (0-100).
//! - **Consistency**: night-to-night stability of duration. Derived from the
//!   standard deviation of hours over the window: `100 − 25·σ`.
//! - **REM share**: 20-25% of total sleep is ideal, 15-30% tolerable.
//! - **Disturbances**: each awakening costs 10 points of the disturbance sub-score.

use super::{mean, metric, population_std_dev, DomainScorer};
use crate::models::{Domain, Priority, Recommendation, SleepSample};
use crate::rubric::{clamp_percent, Rule, RubricEntry};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const AVERAGE_HOURS: &str = "average_hours";
pub const QUALITY: &str = "quality";
pub const CONSISTENCY: &str = "consistency";
pub const REM_PERCENTAGE: &str = "rem_percentage";
pub const DISTURBANCES: &str = "disturbances";

/// Consistency points lost per hour of standard deviation
const CONSISTENCY_PENALTY_PER_HOUR: f64 = 25.0;

static SLEEP_RUBRIC: [RubricEntry; 5] = [
    RubricEntry::new(AVERAGE_HOURS, Rule::band((7.0, 9.0), (6.0, 10.0)), 0.30),
    RubricEntry::new(QUALITY, Rule::PERCENT, 0.25),
    RubricEntry::new(CONSISTENCY, Rule::PERCENT, 0.20),
    RubricEntry::new(REM_PERCENTAGE, Rule::band((20.0, 25.0), (15.0, 30.0)), 0.15),
    RubricEntry::new(
        DISTURBANCES,
        Rule::Linear {
            scale: -10.0,
            offset: 100.0,
        },
        0.10,
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SleepScorer;

impl DomainScorer for SleepScorer {
    type Sample = SleepSample;

    const DOMAIN: Domain = Domain::Sleep;

    fn rubric(&self) -> &'static [RubricEntry] {
        &SLEEP_RUBRIC
    }

    fn window_metrics(&self, samples: &[SleepSample]) -> BTreeMap<String, f64> {
        let hours: Vec<f64> = samples.iter().map(|s| s.hours).collect();
        let quality: Vec<f64> = samples.iter().map(|s| clamp_percent(s.quality)).collect();
        let rem: Vec<f64> = samples.iter().map(|s| clamp_percent(s.rem_percentage)).collect();
        let disturbances: Vec<f64> = samples.iter().map(|s| s.disturbances as f64).collect();

        let consistency =
            clamp_percent(100.0 - CONSISTENCY_PENALTY_PER_HOUR * population_std_dev(&hours));

        let mut metrics = BTreeMap::new();
        metrics.insert(AVERAGE_HOURS.to_string(), mean(&hours));
        metrics.insert(QUALITY.to_string(), mean(&quality));
        metrics.insert(CONSISTENCY.to_string(), consistency);
        metrics.insert(REM_PERCENTAGE.to_string(), mean(&rem));
        metrics.insert(DISTURBANCES.to_string(), mean(&disturbances));
        metrics
    }

    fn recommendations(
        &self,
        _samples: &[SleepSample],
        metrics: &BTreeMap<String, f64>,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if metric(metrics, AVERAGE_HOURS) < 7.0 {
            recommendations.push(Recommendation::new(
                "sleep_duration",
                Priority::High,
                "Increase sleep duration to at least 7 hours per night",
                &[
                    "Move bedtime 30 minutes earlier",
                    "Schedule a 20-minute nap after hard sessions",
                    "Protect a fixed 8-hour sleep opportunity",
                ],
            ));
        }

        if metric(metrics, QUALITY) < 70.0 {
            recommendations.push(Recommendation::new(
                "sleep_quality",
                Priority::Medium,
                "Improve sleep quality",
                &[
                    "Keep the bedroom cool and dark",
                    "Avoid screens for 60 minutes before bed",
                    "Limit caffeine after midday",
                ],
            ));
        }

        if metric(metrics, CONSISTENCY) < 70.0 {
            recommendations.push(Recommendation::new(
                "sleep_consistency",
                Priority::Medium,
                "Keep a consistent sleep schedule",
                &[
                    "Go to bed and wake up at the same time every day",
                    "Keep weekend schedules within an hour of weekdays",
                ],
            ));
        }

        if metric(metrics, DISTURBANCES) > 3.0 {
            recommendations.push(Recommendation::new(
                "sleep_environment",
                Priority::Low,
                "Reduce night-time disturbances",
                &[
                    "Use earplugs or white noise",
                    "Limit fluids in the hour before bed",
                ],
            ));
        }

        if metric(metrics, REM_PERCENTAGE) < 20.0 {
            recommendations.push(Recommendation::new(
                "rem_sleep",
                Priority::Low,
                "Support REM sleep",
                &[
                    "Avoid alcohol in the evening",
                    "Allow a full final sleep cycle before waking",
                ],
            ));
        }

        recommendations
    }

    fn sample_date(sample: &SleepSample) -> NaiveDate {
        sample.date
    }
}
