//! Training workload scoring
//!
//! # Sports Science Background
//!
//! Daily load uses the session-RPE method (minutes × RPE).
//!
//! - **Acute:chronic ratio**: mean load over the last 7 days divided by mean load
//!   over the last 28 days. 1.0 means the athlete is training exactly at the level
//!   they are adapted to; ratios above 1.3 sharply increase injury risk.
//! - **Monotony** (Foster): mean / standard deviation of daily load over the last
//!   7 days. Values above 2.0 indicate too little day-to-day variation.
//! - **Rest days**: 1-2 complete rest days per week are ideal.

use super::{mean, metric, population_std_dev, tail, DomainScorer};
use crate::models::{Domain, Priority, Recommendation, WorkloadSample};
use crate::rubric::{Rule, RubricEntry};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const ACUTE_LOAD: &str = "acute_load";
pub const CHRONIC_LOAD: &str = "chronic_load";
pub const ACUTE_CHRONIC_RATIO: &str = "acute_chronic_ratio";
pub const MONOTONY: &str = "monotony";
pub const REST_DAYS: &str = "rest_days";
pub const AVERAGE_INTENSITY: &str = "average_intensity";

pub const ACUTE_WINDOW_DAYS: usize = 7;
pub const CHRONIC_WINDOW_DAYS: usize = 28;

/// Monotony reported for identical non-zero daily loads
pub const MAX_MONOTONY: f64 = 10.0;

/// Ratio above which the aggregator flags overtraining
pub const OVERTRAINING_RATIO: f64 = 1.3;

static WORKLOAD_RUBRIC: [RubricEntry; 4] = [
    RubricEntry::new(ACUTE_CHRONIC_RATIO, Rule::Accuracy { target: 1.0 }, 0.40),
    RubricEntry::new(MONOTONY, Rule::band((0.0, 1.5), (1.5, 2.0)), 0.25),
    RubricEntry::new(REST_DAYS, Rule::band((1.0, 2.0), (3.0, 3.0)), 0.20),
    RubricEntry::new(AVERAGE_INTENSITY, Rule::band((60.0, 80.0), (50.0, 90.0)), 0.15),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkloadScorer;

/// Acute:chronic workload ratio, 0 when there is no chronic load
pub fn acute_chronic_ratio(acute: f64, chronic: f64) -> f64 {
    if chronic > 0.0 {
        acute / chronic
    } else {
        0.0
    }
}

/// Foster training monotony over a set of daily loads
pub fn monotony(loads: &[f64]) -> f64 {
    let average = mean(loads);
    let sd = population_std_dev(loads);
    if average <= 0.0 {
        0.0
    } else if sd <= f64::EPSILON {
        MAX_MONOTONY
    } else {
        (average / sd).min(MAX_MONOTONY)
    }
}

impl DomainScorer for WorkloadScorer {
    type Sample = WorkloadSample;

    const DOMAIN: Domain = Domain::Workload;

    fn rubric(&self) -> &'static [RubricEntry] {
        &WORKLOAD_RUBRIC
    }

    fn window_metrics(&self, samples: &[WorkloadSample]) -> BTreeMap<String, f64> {
        let loads: Vec<f64> = samples.iter().map(WorkloadSample::load).collect();
        let acute_loads = tail(&loads, ACUTE_WINDOW_DAYS);
        let acute = mean(acute_loads);
        let chronic = mean(tail(&loads, CHRONIC_WINDOW_DAYS));

        let last_week = tail(samples, ACUTE_WINDOW_DAYS);
        let rest_days = last_week.iter().filter(|s| s.is_rest_day()).count();
        let intensities: Vec<f64> = last_week
            .iter()
            .filter(|s| !s.is_rest_day())
            .map(|s| s.intensity)
            .collect();

        let mut metrics = BTreeMap::new();
        metrics.insert(ACUTE_LOAD.to_string(), acute);
        metrics.insert(CHRONIC_LOAD.to_string(), chronic);
        metrics.insert(ACUTE_CHRONIC_RATIO.to_string(), acute_chronic_ratio(acute, chronic));
        metrics.insert(MONOTONY.to_string(), monotony(acute_loads));
        metrics.insert(REST_DAYS.to_string(), rest_days as f64);
        metrics.insert(AVERAGE_INTENSITY.to_string(), mean(&intensities));
        metrics
    }

    fn recommendations(
        &self,
        _samples: &[WorkloadSample],
        metrics: &BTreeMap<String, f64>,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();
        let ratio = metric(metrics, ACUTE_CHRONIC_RATIO);

        if ratio > 1.5 {
            recommendations.push(Recommendation::new(
                "workload_spike",
                Priority::Critical,
                format!("Acute workload spike (ratio {:.2}), injury risk is high", ratio),
                &[
                    "Cut planned volume by 30-40% this week",
                    "Remove high-intensity sessions until the ratio falls below 1.3",
                ],
            ));
        } else if ratio > OVERTRAINING_RATIO {
            recommendations.push(Recommendation::new(
                "workload_reduction",
                Priority::High,
                format!("Training load is rising too quickly (ratio {:.2})", ratio),
                &[
                    "Reduce volume by 15-20% over the next week",
                    "Keep week-to-week load increases below 10%",
                ],
            ));
        } else if ratio < 0.8 {
            recommendations.push(Recommendation::new(
                "workload_progression",
                Priority::Medium,
                "Training load is below the level the athlete is adapted to",
                &["Progressively increase weekly volume by 5-10%"],
            ));
        }

        if metric(metrics, MONOTONY) > 2.0 {
            recommendations.push(Recommendation::new(
                "training_variety",
                Priority::Medium,
                "Training is too monotonous",
                &[
                    "Alternate hard and easy days",
                    "Vary session duration and intensity across the week",
                ],
            ));
        }

        if metric(metrics, REST_DAYS) < 1.0 {
            recommendations.push(Recommendation::new(
                "rest_days",
                Priority::High,
                "No rest days in the last week",
                &["Schedule at least one full rest day per week"],
            ));
        }

        recommendations
    }

    fn sample_date(sample: &WorkloadSample) -> NaiveDate {
        sample.date
    }

    /// Workload needs its full history so the chronic load can build up
    fn daily_series(&self, samples: &[WorkloadSample]) -> Vec<(NaiveDate, f64)> {
        (0..samples.len())
            .filter_map(|i| {
                let start = (i + 1).saturating_sub(CHRONIC_WINDOW_DAYS);
                self.score(&samples[start..=i])
                    .map(|s| (samples[i].date, s.score))
            })
            .collect()
    }
}
