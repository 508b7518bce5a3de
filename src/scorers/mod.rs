//! Domain scorers: sleep, nutrition, stress and workload
//!
//! Each scorer reduces a window of [`MetricSample`](crate::models) values to a
//! set of window metrics, evaluates them against its rubric table and emits the
//! recommendations whose threshold rules fire. Scorers hold no state and are
//! safe to call from any thread.

pub mod nutrition;
pub mod sleep;
pub mod stress;
pub mod workload;

pub use nutrition::NutritionScorer;
pub use sleep::SleepScorer;
pub use stress::StressScorer;
pub use workload::WorkloadScorer;

use crate::models::{Domain, DomainScore, Grade, Recommendation};
use crate::rubric::{self, RubricEntry};
use chrono::NaiveDate;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Trailing window used when turning samples into a daily score series
pub const TREND_WINDOW_DAYS: usize = 7;

/// Common contract of the four domain scorers
pub trait DomainScorer {
    type Sample;

    const DOMAIN: Domain;

    /// Rubric table evaluated against [`window_metrics`](Self::window_metrics)
    fn rubric(&self) -> &'static [RubricEntry];

    /// Reduce a window of samples to named metrics
    fn window_metrics(&self, samples: &[Self::Sample]) -> BTreeMap<String, f64>;

    /// Every recommendation whose threshold rule fires
    fn recommendations(
        &self,
        samples: &[Self::Sample],
        metrics: &BTreeMap<String, f64>,
    ) -> Vec<Recommendation>;

    fn sample_date(sample: &Self::Sample) -> NaiveDate;

    /// Score a window of samples, `None` if the window is empty
    fn score(&self, samples: &[Self::Sample]) -> Option<DomainScore> {
        if samples.is_empty() {
            return None;
        }

        let raw_metrics = self.window_metrics(samples);
        let result = rubric::evaluate(self.rubric(), &raw_metrics);
        let score = round_tenth(result.total);
        let recommendations = self.recommendations(samples, &raw_metrics);

        tracing::debug!(
            domain = %Self::DOMAIN,
            samples = samples.len(),
            score,
            recommendations = recommendations.len(),
            "Scored domain"
        );

        Some(DomainScore {
            domain: Self::DOMAIN,
            score,
            grade: Grade::from_score(score),
            raw_metrics,
            recommendations,
        })
    }

    /// Per-day score series, each day scored over its trailing window
    ///
    /// Samples must be ordered by date.
    fn daily_series(&self, samples: &[Self::Sample]) -> Vec<(NaiveDate, f64)> {
        (0..samples.len())
            .filter_map(|i| {
                let start = (i + 1).saturating_sub(TREND_WINDOW_DAYS);
                self.score(&samples[start..=i])
                    .map(|s| (Self::sample_date(&samples[i]), s.score))
            })
            .collect()
    }
}

pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean, 0 for an empty slice
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().mean()
    }
}

/// Population standard deviation, 0 for fewer than two values
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        0.0
    } else {
        values.iter().population_std_dev()
    }
}

/// Last `n` elements of a slice
pub(crate) fn tail<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}

pub(crate) fn metric(metrics: &BTreeMap<String, f64>, name: &str) -> f64 {
    metrics.get(name).copied().unwrap_or(0.0)
}
