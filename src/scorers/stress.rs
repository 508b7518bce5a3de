//! Stress scoring from hormonal, autonomic and subjective markers
//!
//! HRV is compared against the athlete's own baseline as a ratio
//! (`100 · rmssd / baseline`): values at or above baseline reflect
//! parasympathetic dominance, values well below it reflect accumulated stress.

use super::{mean, metric, DomainScorer};
use crate::models::{Domain, Priority, Recommendation, StressSample};
use crate::rubric::{Rule, RubricEntry};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const CORTISOL: &str = "cortisol";
pub const HRV_RATIO: &str = "hrv_ratio";
pub const PERCEIVED_STRESS: &str = "perceived_stress";
pub const MOOD: &str = "mood";

static STRESS_RUBRIC: [RubricEntry; 4] = [
    RubricEntry::new(CORTISOL, Rule::band((10.0, 20.0), (6.0, 23.0)), 0.25),
    RubricEntry::new(HRV_RATIO, Rule::band((95.0, 130.0), (85.0, 140.0)), 0.35),
    RubricEntry::new(
        PERCEIVED_STRESS,
        Rule::Linear {
            scale: -10.0,
            offset: 100.0,
        },
        0.25,
    ),
    RubricEntry::new(
        MOOD,
        Rule::Linear {
            scale: 10.0,
            offset: 0.0,
        },
        0.15,
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct StressScorer;

impl StressScorer {
    /// RMSSD as % of baseline; samples without a usable baseline are skipped
    fn hrv_ratios(samples: &[StressSample]) -> Vec<f64> {
        samples
            .iter()
            .filter(|s| s.hrv_baseline > 0.0)
            .map(|s| s.hrv_rmssd / s.hrv_baseline * 100.0)
            .collect()
    }
}

impl DomainScorer for StressScorer {
    type Sample = StressSample;

    const DOMAIN: Domain = Domain::Stress;

    fn rubric(&self) -> &'static [RubricEntry] {
        &STRESS_RUBRIC
    }

    fn window_metrics(&self, samples: &[StressSample]) -> BTreeMap<String, f64> {
        let cortisol: Vec<f64> = samples.iter().map(|s| s.cortisol).collect();
        let perceived: Vec<f64> = samples.iter().map(|s| s.perceived_stress).collect();
        let mood: Vec<f64> = samples.iter().map(|s| s.mood).collect();

        let mut metrics = BTreeMap::new();
        metrics.insert(CORTISOL.to_string(), mean(&cortisol));
        let ratios = Self::hrv_ratios(samples);
        if !ratios.is_empty() {
            metrics.insert(HRV_RATIO.to_string(), mean(&ratios));
        }
        metrics.insert(PERCEIVED_STRESS.to_string(), mean(&perceived));
        metrics.insert(MOOD.to_string(), mean(&mood));
        metrics
    }

    fn recommendations(
        &self,
        _samples: &[StressSample],
        metrics: &BTreeMap<String, f64>,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if metric(metrics, CORTISOL) > 20.0 {
            recommendations.push(Recommendation::new(
                "cortisol_management",
                Priority::High,
                "Morning cortisol is elevated",
                &[
                    "Replace one high-intensity session with low-intensity aerobic work",
                    "Add 10 minutes of breathing exercises after waking",
                ],
            ));
        }

        if metrics.get(HRV_RATIO).is_some_and(|&ratio| ratio < 85.0) {
            recommendations.push(Recommendation::new(
                "hrv_recovery",
                Priority::High,
                "HRV is well below baseline, prioritize parasympathetic recovery",
                &[
                    "Schedule an easy or rest day",
                    "Use slow nasal breathing before sleep",
                    "Re-test HRV tomorrow morning before training",
                ],
            ));
        }

        if metric(metrics, PERCEIVED_STRESS) > 6.0 {
            recommendations.push(Recommendation::new(
                "stress_management",
                Priority::Medium,
                "Perceived stress is high",
                &[
                    "Practice 10 minutes of mindfulness daily",
                    "Review academic and training schedule conflicts",
                ],
            ));
        }

        if metric(metrics, MOOD) < 5.0 {
            recommendations.push(Recommendation::new(
                "mood_support",
                Priority::Medium,
                "Low mood reported",
                &[
                    "Check in with a coach or sport psychologist",
                    "Plan social or outdoor activities on rest days",
                ],
            ));
        }

        recommendations
    }

    fn sample_date(sample: &StressSample) -> NaiveDate {
        sample.date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Grade;

    fn morning(cortisol: f64, rmssd: f64, baseline: f64, stress: f64, mood: f64) -> StressSample {
        StressSample {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            cortisol,
            hrv_rmssd: rmssd,
            hrv_baseline: baseline,
            perceived_stress: stress,
            mood,
        }
    }

    #[test]
    fn test_calm_athlete() {
        let score = StressScorer
            .score(&[morning(15.0, 60.0, 55.0, 0.0, 10.0)])
            .unwrap();
        assert_eq!(score.score, 100.0);
        assert_eq!(score.grade, Grade::A);
        assert!(score.recommendations.is_empty());
    }

    #[test]
    fn test_stressed_athlete() {
        // cortisol 24 → floor 40 (×0.25 = 10)
        // HRV 40/50 = 80% → floor 40 (×0.35 = 14)
        // perceived 8 → 20 (×0.25 = 5)
        // mood 3 → 30 (×0.15 = 4.5)
        let score = StressScorer
            .score(&[morning(24.0, 40.0, 50.0, 8.0, 3.0)])
            .unwrap();
        assert_eq!(score.score, 33.5);
        assert_eq!(score.grade, Grade::F);

        let kinds: Vec<&str> = score.recommendations.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["cortisol_management", "hrv_recovery", "stress_management", "mood_support"]
        );
    }

    #[test]
    fn test_missing_baseline_is_skipped() {
        let samples = vec![
            morning(15.0, 60.0, 0.0, 2.0, 8.0),
            morning(15.0, 50.0, 50.0, 2.0, 8.0),
        ];
        let score = StressScorer.score(&samples).unwrap();
        assert_eq!(score.metric(HRV_RATIO), Some(100.0));
    }

    #[test]
    fn test_no_usable_baseline_leaves_hrv_out() {
        // cortisol 15 → 100 (×0.25), perceived 2 → 80 (×0.25), mood 8 → 80 (×0.15)
        // renormalized over 0.65: 57 / 0.65 ≈ 87.7
        let score = StressScorer
            .score(&[morning(15.0, 60.0, 0.0, 2.0, 8.0)])
            .unwrap();
        assert_eq!(score.metric(HRV_RATIO), None);
        assert_eq!(score.score, 87.7);
        assert!(score
            .recommendations
            .iter()
            .all(|r| r.kind != "hrv_recovery"));
    }
}
