//! Property-based bound checks across the scoring pipeline

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use recoveryrs::aggregator;
use recoveryrs::trend::{self, TrendSummary};
use recoveryrs::{
    DomainScorer, NutritionSample, NutritionScorer, SleepSample, SleepScorer, StressSample,
    StressScorer, WorkloadSample, WorkloadScorer,
};
use std::collections::BTreeMap;

fn date(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset as i64)
}

fn sleep_sample() -> impl Strategy<Value = (f64, f64, f64, u32)> {
    (0.0f64..14.0, 0.0f64..=100.0, 0.0f64..=100.0, 0u32..20)
}

fn nutrition_sample() -> impl Strategy<Value = (f64, f64, f64, f64, f64, Vec<f64>)> {
    (
        0.0f64..200.0,
        0.0f64..200.0,
        0.0f64..200.0,
        0.0f64..200.0,
        0.0f64..8.0,
        prop::collection::vec(0.0f64..200.0, 0..5),
    )
}

fn stress_sample() -> impl Strategy<Value = (f64, f64, f64, f64, f64)> {
    (0.0f64..40.0, 0.0f64..150.0, 0.0f64..150.0, 1.0f64..=10.0, 1.0f64..=10.0)
}

fn workload_sample() -> impl Strategy<Value = (f64, f64, f64)> {
    prop_oneof![
        Just((0.0, 0.0, 0.0)),
        (1.0f64..240.0, 0.0f64..=100.0, 1.0f64..=10.0),
    ]
}

proptest! {
    #[test]
    fn prop_sleep_score_bounded(raw in prop::collection::vec(sleep_sample(), 0..30)) {
        let samples: Vec<SleepSample> = raw
            .into_iter()
            .enumerate()
            .map(|(i, (hours, quality, rem, disturbances))| SleepSample {
                date: date(i),
                hours,
                quality,
                rem_percentage: rem,
                disturbances,
            })
            .collect();

        match SleepScorer.score(&samples) {
            Some(score) => prop_assert!((0.0..=100.0).contains(&score.score)),
            None => prop_assert!(samples.is_empty()),
        }
    }

    #[test]
    fn prop_nutrition_score_bounded(raw in prop::collection::vec(nutrition_sample(), 1..30)) {
        let samples: Vec<NutritionSample> = raw
            .into_iter()
            .enumerate()
            .map(|(i, (cal, protein, carb, fat, water, micros))| NutritionSample {
                date: date(i),
                calorie_adherence: cal,
                protein_adherence: protein,
                carb_adherence: carb,
                fat_adherence: fat,
                water_liters: water,
                micronutrients: micros
                    .into_iter()
                    .enumerate()
                    .map(|(j, pct)| (format!("nutrient_{}", j), pct))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect();

        let score = NutritionScorer.score(&samples).unwrap();
        prop_assert!((0.0..=100.0).contains(&score.score));
    }

    #[test]
    fn prop_stress_score_bounded(raw in prop::collection::vec(stress_sample(), 1..30)) {
        let samples: Vec<StressSample> = raw
            .into_iter()
            .enumerate()
            .map(|(i, (cortisol, rmssd, baseline, perceived, mood))| StressSample {
                date: date(i),
                cortisol,
                hrv_rmssd: rmssd,
                hrv_baseline: baseline,
                perceived_stress: perceived,
                mood,
            })
            .collect();

        let score = StressScorer.score(&samples).unwrap();
        prop_assert!((0.0..=100.0).contains(&score.score));
    }

    #[test]
    fn prop_workload_score_and_series_bounded(raw in prop::collection::vec(workload_sample(), 1..60)) {
        let samples: Vec<WorkloadSample> = raw
            .into_iter()
            .enumerate()
            .map(|(i, (minutes, intensity, rpe))| WorkloadSample {
                date: date(i),
                duration_minutes: minutes,
                intensity,
                rpe,
            })
            .collect();

        let score = WorkloadScorer.score(&samples).unwrap();
        prop_assert!((0.0..=100.0).contains(&score.score));

        let series = WorkloadScorer.daily_series(&samples);
        prop_assert_eq!(series.len(), samples.len());
        prop_assert!(series.iter().all(|(_, s)| (0.0..=100.0).contains(s)));
    }

    #[test]
    fn prop_weighted_score_bounded(
        sleep in prop::option::of(-50.0f64..150.0),
        nutrition in prop::option::of(-50.0f64..150.0),
        stress in prop::option::of(-50.0f64..150.0),
        workload in prop::option::of(-50.0f64..150.0),
    ) {
        use recoveryrs::Domain;
        let present: Vec<(Domain, f64)> = [
            (Domain::Sleep, sleep),
            (Domain::Nutrition, nutrition),
            (Domain::Stress, stress),
            (Domain::Workload, workload),
        ]
        .into_iter()
        .filter_map(|(d, s)| s.map(|s| (d, s)))
        .collect();

        let expect_some = !present.is_empty();
        match aggregator::weighted_score(present) {
            Some(score) => prop_assert!((0.0..=100.0).contains(&score)),
            None => prop_assert!(!expect_some),
        }
    }

    #[test]
    fn prop_trend_forecast_bounded(values in prop::collection::vec(0.0f64..=100.0, 0..40)) {
        let summary = TrendSummary::from_series(&values);
        prop_assert!((0.0..=100.0).contains(&summary.forecast_7d));
        prop_assert!(summary.slope.is_finite());
        prop_assert!(summary.improvement.abs() <= 100.0);
    }

    #[test]
    fn prop_linear_series_recovers_slope(start in 0.0f64..50.0, step in -2.0f64..2.0, n in 2usize..30) {
        let values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
        prop_assert!((trend::slope(&values) - step).abs() < 1e-6);
    }
}
