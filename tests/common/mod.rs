//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use recoveryrs::{
    EngineConfig, InMemoryProvider, ManualClock, NutritionSample, ProbabilityMode, RecoveryEngine,
    SleepSample, StressSample, WorkloadSample,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
}

pub fn day(offset: i64) -> NaiveDate {
    start_date() + Duration::days(offset)
}

pub fn healthy_sleep(days: i64) -> Vec<SleepSample> {
    (0..days)
        .map(|i| SleepSample {
            date: day(i),
            hours: 8.0,
            quality: 90.0,
            rem_percentage: 22.0,
            disturbances: 1,
        })
        .collect()
}

pub fn healthy_nutrition(days: i64) -> Vec<NutritionSample> {
    (0..days)
        .map(|i| NutritionSample {
            date: day(i),
            calorie_adherence: 100.0,
            protein_adherence: 110.0,
            carb_adherence: 100.0,
            fat_adherence: 100.0,
            water_liters: 3.5,
            micronutrients: BTreeMap::from([
                ("iron".to_string(), 100.0),
                ("vitamin_d".to_string(), 95.0),
            ]),
        })
        .collect()
}

pub fn healthy_stress(days: i64) -> Vec<StressSample> {
    (0..days)
        .map(|i| StressSample {
            date: day(i),
            cortisol: 15.0,
            hrv_rmssd: 62.0,
            hrv_baseline: 60.0,
            perceived_stress: 3.0,
            mood: 8.0,
        })
        .collect()
}

/// Six sessions of 60 min at RPE 6, then a rest day, repeated
pub fn steady_workload(days: i64) -> Vec<WorkloadSample> {
    (0..days)
        .map(|i| {
            let rest = i % 7 == 6;
            WorkloadSample {
                date: day(i),
                duration_minutes: if rest { 0.0 } else { 60.0 },
                intensity: if rest { 0.0 } else { 70.0 },
                rpe: if rest { 0.0 } else { 6.0 },
            }
        })
        .collect()
}

pub fn healthy_provider(athlete_id: &str) -> Arc<InMemoryProvider> {
    let provider = Arc::new(InMemoryProvider::new());
    provider.set_sleep(athlete_id, healthy_sleep(28));
    provider.set_nutrition(athlete_id, healthy_nutrition(28));
    provider.set_stress(athlete_id, healthy_stress(28));
    provider.set_workload(athlete_id, steady_workload(28));
    provider
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap(),
    ))
}

pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.risk.probability_mode = ProbabilityMode::Midpoint;
    config
}

pub fn engine(provider: Arc<InMemoryProvider>, clock: Arc<ManualClock>) -> RecoveryEngine {
    RecoveryEngine::from_config(provider, clock, test_config()).unwrap()
}
