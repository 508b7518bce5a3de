//! Metric sample providers
//!
//! The engine never fetches raw data itself. Hosts inject a
//! [`MetricSampleProvider`]; its failures surface unchanged as
//! [`ProviderError`]s.
//!
//! Two implementations ship with the crate:
//! - [`InMemoryProvider`]: fixture store for tests and embedding
//! - [`SyntheticProvider`]: seeded, deterministic demo readings per athlete and day

use crate::error::ProviderError;
use crate::models::{
    Domain, NutritionSample, SleepSample, StressSample, WorkloadSample,
};
use crate::scorers::tail;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Source of per-domain samples, ordered oldest to newest
pub trait MetricSampleProvider: Send + Sync {
    fn sleep_samples(&self, athlete_id: &str, days: u32) -> Result<Vec<SleepSample>, ProviderError>;

    fn nutrition_samples(
        &self,
        athlete_id: &str,
        days: u32,
    ) -> Result<Vec<NutritionSample>, ProviderError>;

    fn stress_samples(&self, athlete_id: &str, days: u32) -> Result<Vec<StressSample>, ProviderError>;

    fn workload_samples(
        &self,
        athlete_id: &str,
        days: u32,
    ) -> Result<Vec<WorkloadSample>, ProviderError>;
}

//
// ============================================================================
// IN-MEMORY PROVIDER
// ============================================================================
//

#[derive(Debug, Clone, Default)]
struct AthleteRecords {
    sleep: Vec<SleepSample>,
    nutrition: Vec<NutritionSample>,
    stress: Vec<StressSample>,
    workload: Vec<WorkloadSample>,
}

/// Fixture-backed provider
///
/// Returns the most recent `days` samples per domain. Domains can be switched
/// into a failing state to exercise error propagation.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    records: RwLock<HashMap<String, AthleteRecords>>,
    failing: RwLock<HashSet<Domain>>,
    fetches: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sleep(&self, athlete_id: &str, mut samples: Vec<SleepSample>) {
        samples.sort_by_key(|s| s.date);
        self.with_athlete(athlete_id, |records| records.sleep = samples);
    }

    pub fn set_nutrition(&self, athlete_id: &str, mut samples: Vec<NutritionSample>) {
        samples.sort_by_key(|s| s.date);
        self.with_athlete(athlete_id, |records| records.nutrition = samples);
    }

    pub fn set_stress(&self, athlete_id: &str, mut samples: Vec<StressSample>) {
        samples.sort_by_key(|s| s.date);
        self.with_athlete(athlete_id, |records| records.stress = samples);
    }

    pub fn set_workload(&self, athlete_id: &str, mut samples: Vec<WorkloadSample>) {
        samples.sort_by_key(|s| s.date);
        self.with_athlete(athlete_id, |records| records.workload = samples);
    }

    /// Make every request for `domain` fail until [`recover`](Self::recover)
    pub fn fail_domain(&self, domain: Domain) {
        self.failing
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(domain);
    }

    pub fn recover(&self, domain: Domain) {
        self.failing
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&domain);
    }

    /// Number of domain fetches served (including failed ones)
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn with_athlete(&self, athlete_id: &str, update: impl FnOnce(&mut AthleteRecords)) {
        let mut records = self.records.write().unwrap_or_else(|p| p.into_inner());
        update(records.entry(athlete_id.to_string()).or_default());
    }

    fn fetch<T: Clone>(
        &self,
        domain: Domain,
        athlete_id: &str,
        days: u32,
        select: impl FnOnce(&AthleteRecords) -> &Vec<T>,
    ) -> Result<Vec<T>, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if self
            .failing
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains(&domain)
        {
            return Err(ProviderError::Unavailable {
                domain,
                athlete_id: athlete_id.to_string(),
                reason: "provider marked as failing".to_string(),
            });
        }

        let records = self.records.read().unwrap_or_else(|p| p.into_inner());
        let athlete = records
            .get(athlete_id)
            .ok_or_else(|| ProviderError::AthleteNotFound {
                athlete_id: athlete_id.to_string(),
            })?;

        Ok(tail(select(athlete), days as usize).to_vec())
    }
}

impl MetricSampleProvider for InMemoryProvider {
    fn sleep_samples(&self, athlete_id: &str, days: u32) -> Result<Vec<SleepSample>, ProviderError> {
        self.fetch(Domain::Sleep, athlete_id, days, |r| &r.sleep)
    }

    fn nutrition_samples(
        &self,
        athlete_id: &str,
        days: u32,
    ) -> Result<Vec<NutritionSample>, ProviderError> {
        self.fetch(Domain::Nutrition, athlete_id, days, |r| &r.nutrition)
    }

    fn stress_samples(&self, athlete_id: &str, days: u32) -> Result<Vec<StressSample>, ProviderError> {
        self.fetch(Domain::Stress, athlete_id, days, |r| &r.stress)
    }

    fn workload_samples(
        &self,
        athlete_id: &str,
        days: u32,
    ) -> Result<Vec<WorkloadSample>, ProviderError> {
        self.fetch(Domain::Workload, athlete_id, days, |r| &r.workload)
    }
}

//
// ============================================================================
// SYNTHETIC PROVIDER
// ============================================================================
//

/// Micronutrients tracked by the synthetic nutrition feed
pub const SYNTHETIC_MICRONUTRIENTS: [&str; 6] = [
    "calcium",
    "iron",
    "magnesium",
    "vitamin_b12",
    "vitamin_d",
    "zinc",
];

/// Deterministic demo provider
///
/// Every reading is drawn from a [`ChaCha8Rng`] seeded by the provider seed,
/// the athlete id, the domain and the calendar day, so the same day always
/// yields the same sample regardless of the requested window.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    end_date: NaiveDate,
}

impl SyntheticProvider {
    /// `end_date` is the most recent day of every returned window
    pub fn new(seed: u64, end_date: NaiveDate) -> Self {
        Self { seed, end_date }
    }

    fn dates(&self, days: u32) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..days as i64)
            .rev()
            .map(move |offset| self.end_date - Duration::days(offset))
    }

    fn rng(&self, athlete_id: &str, domain: Domain, date: Option<NaiveDate>) -> ChaCha8Rng {
        let mut hash = fnv1a(self.seed, athlete_id.as_bytes());
        hash = fnv1a(hash, domain.to_string().as_bytes());
        if let Some(date) = date {
            hash = fnv1a(hash, &date.num_days_from_ce().to_le_bytes());
        }
        ChaCha8Rng::seed_from_u64(hash)
    }

    /// Stable per-athlete HRV baseline in milliseconds
    fn hrv_baseline(&self, athlete_id: &str) -> f64 {
        self.rng(athlete_id, Domain::Stress, None).gen_range(45.0..75.0)
    }
}

/// FNV-1a over `bytes`, continuing from `state`
fn fnv1a(state: u64, bytes: &[u8]) -> u64 {
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(state ^ 0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

impl MetricSampleProvider for SyntheticProvider {
    fn sleep_samples(&self, athlete_id: &str, days: u32) -> Result<Vec<SleepSample>, ProviderError> {
        Ok(self
            .dates(days)
            .map(|date| {
                let mut rng = self.rng(athlete_id, Domain::Sleep, Some(date));
                SleepSample {
                    date,
                    hours: rng.gen_range(5.5..9.5),
                    quality: rng.gen_range(55.0..95.0),
                    rem_percentage: rng.gen_range(15.0..28.0),
                    disturbances: rng.gen_range(0..=5),
                }
            })
            .collect())
    }

    fn nutrition_samples(
        &self,
        athlete_id: &str,
        days: u32,
    ) -> Result<Vec<NutritionSample>, ProviderError> {
        Ok(self
            .dates(days)
            .map(|date| {
                let mut rng = self.rng(athlete_id, Domain::Nutrition, Some(date));
                NutritionSample {
                    date,
                    calorie_adherence: rng.gen_range(80.0..115.0),
                    protein_adherence: rng.gen_range(70.0..135.0),
                    carb_adherence: rng.gen_range(75.0..120.0),
                    fat_adherence: rng.gen_range(75.0..125.0),
                    water_liters: rng.gen_range(1.8..4.2),
                    micronutrients: SYNTHETIC_MICRONUTRIENTS
                        .iter()
                        .map(|name| (name.to_string(), rng.gen_range(55.0..120.0)))
                        .collect(),
                }
            })
            .collect())
    }

    fn stress_samples(&self, athlete_id: &str, days: u32) -> Result<Vec<StressSample>, ProviderError> {
        let baseline = self.hrv_baseline(athlete_id);
        Ok(self
            .dates(days)
            .map(|date| {
                let mut rng = self.rng(athlete_id, Domain::Stress, Some(date));
                StressSample {
                    date,
                    cortisol: rng.gen_range(8.0..24.0),
                    hrv_rmssd: baseline * rng.gen_range(0.75..1.15),
                    hrv_baseline: baseline,
                    perceived_stress: rng.gen_range(2.0..8.0),
                    mood: rng.gen_range(3.0..9.0),
                }
            })
            .collect())
    }

    fn workload_samples(
        &self,
        athlete_id: &str,
        days: u32,
    ) -> Result<Vec<WorkloadSample>, ProviderError> {
        Ok(self
            .dates(days)
            .map(|date| {
                let mut rng = self.rng(athlete_id, Domain::Workload, Some(date));
                if date.weekday() == Weekday::Sun || rng.gen_bool(0.1) {
                    WorkloadSample {
                        date,
                        duration_minutes: 0.0,
                        intensity: 0.0,
                        rpe: 0.0,
                    }
                } else {
                    WorkloadSample {
                        date,
                        duration_minutes: rng.gen_range(45.0..120.0),
                        intensity: rng.gen_range(50.0..90.0),
                        rpe: rng.gen_range(4.0..9.0),
                    }
                }
            })
            .collect())
    }
}
