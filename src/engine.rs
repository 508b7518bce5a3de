//! Recovery engine facade
//!
//! [`RecoveryEngine`] wires the injected provider, cache and probability
//! sampler to the pure scoring modules. Only `analyze_recovery` touches the
//! cache; projection, injury risk and comparative analysis are computed fresh
//! on every call.

use crate::aggregator;
use crate::cache::{AnalysisKind, CacheMetrics, ResultCache};
use crate::clock::Clock;
use crate::comparative::{self, AthleteMetrics, ComparativeAnalysis};
use crate::config::{EngineConfig, ProbabilityMode};
use crate::error::{ensure_bounded, EngineError, InputError, Result};
use crate::injury::{
    self, InjuryRiskAssessment, InjuryRiskFactors, MidpointSampler, ProbabilitySampler,
    RandomSampler,
};
use crate::models::{Domain, DomainScore, RecoveryAnalysis};
use crate::provider::MetricSampleProvider;
use crate::scorers::workload::CHRONIC_WINDOW_DAYS;
use crate::scorers::{DomainScorer, NutritionScorer, SleepScorer, StressScorer, WorkloadScorer};
use crate::trajectory::{self, TrajectoryFeatures, TrajectoryPrediction};
use crate::trend::TrendSummary;
use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One dated point of a score series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub score: f64,
}

/// Daily series and its trend summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTrend {
    pub series: Vec<TrendPoint>,
    pub summary: TrendSummary,
}

impl DomainTrend {
    fn from_series(series: Vec<(NaiveDate, f64)>) -> Self {
        let values: Vec<f64> = series.iter().map(|(_, score)| *score).collect();
        Self {
            summary: TrendSummary::from_series(&values),
            series: series
                .into_iter()
                .map(|(date, score)| TrendPoint { date, score })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryTrends {
    pub athlete_id: String,
    pub days: u32,
    pub generated_at: DateTime<Utc>,
    /// Domains without samples are absent
    pub domains: BTreeMap<Domain, DomainTrend>,
    /// Weighted composite per date, `None` when no domain has samples
    pub overall: Option<DomainTrend>,
}

/// Outcome of a parallel batch analysis
#[derive(Debug)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration_ms: u128,
    /// Per-athlete results, in input order
    pub results: Vec<(String, Result<Arc<RecoveryAnalysis>>)>,
}

impl BatchSummary {
    pub fn is_fully_successful(&self) -> bool {
        self.failed == 0
    }
}

pub struct RecoveryEngine {
    provider: Arc<dyn MetricSampleProvider>,
    cache: Arc<ResultCache>,
    sampler: Arc<dyn ProbabilitySampler>,
    config: EngineConfig,
}

impl RecoveryEngine {
    pub fn new(
        provider: Arc<dyn MetricSampleProvider>,
        cache: Arc<ResultCache>,
        sampler: Arc<dyn ProbabilitySampler>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            sampler,
            config,
        }
    }

    /// Build the cache and sampler described by `config`
    pub fn from_config(
        provider: Arc<dyn MetricSampleProvider>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(ResultCache::with_ttl(clock, config.cache_ttl()));
        let sampler: Arc<dyn ProbabilitySampler> = match (config.risk.probability_mode, config.risk.seed) {
            (ProbabilityMode::Midpoint, _) => Arc::new(MidpointSampler),
            (ProbabilityMode::Random, Some(seed)) => Arc::new(RandomSampler::seeded(seed)),
            (ProbabilityMode::Random, None) => Arc::new(RandomSampler::from_entropy()),
        };

        Ok(Self::new(provider, cache, sampler, config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    /// Start the background sweeper if an interval is configured
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_sweeper(&self) -> Option<tokio::task::JoinHandle<()>> {
        match self.config.cache.sweep_interval_secs {
            0 => None,
            secs => Some(self.cache.spawn_sweeper(std::time::Duration::from_secs(secs))),
        }
    }

    fn check_timeframe(&self, days: u32) -> Result<()> {
        let max = self.config.analysis.max_timeframe_days;
        if days == 0 || days > max {
            return Err(InputError::InvalidTimeframe { days, max }.into());
        }
        Ok(())
    }

    /// Composite recovery analysis, served from cache while fresh
    ///
    /// A cached analysis for a different timeframe counts as a miss and is
    /// replaced.
    pub fn analyze_recovery(&self, athlete_id: &str, timeframe_days: u32) -> Result<Arc<RecoveryAnalysis>> {
        self.check_timeframe(timeframe_days)?;

        if let Some(cached) = self.cache.get(athlete_id, AnalysisKind::Recovery) {
            if cached.timeframe_days == timeframe_days {
                return Ok(cached);
            }
            debug!(
                athlete_id,
                cached_days = cached.timeframe_days,
                requested_days = timeframe_days,
                "Cached analysis covers a different timeframe"
            );
        }

        let analysis = Arc::new(self.compute_analysis(athlete_id, timeframe_days)?);
        self.cache
            .put_default(athlete_id, AnalysisKind::Recovery, Arc::clone(&analysis));

        info!(
            athlete_id,
            timeframe_days,
            optimization_score = analysis.optimization_score,
            domains = analysis.domain_scores.len(),
            risk_factors = analysis.risk_factors.len(),
            "Recovery analysis completed"
        );

        Ok(analysis)
    }

    fn compute_analysis(&self, athlete_id: &str, days: u32) -> Result<RecoveryAnalysis> {
        let provider = self.provider.as_ref();

        let sleep = fetch(Domain::Sleep, athlete_id, || provider.sleep_samples(athlete_id, days))?;
        let nutrition = fetch(Domain::Nutrition, athlete_id, || {
            provider.nutrition_samples(athlete_id, days)
        })?;
        let stress = fetch(Domain::Stress, athlete_id, || provider.stress_samples(athlete_id, days))?;
        let workload = fetch(Domain::Workload, athlete_id, || {
            provider.workload_samples(athlete_id, workload_history_days(days))
        })?;

        let domain_scores: BTreeMap<Domain, DomainScore> = [
            SleepScorer.score(&sleep),
            NutritionScorer.score(&nutrition),
            StressScorer.score(&stress),
            WorkloadScorer.score(&workload),
        ]
        .into_iter()
        .flatten()
        .map(|score| (score.domain, score))
        .collect();

        for score in domain_scores.values() {
            ensure_bounded(&format!("{} score", score.domain), score.score, 0.0, 100.0)?;
        }

        let optimization_score = aggregator::optimization_score(&domain_scores);
        ensure_bounded("optimization score", f64::from(optimization_score), 0.0, 100.0)?;

        Ok(RecoveryAnalysis {
            id: Uuid::new_v4(),
            athlete_id: athlete_id.to_string(),
            timeframe_days: days,
            timestamp: self.cache.now(),
            recommendations: aggregator::pooled_recommendations(&domain_scores),
            risk_factors: aggregator::risk_factors(&domain_scores),
            optimization_score,
            domain_scores,
        })
    }

    /// Analyze many athletes in parallel
    pub fn analyze_recovery_batch(&self, athlete_ids: &[String], timeframe_days: u32) -> BatchSummary {
        let start = Instant::now();

        let results: Vec<(String, Result<Arc<RecoveryAnalysis>>)> = athlete_ids
            .par_iter()
            .map(|id| (id.clone(), self.analyze_recovery(id, timeframe_days)))
            .collect();

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        let summary = BatchSummary {
            total: results.len(),
            succeeded: results.len() - failed,
            failed,
            duration_ms: start.elapsed().as_millis(),
            results,
        };

        info!(
            total = summary.total,
            failed = summary.failed,
            duration_ms = summary.duration_ms as u64,
            "Batch recovery analysis completed"
        );
        summary
    }

    pub fn predict_performance_trajectory(
        &self,
        features: &TrajectoryFeatures,
        horizon_periods: u32,
    ) -> Result<TrajectoryPrediction> {
        let prediction = trajectory::predict(
            features,
            horizon_periods,
            self.config.analysis.max_horizon_periods,
        )?;
        debug!(
            horizon_periods,
            peak_score = prediction.insights.peak_score,
            direction = %prediction.insights.direction,
            "Trajectory projected"
        );
        Ok(prediction)
    }

    pub fn predict_injury_risk(&self, factors: &InjuryRiskFactors) -> Result<InjuryRiskAssessment> {
        injury::assess(factors, self.sampler.as_ref())
    }

    pub fn generate_comparative_analysis(
        &self,
        athlete_id: &str,
        peer_group: &[AthleteMetrics],
    ) -> Result<ComparativeAnalysis> {
        let analysis = comparative::analyze(athlete_id, peer_group)?;
        debug!(
            athlete_id,
            peers = analysis.peer_group_size,
            strengths = analysis.strengths.len(),
            "Comparative analysis completed"
        );
        Ok(analysis)
    }

    /// Per-domain daily trends plus the weighted composite
    pub fn get_recovery_trends(&self, athlete_id: &str, days: u32) -> Result<RecoveryTrends> {
        self.check_timeframe(days)?;
        let provider = self.provider.as_ref();

        let series: [(Domain, Vec<(NaiveDate, f64)>); 4] = [
            (
                Domain::Sleep,
                SleepScorer.daily_series(&fetch(Domain::Sleep, athlete_id, || {
                    provider.sleep_samples(athlete_id, days)
                })?),
            ),
            (
                Domain::Nutrition,
                NutritionScorer.daily_series(&fetch(Domain::Nutrition, athlete_id, || {
                    provider.nutrition_samples(athlete_id, days)
                })?),
            ),
            (
                Domain::Stress,
                StressScorer.daily_series(&fetch(Domain::Stress, athlete_id, || {
                    provider.stress_samples(athlete_id, days)
                })?),
            ),
            (Domain::Workload, {
                let history = fetch(Domain::Workload, athlete_id, || {
                    provider.workload_samples(athlete_id, workload_history_days(days))
                })?;
                let mut points = WorkloadScorer.daily_series(&history);
                points.drain(..points.len().saturating_sub(days as usize));
                points
            }),
        ];

        let mut by_date: BTreeMap<NaiveDate, Vec<(Domain, f64)>> = BTreeMap::new();
        for (domain, points) in &series {
            for (date, score) in points {
                by_date.entry(*date).or_default().push((*domain, *score));
            }
        }

        let composite: Vec<(NaiveDate, f64)> = by_date
            .into_iter()
            .filter_map(|(date, scores)| {
                aggregator::weighted_score(scores).map(|score| (date, (score * 10.0).round() / 10.0))
            })
            .collect();

        let domains: BTreeMap<Domain, DomainTrend> = series
            .into_iter()
            .filter(|(_, points)| !points.is_empty())
            .map(|(domain, points)| (domain, DomainTrend::from_series(points)))
            .collect();

        let overall = (!composite.is_empty()).then(|| DomainTrend::from_series(composite));

        Ok(RecoveryTrends {
            athlete_id: athlete_id.to_string(),
            days,
            generated_at: self.cache.now(),
            domains,
            overall,
        })
    }

    /// Drop cached analyses for one athlete, or all of them; returns the count removed
    pub fn clear_cache(&self, athlete_id: Option<&str>) -> usize {
        let removed = match athlete_id {
            Some(id) => self.cache.invalidate(id),
            None => {
                let count = self.cache.len();
                self.cache.clear();
                count
            }
        };
        debug!(athlete_id, removed, "Cache cleared");
        removed
    }
}

/// Workload is always fetched with enough history to fill the chronic window
fn workload_history_days(days: u32) -> u32 {
    days.max(CHRONIC_WINDOW_DAYS as u32)
}

/// Run one provider fetch, logging failures before propagating them unchanged
fn fetch<T>(
    domain: Domain,
    athlete_id: &str,
    request: impl FnOnce() -> std::result::Result<Vec<T>, crate::error::ProviderError>,
) -> Result<Vec<T>> {
    request().map_err(|error| {
        warn!(%domain, athlete_id, %error, "Metric provider failed");
        EngineError::Provider(error)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::SleepSample;
    use crate::provider::InMemoryProvider;
    use chrono::TimeZone;

    fn engine_with(provider: Arc<InMemoryProvider>) -> RecoveryEngine {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap()));
        let mut config = EngineConfig::default();
        config.risk.probability_mode = ProbabilityMode::Midpoint;
        RecoveryEngine::from_config(provider, clock, config).unwrap()
    }

    fn sleep_only(athlete_id: &str) -> Arc<InMemoryProvider> {
        let provider = Arc::new(InMemoryProvider::new());
        let samples = (1..=7)
            .map(|day| SleepSample {
                date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                hours: 8.0,
                quality: 90.0,
                rem_percentage: 22.0,
                disturbances: 0,
            })
            .collect();
        provider.set_sleep(athlete_id, samples);
        provider
    }

    #[test]
    fn test_rejects_invalid_timeframe() {
        let engine = engine_with(sleep_only("a1"));
        assert!(matches!(
            engine.analyze_recovery("a1", 0),
            Err(EngineError::Input(InputError::InvalidTimeframe { days: 0, .. }))
        ));
        assert!(engine.analyze_recovery("a1", 366).is_err());
        assert!(engine.get_recovery_trends("a1", 0).is_err());
    }

    #[test]
    fn test_timeframe_mismatch_recomputes() {
        let provider = sleep_only("a1");
        let engine = engine_with(Arc::clone(&provider));

        let week = engine.analyze_recovery("a1", 7).unwrap();
        let month = engine.analyze_recovery("a1", 30).unwrap();
        assert!(!Arc::ptr_eq(&week, &month));
        assert_eq!(month.timeframe_days, 30);

        // the newer timeframe replaced the old entry
        let again = engine.analyze_recovery("a1", 30).unwrap();
        assert!(Arc::ptr_eq(&month, &again));
        assert_eq!(engine.cache().len(), 1);
    }

    #[test]
    fn test_sleep_only_analysis() {
        let engine = engine_with(sleep_only("a1"));
        let analysis = engine.analyze_recovery("a1", 7).unwrap();

        assert_eq!(analysis.domain_scores.len(), 1);
        let sleep = &analysis.domain_scores[&Domain::Sleep];
        assert_eq!(analysis.optimization_score, sleep.score.round() as u8);
        assert!(analysis.risk_factors.is_empty());
    }

    #[test]
    fn test_clear_cache_counts() {
        let engine = engine_with(sleep_only("a1"));
        engine.analyze_recovery("a1", 7).unwrap();
        assert_eq!(engine.clear_cache(Some("other")), 0);
        assert_eq!(engine.clear_cache(None), 1);
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_injury_risk_uses_configured_sampler() {
        let engine = engine_with(sleep_only("a1"));
        let assessment = engine
            .predict_injury_risk(&InjuryRiskFactors {
                workload: 40.0,
                recovery_score: 85.0,
                age: 28.0,
                previous_injuries: 0,
                training_intensity: 50.0,
            })
            .unwrap();
        assert!((assessment.probability - 0.075).abs() < 1e-12);
    }

    #[test]
    fn test_comparative_analysis_peer_group_errors() {
        let engine = engine_with(sleep_only("a1"));

        assert!(matches!(
            engine.generate_comparative_analysis("a1", &[]),
            Err(EngineError::Input(InputError::EmptyPeerGroup))
        ));

        let peers = vec![
            AthleteMetrics::new("a1").with_metric("recovery", 80.0),
            AthleteMetrics::new("a2").with_metric("recovery", 60.0),
            AthleteMetrics::new("a3").with_metric("recovery", 70.0),
        ];
        assert!(matches!(
            engine.generate_comparative_analysis("a9", &peers),
            Err(EngineError::Input(InputError::UnknownAthlete { .. }))
        ));

        let analysis = engine.generate_comparative_analysis("a1", &peers).unwrap();
        assert_eq!(analysis.peer_group_size, 3);
        // (2 below + 0.5 for itself) / 3
        assert_eq!(analysis.rankings["recovery"].percentile, 83.3);
        // comparative analysis never touches the cache
        assert!(engine.cache().is_empty());
    }
}
