use chrono::{NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recoveryrs::trend::TrendSummary;
use recoveryrs::{
    DomainScorer, EngineConfig, InjuryRiskFactors, ManualClock, MetricSampleProvider,
    ProbabilityMode, RecoveryEngine, SleepScorer, SyntheticProvider, TrajectoryFeatures,
    WorkloadScorer,
};
use std::sync::Arc;

/// Performance benchmarks for the recovery scoring engine
///
/// Scorers and trends are measured over growing windows; the engine is
/// measured both on cold analyses and on cache hits.

fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn bench_engine(provider: Arc<SyntheticProvider>) -> RecoveryEngine {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap()));
    let mut config = EngineConfig::default();
    config.risk.probability_mode = ProbabilityMode::Midpoint;
    RecoveryEngine::from_config(provider, clock, config).unwrap()
}

fn bench_domain_scorers(c: &mut Criterion) {
    let provider = SyntheticProvider::new(42, end_date());
    let mut group = c.benchmark_group("Domain Scoring");

    for &days in &[7u32, 30, 90, 365] {
        let sleep = provider.sleep_samples("bench", days).unwrap();
        let workload = provider.workload_samples("bench", days).unwrap();

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(BenchmarkId::new("sleep_score", days), &sleep, |b, samples| {
            b.iter(|| SleepScorer.score(black_box(samples)));
        });
        group.bench_with_input(
            BenchmarkId::new("workload_score", days),
            &workload,
            |b, samples| {
                b.iter(|| WorkloadScorer.score(black_box(samples)));
            },
        );
    }

    group.finish();
}

fn bench_daily_series(c: &mut Criterion) {
    let provider = SyntheticProvider::new(42, end_date());
    let mut group = c.benchmark_group("Daily Series");

    for &days in &[30u32, 90, 365] {
        let workload = provider.workload_samples("bench", days).unwrap();

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(
            BenchmarkId::new("workload_series_and_trend", days),
            &workload,
            |b, samples| {
                b.iter(|| {
                    let series = WorkloadScorer.daily_series(black_box(samples));
                    let values: Vec<f64> = series.iter().map(|(_, s)| *s).collect();
                    TrendSummary::from_series(&values)
                });
            },
        );
    }

    group.finish();
}

fn bench_analyze_recovery(c: &mut Criterion) {
    let provider = Arc::new(SyntheticProvider::new(42, end_date()));
    let mut group = c.benchmark_group("Recovery Analysis");

    group.bench_function("cold_30_days", |b| {
        let engine = bench_engine(Arc::clone(&provider));
        b.iter(|| {
            engine.clear_cache(None);
            engine.analyze_recovery(black_box("athlete-1"), 30).unwrap()
        });
    });

    group.bench_function("cached_30_days", |b| {
        let engine = bench_engine(Arc::clone(&provider));
        engine.analyze_recovery("athlete-1", 30).unwrap();
        b.iter(|| engine.analyze_recovery(black_box("athlete-1"), 30).unwrap());
    });

    for &athletes in &[10usize, 100] {
        let ids: Vec<String> = (0..athletes).map(|i| format!("athlete-{}", i)).collect();
        group.throughput(Throughput::Elements(athletes as u64));
        group.bench_with_input(BenchmarkId::new("batch_cold", athletes), &ids, |b, ids| {
            let engine = bench_engine(Arc::clone(&provider));
            b.iter(|| {
                engine.clear_cache(None);
                engine.analyze_recovery_batch(black_box(ids), 30)
            });
        });
    }

    group.finish();
}

fn bench_predictions(c: &mut Criterion) {
    let engine = bench_engine(Arc::new(SyntheticProvider::new(42, end_date())));
    let features = TrajectoryFeatures {
        age: 31.0,
        experience: 6.0,
        training_hours: 12.0,
        recovery_score: 68.0,
        injury_history: 1,
    };
    let risk = InjuryRiskFactors {
        workload: 72.0,
        recovery_score: 64.0,
        age: 31.0,
        previous_injuries: 1,
        training_intensity: 78.0,
    };

    let mut group = c.benchmark_group("Predictions");
    group.bench_function("trajectory_52_periods", |b| {
        b.iter(|| engine.predict_performance_trajectory(black_box(&features), 52).unwrap());
    });
    group.bench_function("injury_risk", |b| {
        b.iter(|| engine.predict_injury_risk(black_box(&risk)).unwrap());
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_domain_scorers,
    bench_daily_series,
    bench_analyze_recovery,
    bench_predictions
);
criterion_main!(benches);
