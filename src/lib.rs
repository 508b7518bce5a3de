// Library interface for RecoveryRS modules
// The CLI, integration tests and benchmarks all go through this crate root

pub mod aggregator;
pub mod cache;
pub mod clock;
pub mod comparative;
pub mod config;
pub mod engine;
pub mod error;
pub mod injury;
pub mod logging;
pub mod models;
pub mod provider;
pub mod rubric;
pub mod scorers;
pub mod trajectory;
pub mod trend;

// Re-export commonly used types for convenience
pub use models::*;
pub use cache::{AnalysisKind, CacheMetrics, ResultCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use comparative::{AthleteMetrics, ComparativeAnalysis, PerformanceTier};
pub use config::{EngineConfig, ProbabilityMode};
pub use engine::{BatchSummary, DomainTrend, RecoveryEngine, RecoveryTrends, TrendPoint};
pub use error::{ComputationError, EngineError, InputError, ProviderError, Result};
pub use injury::{
    InjuryRiskAssessment, InjuryRiskFactors, MidpointSampler, ProbabilitySampler, RandomSampler,
    RiskLevel,
};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use provider::{InMemoryProvider, MetricSampleProvider, SyntheticProvider};
pub use scorers::{DomainScorer, NutritionScorer, SleepScorer, StressScorer, WorkloadScorer};
pub use trajectory::{TrajectoryFeatures, TrajectoryPrediction, TrajectoryRequest};
pub use trend::{TrendDirection, TrendSummary};
