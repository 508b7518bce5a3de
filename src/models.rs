//! Core value types shared by the scoring engine
//!
//! Everything in here is a plain value object: samples supplied by providers,
//! per-domain scores, recommendations, risk factors and the cached
//! [`RecoveryAnalysis`] aggregate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Independent facet of athlete recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Sleep,
    Nutrition,
    Stress,
    Workload,
}

impl Domain {
    /// All domains in aggregation order
    pub const ALL: [Domain; 4] = [
        Domain::Sleep,
        Domain::Nutrition,
        Domain::Stress,
        Domain::Workload,
    ];

    /// Fixed weight of this domain in the composite optimization score
    pub fn weight(&self) -> f64 {
        match self {
            Domain::Sleep => 0.30,
            Domain::Nutrition => 0.25,
            Domain::Stress => 0.25,
            Domain::Workload => 0.20,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Sleep => write!(f, "sleep"),
            Domain::Nutrition => write!(f, "nutrition"),
            Domain::Stress => write!(f, "stress"),
            Domain::Workload => write!(f, "workload"),
        }
    }
}

/// Letter grade attached to a domain score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Map a 0-100 score onto a letter grade
    ///
    /// A ≥ 90, B ≥ 80, C ≥ 70, D ≥ 60, F otherwise.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// Recommendation urgency, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

/// Risk factor severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Actionable advice produced by a scorer, classifier or projector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Machine-readable category, e.g. `sleep_duration`
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: Priority,
    pub message: String,
    pub actions: Vec<String>,
}

impl Recommendation {
    pub fn new(
        kind: impl Into<String>,
        priority: Priority,
        message: impl Into<String>,
        actions: &[&str],
    ) -> Self {
        Self {
            kind: kind.into(),
            priority,
            message: message.into(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Stable sort, most urgent first
pub fn sort_by_priority(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Explanation of something that raises recovery or injury risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub description: String,
    pub impact: String,
}

impl RiskFactor {
    pub fn new(
        kind: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        impact: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            severity,
            description: description.into(),
            impact: impact.into(),
        }
    }
}

/// Stable sort, most severe first
pub fn sort_by_severity(factors: &mut [RiskFactor]) {
    factors.sort_by(|a, b| b.severity.cmp(&a.severity));
}

/// Score for one recovery domain over one lookback window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: Domain,

    /// Weighted rubric score (0-100)
    pub score: f64,

    pub grade: Grade,

    /// Window-level metrics the score was derived from
    pub raw_metrics: BTreeMap<String, f64>,

    /// Every recommendation whose threshold rule fired, unsorted
    pub recommendations: Vec<Recommendation>,
}

impl DomainScore {
    /// Look up a raw metric by name
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.raw_metrics.get(name).copied()
    }
}

/// Composite recovery analysis for one athlete, the payload of the result cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryAnalysis {
    pub id: Uuid,
    pub athlete_id: String,
    pub timeframe_days: u32,
    pub timestamp: DateTime<Utc>,
    pub domain_scores: BTreeMap<Domain, DomainScore>,

    /// Weighted mean over present domains, rounded (0-100)
    pub optimization_score: u8,

    /// Pooled from domains scoring below 70, most urgent first
    pub recommendations: Vec<Recommendation>,

    /// Most severe first
    pub risk_factors: Vec<RiskFactor>,
}

//
// ============================================================================
// METRIC SAMPLES
// ============================================================================
//

/// One night of sleep as reported by a wearable or sleep diary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSample {
    pub date: NaiveDate,

    /// Total sleep in hours
    pub hours: f64,

    /// Device or self-reported quality (0-100)
    pub quality: f64,

    /// Share of sleep spent in REM (0-100)
    pub rem_percentage: f64,

    /// Number of awakenings or disturbances during the night
    pub disturbances: u32,
}

/// One day of nutrition intake relative to the athlete's targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionSample {
    pub date: NaiveDate,

    /// Calories consumed as % of target
    pub calorie_adherence: f64,

    /// Protein consumed as % of target
    pub protein_adherence: f64,

    /// Carbohydrate consumed as % of target
    pub carb_adherence: f64,

    /// Fat consumed as % of target
    pub fat_adherence: f64,

    /// Water intake in liters
    pub water_liters: f64,

    /// Micronutrient intake as % of recommended daily allowance
    pub micronutrients: BTreeMap<String, f64>,
}

/// Morning stress markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressSample {
    pub date: NaiveDate,

    /// Morning salivary cortisol in µg/dL
    pub cortisol: f64,

    /// RMSSD in milliseconds
    pub hrv_rmssd: f64,

    /// Personal baseline RMSSD in milliseconds
    pub hrv_baseline: f64,

    /// Self-reported stress (1-10, higher is worse)
    pub perceived_stress: f64,

    /// Self-reported mood (1-10, higher is better)
    pub mood: f64,
}

/// Training load for one day; zero minutes marks a rest day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSample {
    pub date: NaiveDate,
    pub duration_minutes: f64,

    /// Session intensity (0-100)
    pub intensity: f64,

    /// Rate of perceived exertion (1-10)
    pub rpe: f64,
}

impl WorkloadSample {
    /// Session-RPE load (minutes × RPE)
    pub fn load(&self) -> f64 {
        self.duration_minutes * self.rpe
    }

    pub fn is_rest_day(&self) -> bool {
        self.duration_minutes <= 0.0
    }
}
