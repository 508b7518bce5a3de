//! Comparative peer analysis
//!
//! Ranks one athlete against a peer group metric by metric. Higher values are
//! treated as better for every metric. The athlete's own record is part of the
//! group, so a group of one ranks at the 50th percentile.

use crate::error::{InputError, Result};
use crate::scorers::{mean, round_tenth};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};
use std::collections::BTreeMap;
use std::fmt;

/// Percentile at or above which a metric counts as a strength
pub const STRENGTH_PERCENTILE: f64 = 75.0;

/// Percentile below which a metric needs improvement
pub const IMPROVEMENT_PERCENTILE: f64 = 50.0;

/// Number of nearest peers reported
pub const SIMILAR_ATHLETE_COUNT: usize = 3;

/// Named metrics for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteMetrics {
    pub athlete_id: String,
    pub metrics: BTreeMap<String, f64>,
}

impl AthleteMetrics {
    pub fn new(athlete_id: impl Into<String>) -> Self {
        Self {
            athlete_id: athlete_id.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceTier {
    #[serde(rename = "Needs Focus")]
    NeedsFocus,
    Developing,
    Intermediate,
    Advanced,
    Elite,
}

impl PerformanceTier {
    pub fn from_percentile(percentile: f64) -> Self {
        if percentile >= 90.0 {
            PerformanceTier::Elite
        } else if percentile >= 75.0 {
            PerformanceTier::Advanced
        } else if percentile >= 50.0 {
            PerformanceTier::Intermediate
        } else if percentile >= 25.0 {
            PerformanceTier::Developing
        } else {
            PerformanceTier::NeedsFocus
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceTier::Elite => write!(f, "Elite"),
            PerformanceTier::Advanced => write!(f, "Advanced"),
            PerformanceTier::Intermediate => write!(f, "Intermediate"),
            PerformanceTier::Developing => write!(f, "Developing"),
            PerformanceTier::NeedsFocus => write!(f, "Needs Focus"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRanking {
    pub value: f64,
    pub percentile: f64,
    pub tier: PerformanceTier,
    /// Athletes reporting this metric, including the subject
    pub peer_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarAthlete {
    pub athlete_id: String,
    /// Range-normalized Euclidean distance over shared metrics
    pub distance: f64,
    pub shared_metrics: usize,
}

/// Peer distribution of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub mean: f64,
    pub median: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeAnalysis {
    pub athlete_id: String,
    pub peer_group_size: usize,
    pub rankings: BTreeMap<String, MetricRanking>,
    pub similar_athletes: Vec<SimilarAthlete>,
    /// Metric names, highest percentile first
    pub strengths: Vec<String>,
    /// Metric names, lowest percentile first
    pub improvement_areas: Vec<String>,
    pub benchmarks: BTreeMap<String, Benchmark>,
}

/// `(below + 0.5·equal) / n · 100`
pub fn percentile_rank(value: f64, population: &[f64]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let (below, equal) = population.iter().fold((0usize, 0usize), |(below, equal), v| {
        if *v < value {
            (below + 1, equal)
        } else if *v == value {
            (below, equal + 1)
        } else {
            (below, equal)
        }
    });
    (below as f64 + 0.5 * equal as f64) / population.len() as f64 * 100.0
}

/// Mean, median, p75 and p90 of a non-empty sample
pub fn benchmark(values: &[f64]) -> Option<Benchmark> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values.to_vec());
    Some(Benchmark {
        mean: round_tenth(mean(values)),
        median: round_tenth(data.percentile(50)),
        p75: round_tenth(data.percentile(75)),
        p90: round_tenth(data.percentile(90)),
    })
}

fn metric_values<'a>(peer_group: &'a [AthleteMetrics], metric: &'a str) -> impl Iterator<Item = f64> + 'a {
    peer_group
        .iter()
        .filter_map(move |peer| peer.metrics.get(metric).copied())
        .filter(|v| v.is_finite())
}

/// Rank `athlete_id` against `peer_group`
pub fn analyze(athlete_id: &str, peer_group: &[AthleteMetrics]) -> Result<ComparativeAnalysis> {
    if peer_group.is_empty() {
        return Err(InputError::EmptyPeerGroup.into());
    }
    let subject = peer_group
        .iter()
        .find(|a| a.athlete_id == athlete_id)
        .ok_or_else(|| InputError::UnknownAthlete {
            athlete_id: athlete_id.to_string(),
        })?;

    for (name, value) in &subject.metrics {
        if !value.is_finite() {
            return Err(InputError::out_of_range(name, *value, "a finite number").into());
        }
    }

    let mut rankings = BTreeMap::new();
    let mut benchmarks = BTreeMap::new();
    let mut ranges = BTreeMap::new();

    for (name, value) in &subject.metrics {
        let population: Vec<f64> = metric_values(peer_group, name).collect();
        let percentile = round_tenth(percentile_rank(*value, &population));

        rankings.insert(
            name.clone(),
            MetricRanking {
                value: *value,
                percentile,
                tier: PerformanceTier::from_percentile(percentile),
                peer_count: population.len(),
            },
        );

        if let Some(b) = benchmark(&population) {
            benchmarks.insert(name.clone(), b);
        }

        let min = population.iter().copied().fold(f64::INFINITY, f64::min);
        let max = population.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        ranges.insert(name.as_str(), max - min);
    }

    let mut strengths: Vec<(&String, f64)> = rankings
        .iter()
        .filter(|(_, r)| r.percentile >= STRENGTH_PERCENTILE)
        .map(|(name, r)| (name, r.percentile))
        .collect();
    strengths.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut improvement_areas: Vec<(&String, f64)> = rankings
        .iter()
        .filter(|(_, r)| r.percentile < IMPROVEMENT_PERCENTILE)
        .map(|(name, r)| (name, r.percentile))
        .collect();
    improvement_areas.sort_by(|a, b| a.1.total_cmp(&b.1));

    Ok(ComparativeAnalysis {
        athlete_id: athlete_id.to_string(),
        peer_group_size: peer_group.len(),
        similar_athletes: similar_athletes(subject, peer_group, &ranges),
        strengths: strengths.into_iter().map(|(n, _)| n.clone()).collect(),
        improvement_areas: improvement_areas.into_iter().map(|(n, _)| n.clone()).collect(),
        rankings,
        benchmarks,
    })
}

fn similar_athletes(
    subject: &AthleteMetrics,
    peer_group: &[AthleteMetrics],
    ranges: &BTreeMap<&str, f64>,
) -> Vec<SimilarAthlete> {
    let mut candidates: Vec<SimilarAthlete> = peer_group
        .iter()
        .filter(|peer| peer.athlete_id != subject.athlete_id)
        .filter_map(|peer| {
            let mut shared = 0;
            let mut sum_sq = 0.0;
            for (name, value) in &subject.metrics {
                let Some(other) = peer.metrics.get(name).filter(|v| v.is_finite()) else {
                    continue;
                };
                shared += 1;
                let range = ranges.get(name.as_str()).copied().unwrap_or(0.0);
                if range > 0.0 {
                    let diff = (value - other) / range;
                    sum_sq += diff * diff;
                }
            }
            (shared > 0).then(|| SimilarAthlete {
                athlete_id: peer.athlete_id.clone(),
                distance: (sum_sq.sqrt() * 1000.0).round() / 1000.0,
                shared_metrics: shared,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.athlete_id.cmp(&b.athlete_id))
    });
    candidates.truncate(SIMILAR_ATHLETE_COUNT);
    candidates
}
