//! Composite recovery aggregation
//!
//! Combines the available domain scores into one optimization score using fixed
//! domain weights (sleep 0.30, nutrition 0.25, stress 0.25, workload 0.20).
//! Weights are renormalized over the domains actually present, so a partial
//! analysis is not dragged down by a missing domain.

use crate::models::{
    sort_by_priority, sort_by_severity, Domain, DomainScore, Recommendation, RiskFactor, Severity,
};
use crate::rubric::clamp_percent;
use crate::scorers::{nutrition, workload};
use std::collections::BTreeMap;

/// Domains scoring below this contribute their recommendations
pub const RECOMMENDATION_GATE: f64 = 70.0;

/// Sleep or stress scores below this are flagged as risk factors
pub const RISK_SCORE_THRESHOLD: f64 = 60.0;

/// Nutrition deficiency count above which a risk factor is raised
pub const DEFICIENCY_RISK_COUNT: f64 = 2.0;

/// Weighted mean over present domains, unrounded; `None` when no domain is present
pub fn weighted_score<I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = (Domain, f64)>,
{
    let (weighted, total_weight) = scores
        .into_iter()
        .fold((0.0, 0.0), |(weighted, total), (domain, score)| {
            (
                weighted + clamp_percent(score) * domain.weight(),
                total + domain.weight(),
            )
        });

    if total_weight > 0.0 {
        Some(clamp_percent(weighted / total_weight))
    } else {
        None
    }
}

/// Rounded optimization score, 0 when no domain is present
pub fn optimization_score(domain_scores: &BTreeMap<Domain, DomainScore>) -> u8 {
    weighted_score(domain_scores.values().map(|s| (s.domain, s.score)))
        .map(|score| score.round() as u8)
        .unwrap_or(0)
}

/// Derive risk factors from fixed rules, most severe first
pub fn risk_factors(domain_scores: &BTreeMap<Domain, DomainScore>) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if let Some(sleep) = domain_scores.get(&Domain::Sleep) {
        if sleep.score < RISK_SCORE_THRESHOLD {
            factors.push(RiskFactor::new(
                "sleep_deprivation",
                Severity::High,
                format!("Sleep score of {:.0} indicates insufficient recovery sleep", sleep.score),
                "Impaired muscle repair, reaction time and immune function",
            ));
        }
    }

    if let Some(nutrition_score) = domain_scores.get(&Domain::Nutrition) {
        let deficiencies = nutrition_score.metric(nutrition::DEFICIENCY_COUNT).unwrap_or(0.0);
        if deficiencies > DEFICIENCY_RISK_COUNT {
            factors.push(RiskFactor::new(
                "nutrient_deficiency",
                Severity::Medium,
                format!("{:.0} micronutrients below 80% of RDA", deficiencies),
                "Slower tissue repair and reduced energy availability",
            ));
        }
    }

    if let Some(stress) = domain_scores.get(&Domain::Stress) {
        if stress.score < RISK_SCORE_THRESHOLD {
            factors.push(RiskFactor::new(
                "chronic_stress",
                Severity::High,
                format!("Stress score of {:.0} indicates sustained physiological stress", stress.score),
                "Suppressed HRV and elevated cortisol slow adaptation",
            ));
        }
    }

    if let Some(workload_score) = domain_scores.get(&Domain::Workload) {
        let ratio = workload_score.metric(workload::ACUTE_CHRONIC_RATIO).unwrap_or(0.0);
        if ratio > workload::OVERTRAINING_RATIO {
            factors.push(RiskFactor::new(
                "overtraining",
                Severity::High,
                format!("Acute:chronic workload ratio of {:.2} exceeds 1.3", ratio),
                "Substantially elevated soft-tissue injury risk",
            ));
        }
    }

    sort_by_severity(&mut factors);
    factors
}

/// Pool recommendations from domains scoring below the gate, most urgent first
pub fn pooled_recommendations(domain_scores: &BTreeMap<Domain, DomainScore>) -> Vec<Recommendation> {
    let mut pooled: Vec<Recommendation> = domain_scores
        .values()
        .filter(|s| s.score < RECOMMENDATION_GATE)
        .flat_map(|s| s.recommendations.iter().cloned())
        .collect();

    sort_by_priority(&mut pooled);
    pooled
}
