//! Injury risk classification
//!
//! Additive rule scoring over a small feature set, bucketed into three tiers.
//! Each tier maps to a half-open probability band; the draw inside the band is
//! delegated to an injected [`ProbabilitySampler`] so results are reproducible.

use crate::error::{ensure_bounded, ComputationError, InputError, Result};
use crate::models::{
    sort_by_priority, sort_by_severity, Priority, Recommendation, RiskFactor, Severity,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Mutex;
use tracing::warn;

/// Score at or above which the risk is high
pub const HIGH_RISK_SCORE: u32 = 70;

/// Score at or above which the risk is medium
pub const MEDIUM_RISK_SCORE: u32 = 40;

/// Probabilities never reach this value
pub const MAX_PROBABILITY: f64 = 0.5;

/// Inputs to the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryRiskFactors {
    /// Current training load index, 0-100
    pub workload: f64,
    /// Recovery score, 0-100
    pub recovery_score: f64,
    /// Age in years
    pub age: f64,
    pub previous_injuries: u32,
    /// Session intensity, 0-100
    pub training_intensity: f64,
}

impl InjuryRiskFactors {
    /// Reject non-finite or out-of-range inputs
    pub fn validate(&self) -> std::result::Result<(), InputError> {
        check_range("workload", self.workload, 0.0, 100.0)?;
        check_range("recovery_score", self.recovery_score, 0.0, 100.0)?;
        check_range("age", self.age, 10.0, 100.0)?;
        check_range("training_intensity", self.training_intensity, 0.0, 100.0)?;
        Ok(())
    }

    /// Additive rule score; unbounded above because of injury history
    pub fn risk_score(&self) -> u32 {
        let mut score = 0u32;

        if self.workload > 80.0 {
            score += 30;
        } else if self.workload > 60.0 {
            score += 15;
        }

        if self.recovery_score < 60.0 {
            score += 25;
        } else if self.recovery_score < 75.0 {
            score += 10;
        }

        if self.age < 20.0 || self.age > 35.0 {
            score += 15;
        }

        score = score.saturating_add(self.previous_injuries.saturating_mul(10));

        if self.training_intensity > 85.0 {
            score += 20;
        } else if self.training_intensity > 70.0 {
            score += 10;
        }

        score
    }

    fn explanations(&self) -> Vec<RiskFactor> {
        let mut factors = Vec::new();

        if self.workload > 80.0 {
            factors.push(RiskFactor::new(
                "high_workload",
                Severity::High,
                format!("Workload of {:.0} is well above a sustainable level", self.workload),
                "Tissue loading outpaces adaptation",
            ));
        } else if self.workload > 60.0 {
            factors.push(RiskFactor::new(
                "elevated_workload",
                Severity::Medium,
                format!("Workload of {:.0} is elevated", self.workload),
                "Less margin for accumulated fatigue",
            ));
        }

        if self.recovery_score < 60.0 {
            factors.push(RiskFactor::new(
                "poor_recovery",
                Severity::High,
                format!("Recovery score of {:.0} is poor", self.recovery_score),
                "Incomplete repair between sessions",
            ));
        } else if self.recovery_score < 75.0 {
            factors.push(RiskFactor::new(
                "suboptimal_recovery",
                Severity::Medium,
                format!("Recovery score of {:.0} is below optimal", self.recovery_score),
                "Residual fatigue carried into training",
            ));
        }

        if self.age < 20.0 || self.age > 35.0 {
            factors.push(RiskFactor::new(
                "age",
                Severity::Low,
                format!("Age {:.0} is outside the lowest-risk range of 20-35", self.age),
                "Tissue resilience differs at this age",
            ));
        }

        if self.previous_injuries > 0 {
            let severity = if self.previous_injuries > 2 {
                Severity::High
            } else {
                Severity::Medium
            };
            factors.push(RiskFactor::new(
                "injury_history",
                severity,
                format!("{} previous injuries on record", self.previous_injuries),
                "Prior injury sites are prone to recurrence",
            ));
        }

        if self.training_intensity > 85.0 {
            factors.push(RiskFactor::new(
                "high_intensity",
                Severity::High,
                format!("Training intensity of {:.0} is very high", self.training_intensity),
                "High-intensity work concentrates mechanical stress",
            ));
        } else if self.training_intensity > 70.0 {
            factors.push(RiskFactor::new(
                "elevated_intensity",
                Severity::Medium,
                format!("Training intensity of {:.0} is elevated", self.training_intensity),
                "Intensity leaves little room for recovery",
            ));
        }

        sort_by_severity(&mut factors);
        factors
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> std::result::Result<(), InputError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InputError::out_of_range(field, value, &format!("{}-{}", min, max)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_RISK_SCORE {
            RiskLevel::High
        } else if score >= MEDIUM_RISK_SCORE {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Half-open probability band for this tier
    pub fn probability_band(&self) -> Range<f64> {
        match self {
            RiskLevel::High => 0.25..0.50,
            RiskLevel::Medium => 0.10..0.30,
            RiskLevel::Low => 0.0..0.15,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Draws a probability from a half-open band
pub trait ProbabilitySampler: Send + Sync {
    fn sample(&self, band: Range<f64>) -> f64;
}

/// Uniform draw from a ChaCha stream
#[derive(Debug)]
pub struct RandomSampler {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomSampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }
}

impl ProbabilitySampler for RandomSampler {
    fn sample(&self, band: Range<f64>) -> f64 {
        if band.is_empty() {
            return band.start;
        }
        self.rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gen_range(band)
    }
}

/// Always returns the band midpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointSampler;

impl ProbabilitySampler for MidpointSampler {
    fn sample(&self, band: Range<f64>) -> f64 {
        (band.start + band.end) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryRiskAssessment {
    pub risk_score: u32,
    pub level: RiskLevel,
    /// Always within the level's band, below 0.5
    pub probability: f64,
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<Recommendation>,
}

/// Validate, score, bucket and explain
pub fn assess(
    inputs: &InjuryRiskFactors,
    sampler: &dyn ProbabilitySampler,
) -> Result<InjuryRiskAssessment> {
    inputs.validate()?;

    let risk_score = inputs.risk_score();
    let level = RiskLevel::from_score(risk_score);
    let band = level.probability_band();
    let probability = sampler.sample(band.clone());

    ensure_bounded("injury probability", probability, band.start, band.end)?;
    if probability >= MAX_PROBABILITY {
        return Err(ComputationError::OutOfBounds {
            quantity: "injury probability".to_string(),
            value: probability,
            min: 0.0,
            max: MAX_PROBABILITY,
        }
        .into());
    }

    if level == RiskLevel::High {
        warn!(risk_score, probability, "High injury risk classified");
    }

    Ok(InjuryRiskAssessment {
        risk_score,
        level,
        probability,
        factors: inputs.explanations(),
        recommendations: recommendations_for(level),
    })
}

/// Recommendations accumulate with the tier
pub fn recommendations_for(level: RiskLevel) -> Vec<Recommendation> {
    let mut recommendations = vec![Recommendation::new(
        "injury_prevention",
        Priority::Low,
        "Maintain injury prevention habits",
        &[
            "Keep a consistent warm-up and mobility routine",
            "Log training load and soreness daily",
        ],
    )];

    if level >= RiskLevel::Medium {
        recommendations.push(Recommendation::new(
            "load_management",
            Priority::Medium,
            "Monitor training load closely",
            &[
                "Limit weekly load increases to 10%",
                "Schedule an additional recovery day this week",
            ],
        ));
    }

    if level == RiskLevel::High {
        recommendations.push(Recommendation::new(
            "load_reduction",
            Priority::Critical,
            "Reduce training load 20-30% for 2 weeks",
            &[
                "Cut session volume before intensity",
                "Replace one high-intensity session with low-impact work",
            ],
        ));
        recommendations.push(Recommendation::new(
            "recovery_monitoring",
            Priority::High,
            "Increase recovery monitoring",
            &[
                "Track HRV and resting heart rate every morning",
                "Consult a sports medicine professional about persistent pain",
            ],
        ));
    }

    sort_by_priority(&mut recommendations);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn baseline() -> InjuryRiskFactors {
        InjuryRiskFactors {
            workload: 50.0,
            recovery_score: 80.0,
            age: 27.0,
            previous_injuries: 0,
            training_intensity: 60.0,
        }
    }

    #[test]
    fn test_rule_accumulation() {
        assert_eq!(baseline().risk_score(), 0);

        let inputs = InjuryRiskFactors {
            workload: 85.0,
            recovery_score: 55.0,
            age: 38.0,
            previous_injuries: 2,
            training_intensity: 90.0,
        };
        // 30 + 25 + 15 + 20 + 20
        assert_eq!(inputs.risk_score(), 110);

        let moderate = InjuryRiskFactors {
            workload: 65.0,
            recovery_score: 70.0,
            training_intensity: 75.0,
            ..baseline()
        };
        assert_eq!(moderate.risk_score(), 35);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let edge = InjuryRiskFactors {
            workload: 80.0,
            recovery_score: 75.0,
            age: 35.0,
            training_intensity: 85.0,
            ..baseline()
        };
        // only the lower workload and intensity tiers fire
        assert_eq!(edge.risk_score(), 25);

        let lower = InjuryRiskFactors {
            workload: 60.0,
            recovery_score: 60.0,
            age: 20.0,
            training_intensity: 70.0,
            ..baseline()
        };
        assert_eq!(lower.risk_score(), 10);
    }

    #[test]
    fn test_level_banding() {
        assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
    }

    #[test]
    fn test_midpoint_sampler_is_deterministic() {
        let inputs = InjuryRiskFactors {
            workload: 90.0,
            recovery_score: 50.0,
            training_intensity: 90.0,
            ..baseline()
        };
        let assessment = assess(&inputs, &MidpointSampler).unwrap();
        assert_eq!(assessment.risk_score, 75);
        assert_eq!(assessment.level, RiskLevel::High);
        assert!((assessment.probability - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_sampler_reproducible() {
        let inputs = baseline();
        let a = assess(&inputs, &RandomSampler::seeded(11)).unwrap();
        let b = assess(&inputs, &RandomSampler::seeded(11)).unwrap();
        assert_eq!(a.probability, b.probability);
        assert!((0.0..0.15).contains(&a.probability));
    }

    #[test]
    fn test_high_tier_recommendations() {
        let kinds: Vec<String> = recommendations_for(RiskLevel::High)
            .into_iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(
            kinds,
            vec!["load_reduction", "recovery_monitoring", "load_management", "injury_prevention"]
        );

        assert_eq!(recommendations_for(RiskLevel::Low).len(), 1);
        assert_eq!(recommendations_for(RiskLevel::Medium).len(), 2);
    }

    #[test]
    fn test_factor_explanations_sorted() {
        let inputs = InjuryRiskFactors {
            workload: 65.0,
            recovery_score: 50.0,
            age: 18.0,
            previous_injuries: 1,
            training_intensity: 60.0,
        };
        let assessment = assess(&inputs, &MidpointSampler).unwrap();
        let severities: Vec<Severity> = assessment.factors.iter().map(|f| f.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::High, Severity::Medium, Severity::Medium, Severity::Low]
        );
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let negative_age = InjuryRiskFactors {
            age: -3.0,
            ..baseline()
        };
        assert!(matches!(
            negative_age.validate(),
            Err(InputError::OutOfRange { ref field, .. }) if field == "age"
        ));

        let nan_workload = InjuryRiskFactors {
            workload: f64::NAN,
            ..baseline()
        };
        assert!(assess(&nan_workload, &MidpointSampler).is_err());
    }

    proptest! {
        #[test]
        fn prop_probability_within_level_band(
            workload in 0.0f64..=100.0,
            recovery in 0.0f64..=100.0,
            age in 10.0f64..=100.0,
            injuries in 0u32..20,
            intensity in 0.0f64..=100.0,
            seed in any::<u64>(),
        ) {
            let inputs = InjuryRiskFactors {
                workload,
                recovery_score: recovery,
                age,
                previous_injuries: injuries,
                training_intensity: intensity,
            };
            let assessment = assess(&inputs, &RandomSampler::seeded(seed)).unwrap();

            prop_assert_eq!(assessment.level, RiskLevel::from_score(assessment.risk_score));
            prop_assert!(assessment.probability >= 0.0);
            prop_assert!(assessment.probability < MAX_PROBABILITY);
            prop_assert!(assessment.level.probability_band().contains(&assessment.probability));
        }
    }
}
