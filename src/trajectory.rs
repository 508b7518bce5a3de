//! Performance trajectory projection
//!
//! Projects a bounded performance score over a number of training periods from
//! a five-feature profile. Confidence decays linearly per period down to a
//! fixed floor.

use crate::error::{ensure_bounded, InputError, Result};
use crate::models::{sort_by_priority, Priority, Recommendation};
use crate::rubric::clamp_percent;
use crate::scorers::round_tenth;
use crate::trend::{slope, TrendDirection};
use serde::{Deserialize, Serialize};

/// Neutral starting point before bonuses
pub const BASE_PERFORMANCE: f64 = 50.0;

/// Confidence at period zero
pub const INITIAL_CONFIDENCE: f64 = 0.95;

/// Confidence lost per projected period
pub const CONFIDENCE_DECAY: f64 = 0.02;

/// Confidence never drops below this
pub const CONFIDENCE_FLOOR: f64 = 0.6;

/// Recovery score below which recovery is flagged
pub const RECOVERY_TARGET: f64 = 70.0;

/// Raw request form; every feature is required
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryRequest {
    pub age: Option<f64>,
    pub experience: Option<f64>,
    pub training_hours: Option<f64>,
    pub recovery_score: Option<f64>,
    pub injury_history: Option<u32>,
}

impl TrajectoryRequest {
    /// Reject missing features instead of defaulting them
    pub fn into_features(self) -> std::result::Result<TrajectoryFeatures, InputError> {
        let features = TrajectoryFeatures {
            age: self.age.ok_or_else(|| InputError::missing("age"))?,
            experience: self.experience.ok_or_else(|| InputError::missing("experience"))?,
            training_hours: self
                .training_hours
                .ok_or_else(|| InputError::missing("training_hours"))?,
            recovery_score: self
                .recovery_score
                .ok_or_else(|| InputError::missing("recovery_score"))?,
            injury_history: self
                .injury_history
                .ok_or_else(|| InputError::missing("injury_history"))?,
        };
        features.validate()?;
        Ok(features)
    }
}

/// Validated athlete profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFeatures {
    /// Years
    pub age: f64,
    /// Years of structured training
    pub experience: f64,
    /// Weekly training hours
    pub training_hours: f64,
    /// Recovery score, 0-100
    pub recovery_score: f64,
    /// Number of previous injuries
    pub injury_history: u32,
}

impl TrajectoryFeatures {
    pub fn validate(&self) -> std::result::Result<(), InputError> {
        check_range("age", self.age, 10.0, 100.0)?;
        check_range("experience", self.experience, 0.0, 60.0)?;
        check_range("training_hours", self.training_hours, 0.0, 168.0)?;
        check_range("recovery_score", self.recovery_score, 0.0, 100.0)?;
        Ok(())
    }

    fn age_bonus(&self) -> f64 {
        if (25.0..=30.0).contains(&self.age) {
            15.0
        } else if (20.0..=35.0).contains(&self.age) {
            10.0
        } else {
            5.0
        }
    }

    fn age_modifier(&self) -> f64 {
        if self.age < 25.0 {
            1.1
        } else if self.age > 30.0 {
            0.95
        } else {
            1.0
        }
    }

    fn training_factor(&self) -> f64 {
        (self.training_hours / 20.0).min(1.2)
    }

    fn recovery_factor(&self) -> f64 {
        0.8 + (self.recovery_score / 100.0) * 0.4
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> std::result::Result<(), InputError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InputError::out_of_range(field, value, &format!("{}-{}", min, max)))
    }
}

/// Starting performance level, clamped to 100
pub fn base_performance(features: &TrajectoryFeatures) -> f64 {
    let base = BASE_PERFORMANCE
        + features.age_bonus()
        + (features.experience * 2.0).min(20.0)
        + (features.training_hours / 10.0).min(15.0)
        + (features.recovery_score / 10.0) * 5.0;
    clamp_percent(base)
}

/// `max(0.95 − 0.02p, 0.6)`, rounded to two decimals
pub fn confidence(period: u32) -> f64 {
    let raw = (INITIAL_CONFIDENCE - CONFIDENCE_DECAY * period as f64).max(CONFIDENCE_FLOOR);
    (raw * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub period: u32,
    pub predicted_score: f64,
    pub confidence: f64,
    pub influencing_factors: Vec<String>,
}

/// Project periods `1..=horizon`
pub fn project(features: &TrajectoryFeatures, horizon: u32) -> Result<Vec<TrajectoryPoint>> {
    let base = base_performance(features);
    let common = features.age_modifier() * features.training_factor() * features.recovery_factor();

    (1..=horizon)
        .map(|period| {
            let p = period as f64;
            let experience_bonus = (p * 0.01).min(0.1);
            let predicted = clamp_percent(base * (1.0 + 0.02 * p) * common * (1.0 + experience_bonus));

            Ok(TrajectoryPoint {
                period,
                predicted_score: ensure_bounded("predicted score", round_tenth(predicted), 0.0, 100.0)?,
                confidence: ensure_bounded(
                    "trajectory confidence",
                    confidence(period),
                    CONFIDENCE_FLOOR,
                    INITIAL_CONFIDENCE,
                )?,
                influencing_factors: influencing_factors(features, period),
            })
        })
        .collect()
}

fn influencing_factors(features: &TrajectoryFeatures, period: u32) -> Vec<String> {
    let mut factors = Vec::new();
    if period <= 3 {
        factors.push("initial adaptation".to_string());
    }
    if period >= 6 {
        factors.push("experience accumulation".to_string());
    }
    if features.recovery_score < RECOVERY_TARGET {
        factors.push("recovery optimization needed".to_string());
    }
    factors
}

/// Summary statistics over a projected trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    pub peak_period: u32,
    pub peak_score: f64,
    pub average_score: f64,
    /// Last predicted score minus the first
    pub net_change: f64,
    pub average_confidence: f64,
    pub direction: TrendDirection,
}

impl TrajectorySummary {
    /// `None` for an empty trajectory
    pub fn from_points(points: &[TrajectoryPoint]) -> Option<Self> {
        let first = points.first()?;
        let last = points.last()?;

        // First period wins ties
        let peak = points.iter().fold(first, |best, point| {
            if point.predicted_score > best.predicted_score {
                point
            } else {
                best
            }
        });

        let n = points.len() as f64;
        let scores: Vec<f64> = points.iter().map(|p| p.predicted_score).collect();

        Some(Self {
            peak_period: peak.period,
            peak_score: peak.predicted_score,
            average_score: round_tenth(scores.iter().sum::<f64>() / n),
            net_change: round_tenth(last.predicted_score - first.predicted_score),
            average_confidence: (points.iter().map(|p| p.confidence).sum::<f64>() / n * 1000.0)
                .round()
                / 1000.0,
            direction: TrendDirection::from_slope(slope(&scores)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPrediction {
    pub trajectory: Vec<TrajectoryPoint>,
    pub insights: TrajectorySummary,
    pub recommendations: Vec<Recommendation>,
}

/// Validate the horizon, project, summarize and advise
pub fn predict(
    features: &TrajectoryFeatures,
    horizon: u32,
    max_horizon: u32,
) -> Result<TrajectoryPrediction> {
    if horizon == 0 || horizon > max_horizon {
        return Err(InputError::InvalidHorizon {
            periods: horizon,
            max: max_horizon,
        }
        .into());
    }
    features.validate()?;

    let trajectory = project(features, horizon)?;
    let insights = TrajectorySummary::from_points(&trajectory).ok_or_else(|| {
        InputError::InvalidHorizon {
            periods: horizon,
            max: max_horizon,
        }
    })?;
    let recommendations = recommendations(features, &insights);

    Ok(TrajectoryPrediction {
        trajectory,
        insights,
        recommendations,
    })
}

fn recommendations(features: &TrajectoryFeatures, insights: &TrajectorySummary) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if features.recovery_score < RECOVERY_TARGET {
        recommendations.push(Recommendation::new(
            "recovery_focus",
            Priority::High,
            "Improve recovery to unlock projected gains",
            &[
                "Prioritize 8+ hours of sleep",
                "Add a full rest day each week",
                "Review post-session nutrition",
            ],
        ));
    }

    if features.training_hours < 10.0 {
        recommendations.push(Recommendation::new(
            "training_volume",
            Priority::Medium,
            "Training volume limits projected improvement",
            &[
                "Increase weekly hours gradually, about 10% per week",
                "Add low-intensity aerobic sessions first",
            ],
        ));
    }

    if features.injury_history > 2 {
        recommendations.push(Recommendation::new(
            "injury_prevention",
            Priority::High,
            "Repeated injuries put the projection at risk",
            &[
                "Add two strength and mobility sessions per week",
                "Screen movement patterns with a physiotherapist",
            ],
        ));
    }

    if features.age > 30.0 {
        recommendations.push(Recommendation::new(
            "masters_training",
            Priority::Low,
            "Adapt training structure for age",
            &[
                "Allow longer recovery after high-intensity sessions",
                "Maintain year-round strength work",
            ],
        ));
    }

    if insights.peak_score >= 100.0 {
        recommendations.push(Recommendation::new(
            "performance_plateau",
            Priority::Low,
            "Projected performance reaches the ceiling",
            &[
                "Shift focus to event-specific skills",
                "Set performance goals beyond the general score",
            ],
        ));
    }

    sort_by_priority(&mut recommendations);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use proptest::prelude::*;

    fn young_athlete() -> TrajectoryFeatures {
        TrajectoryFeatures {
            age: 24.0,
            experience: 5.0,
            training_hours: 22.0,
            recovery_score: 78.0,
            injury_history: 0,
        }
    }

    fn masters_athlete() -> TrajectoryFeatures {
        TrajectoryFeatures {
            age: 40.0,
            experience: 1.0,
            training_hours: 5.0,
            recovery_score: 50.0,
            injury_history: 3,
        }
    }

    #[test]
    fn test_end_to_end_projection() {
        let features = young_athlete();
        assert_eq!(base_performance(&features), 100.0);

        let prediction = predict(&features, 12, 52).unwrap();
        assert_eq!(prediction.trajectory.len(), 12);
        assert_eq!(prediction.trajectory[0].confidence, 0.93);
        assert_eq!(prediction.trajectory[11].confidence, 0.71);
        assert!(prediction.trajectory.iter().all(|p| p.predicted_score == 100.0));

        assert_eq!(prediction.insights.peak_period, 1);
        assert_eq!(prediction.insights.net_change, 0.0);
        assert_eq!(prediction.insights.direction, TrendDirection::Stable);

        let kinds: Vec<&str> = prediction.recommendations.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["performance_plateau"]);
    }

    #[test]
    fn test_base_performance_components() {
        // 50 + 5 + 2 + 0.5 + 25
        assert!((base_performance(&masters_athlete()) - 82.5).abs() < 1e-9);

        let prime = TrajectoryFeatures {
            age: 27.0,
            experience: 0.0,
            training_hours: 0.0,
            recovery_score: 0.0,
            injury_history: 0,
        };
        assert_eq!(base_performance(&prime), 65.0);
    }

    #[test]
    fn test_low_profile_trajectory_improves() {
        let prediction = predict(&masters_athlete(), 8, 52).unwrap();
        let first = &prediction.trajectory[0];

        // 82.5 · 1.02 · 0.95 · 0.25 · 1.0 · 1.01
        assert_eq!(first.predicted_score, 20.2);
        assert_eq!(
            first.influencing_factors,
            vec!["initial adaptation", "recovery optimization needed"]
        );
        assert_eq!(
            prediction.trajectory[7].influencing_factors,
            vec!["experience accumulation", "recovery optimization needed"]
        );
        assert_eq!(prediction.insights.direction, TrendDirection::Improving);
        assert_eq!(prediction.insights.peak_period, 8);

        let kinds: Vec<&str> = prediction.recommendations.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["recovery_focus", "injury_prevention", "training_volume", "masters_training"]
        );
    }

    #[test]
    fn test_confidence_floor() {
        assert_eq!(confidence(1), 0.93);
        assert_eq!(confidence(17), 0.61);
        assert_eq!(confidence(18), 0.6);
        assert_eq!(confidence(40), 0.6);
    }

    #[test]
    fn test_missing_feature_rejected() {
        let request = TrajectoryRequest {
            age: Some(24.0),
            experience: Some(5.0),
            training_hours: None,
            recovery_score: Some(78.0),
            injury_history: Some(0),
        };
        assert_eq!(request.into_features(), Err(InputError::missing("training_hours")));
    }

    #[test]
    fn test_out_of_range_feature_rejected() {
        let request = TrajectoryRequest {
            age: Some(-1.0),
            experience: Some(5.0),
            training_hours: Some(10.0),
            recovery_score: Some(78.0),
            injury_history: Some(0),
        };
        assert!(matches!(
            request.into_features(),
            Err(InputError::OutOfRange { ref field, .. }) if field == "age"
        ));
    }

    #[test]
    fn test_invalid_horizon() {
        assert!(matches!(
            predict(&young_athlete(), 0, 52),
            Err(EngineError::Input(InputError::InvalidHorizon { periods: 0, max: 52 }))
        ));
        assert!(predict(&young_athlete(), 53, 52).is_err());
    }

    proptest! {
        #[test]
        fn prop_projection_bounded_and_confidence_monotonic(
            age in 10.0f64..=100.0,
            experience in 0.0f64..=60.0,
            hours in 0.0f64..=168.0,
            recovery in 0.0f64..=100.0,
            horizon in 1u32..=60,
        ) {
            let features = TrajectoryFeatures {
                age,
                experience,
                training_hours: hours,
                recovery_score: recovery,
                injury_history: 0,
            };
            let points = project(&features, horizon).unwrap();

            prop_assert_eq!(points.len(), horizon as usize);
            for pair in points.windows(2) {
                prop_assert!(pair[1].confidence <= pair[0].confidence);
            }
            for point in &points {
                prop_assert!((0.0..=100.0).contains(&point.predicted_score));
                prop_assert!((CONFIDENCE_FLOOR..=INITIAL_CONFIDENCE).contains(&point.confidence));
            }
        }
    }
}
