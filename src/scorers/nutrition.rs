//! Nutrition scoring
//!
//! Macronutrient intake is expressed as a percentage of the athlete's daily
//! target, so every adherence band is centred on 100%. Protein tolerates a
//! surplus (ideal 100-130%) since recovery demand routinely exceeds baseline
//! targets. Micronutrients are tracked against recommended daily allowance; a
//! nutrient averaging below 80% RDA over the window counts as a deficiency.

use super::{mean, metric, DomainScorer};
use crate::models::{Domain, NutritionSample, Priority, Recommendation};
use crate::rubric::{clamp_percent, Rule, RubricEntry};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const CALORIE_ADHERENCE: &str = "calorie_adherence";
pub const PROTEIN_ADHERENCE: &str = "protein_adherence";
pub const CARB_ADHERENCE: &str = "carb_adherence";
pub const FAT_ADHERENCE: &str = "fat_adherence";
pub const WATER_LITERS: &str = "water_liters";
pub const MICRONUTRIENT_COVERAGE: &str = "micronutrient_coverage";
pub const DEFICIENCY_COUNT: &str = "deficiency_count";

/// Share of RDA below which a micronutrient is deficient
pub const DEFICIENCY_THRESHOLD_PCT: f64 = 80.0;

static NUTRITION_RUBRIC: [RubricEntry; 6] = [
    RubricEntry::new(CALORIE_ADHERENCE, Rule::band((95.0, 105.0), (85.0, 115.0)), 0.25),
    RubricEntry::new(PROTEIN_ADHERENCE, Rule::band((100.0, 130.0), (80.0, 150.0)), 0.25),
    RubricEntry::new(CARB_ADHERENCE, Rule::band((90.0, 110.0), (75.0, 125.0)), 0.10),
    RubricEntry::new(FAT_ADHERENCE, Rule::band((90.0, 110.0), (75.0, 125.0)), 0.10),
    RubricEntry::new(WATER_LITERS, Rule::band((3.0, 5.0), (2.5, 6.0)), 0.15),
    RubricEntry::new(MICRONUTRIENT_COVERAGE, Rule::PERCENT, 0.15),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct NutritionScorer;

/// Average %RDA per micronutrient across the window
pub fn micronutrient_averages(samples: &[NutritionSample]) -> BTreeMap<String, f64> {
    let mut readings: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        for (name, pct) in &sample.micronutrients {
            readings.entry(name.clone()).or_default().push(*pct);
        }
    }

    readings
        .into_iter()
        .map(|(name, values)| (name, mean(&values)))
        .collect()
}

/// Names of micronutrients averaging below the deficiency threshold
pub fn deficient_nutrients(samples: &[NutritionSample]) -> Vec<String> {
    micronutrient_averages(samples)
        .into_iter()
        .filter(|(_, pct)| *pct < DEFICIENCY_THRESHOLD_PCT)
        .map(|(name, _)| name)
        .collect()
}

impl DomainScorer for NutritionScorer {
    type Sample = NutritionSample;

    const DOMAIN: Domain = Domain::Nutrition;

    fn rubric(&self) -> &'static [RubricEntry] {
        &NUTRITION_RUBRIC
    }

    fn window_metrics(&self, samples: &[NutritionSample]) -> BTreeMap<String, f64> {
        let average = |f: fn(&NutritionSample) -> f64| -> f64 {
            mean(&samples.iter().map(f).collect::<Vec<_>>())
        };

        let micronutrients = micronutrient_averages(samples);
        let deficiencies = micronutrients
            .values()
            .filter(|pct| **pct < DEFICIENCY_THRESHOLD_PCT)
            .count();
        // Nothing tracked counts as full coverage
        let coverage = if micronutrients.is_empty() {
            100.0
        } else {
            clamp_percent(
                (micronutrients.len() - deficiencies) as f64 / micronutrients.len() as f64 * 100.0,
            )
        };

        let mut metrics = BTreeMap::new();
        metrics.insert(CALORIE_ADHERENCE.to_string(), average(|s| s.calorie_adherence));
        metrics.insert(PROTEIN_ADHERENCE.to_string(), average(|s| s.protein_adherence));
        metrics.insert(CARB_ADHERENCE.to_string(), average(|s| s.carb_adherence));
        metrics.insert(FAT_ADHERENCE.to_string(), average(|s| s.fat_adherence));
        metrics.insert(WATER_LITERS.to_string(), average(|s| s.water_liters));
        metrics.insert(MICRONUTRIENT_COVERAGE.to_string(), coverage);
        metrics.insert(DEFICIENCY_COUNT.to_string(), deficiencies as f64);
        metrics
    }

    fn recommendations(
        &self,
        samples: &[NutritionSample],
        metrics: &BTreeMap<String, f64>,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if metric(metrics, WATER_LITERS) < 3.0 {
            recommendations.push(Recommendation::new(
                "hydration",
                Priority::High,
                "Increase daily water intake to at least 3 liters",
                &[
                    "Carry a marked water bottle",
                    "Drink 500ml within an hour of waking",
                    "Replace 150% of fluid lost during training",
                ],
            ));
        }

        if metric(metrics, PROTEIN_ADHERENCE) < 100.0 {
            recommendations.push(Recommendation::new(
                "protein_intake",
                Priority::High,
                "Meet daily protein targets to support muscle repair",
                &[
                    "Spread 20-40g of protein across 4-5 meals",
                    "Take 20g of protein within 2 hours after training",
                ],
            ));
        }

        if metric(metrics, CALORIE_ADHERENCE) < 90.0 {
            recommendations.push(Recommendation::new(
                "energy_availability",
                Priority::Medium,
                "Energy intake is below target",
                &[
                    "Add a carbohydrate-rich snack around training",
                    "Review portion sizes with a sports dietitian",
                ],
            ));
        }

        let deficient = deficient_nutrients(samples);
        if !deficient.is_empty() {
            let actions: Vec<String> = deficient
                .iter()
                .map(|name| format!("Increase {} intake through diet or supplementation", name))
                .collect();
            recommendations.push(Recommendation {
                kind: "micronutrients".to_string(),
                priority: Priority::Medium,
                message: format!("Address {} micronutrient deficiencies", deficient.len()),
                actions,
            });
        }

        recommendations
    }

    fn sample_date(sample: &NutritionSample) -> NaiveDate {
        sample.date
    }
}
