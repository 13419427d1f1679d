//! Strongly-typed payloads decoded from validated LLM output.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::schema::{SchemaDescriptor, FOOD_SCHEMA, GOAL_SCHEMA};

/// A payload type bound to exactly one schema shape.
pub trait SchemaPayload: DeserializeOwned {
    /// The schema this payload is decoded against.
    fn schema() -> &'static SchemaDescriptor;
}

/// Macronutrient and energy amounts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub k_cals: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl NutritionTotals {
    /// Scale every amount by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            k_cals: self.k_cals * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
            fiber_g: self.fiber_g * factor,
        }
    }
}

/// Daily nutrition goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoalResponse {
    /// Date the goal applies from, as produced by the model
    pub date: String,
    pub k_cals: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl GoalResponse {
    /// Parse `date` as an ISO calendar date.
    ///
    /// Validation only requires a non-empty string, so this may be `None`.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    /// Daily targets.
    pub fn targets(&self) -> NutritionTotals {
        NutritionTotals {
            k_cals: self.k_cals,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            fiber_g: self.fiber_g,
        }
    }
}

impl SchemaPayload for GoalResponse {
    fn schema() -> &'static SchemaDescriptor {
        &GOAL_SCHEMA
    }
}

/// Nutrition facts for a single food entry. Amounts are per serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FoodResponse {
    pub name: String,
    pub servings: f64,
    pub k_cals: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl FoodResponse {
    /// Amounts for one serving.
    pub fn per_serving(&self) -> NutritionTotals {
        NutritionTotals {
            k_cals: self.k_cals,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            fiber_g: self.fiber_g,
        }
    }

    /// Amounts actually eaten: per-serving values times `servings`.
    pub fn totals(&self) -> NutritionTotals {
        self.per_serving().scaled(self.servings)
    }
}

impl SchemaPayload for FoodResponse {
    fn schema() -> &'static SchemaDescriptor {
        &FOOD_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(date: &str) -> GoalResponse {
        GoalResponse {
            date: date.to_string(),
            k_cals: 2200.0,
            protein_g: 150.0,
            carbs_g: 250.0,
            fat_g: 80.0,
            fiber_g: 30.0,
        }
    }

    #[test]
    fn test_parsed_date() {
        assert_eq!(
            goal("2024-01-01").parsed_date(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(goal("next monday").parsed_date(), None);
    }

    #[test]
    fn test_food_totals_scale_by_servings() {
        let food = FoodResponse {
            name: "Toast".to_string(),
            servings: 2.0,
            k_cals: 80.0,
            protein_g: 3.0,
            carbs_g: 15.0,
            fat_g: 1.0,
            fiber_g: 0.5,
        };
        let totals = food.totals();
        assert_eq!(totals.k_cals, 160.0);
        assert_eq!(totals.fiber_g, 1.0);
        assert_eq!(food.per_serving().k_cals, 80.0);
    }

    #[test]
    fn test_payloads_bound_to_schemas() {
        assert_eq!(GoalResponse::schema().name(), "goal");
        assert_eq!(FoodResponse::schema().name(), "food");
    }

    #[test]
    fn test_unknown_fields_rejected_on_decode() {
        let result: Result<GoalResponse, _> = serde_json::from_value(serde_json::json!({
            "date": "2024-01-01",
            "k_cals": 1,
            "protein_g": 1,
            "carbs_g": 1,
            "fat_g": 1,
            "fiber_g": 1,
            "sugar_g": 1
        }));
        assert!(result.is_err());
    }
}
