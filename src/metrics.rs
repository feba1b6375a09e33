//! Body-composition and energy target calculations
//!
//! Turns survey answers into the derived metrics block attached to a survey:
//!
//! - **BMI**: weight (kg) / height (m)²
//! - **Body fat %**: Deurenberg estimate from BMI, age and gender
//! - **BMR**: Mifflin-St Jeor resting energy expenditure
//! - **TDEE**: BMR scaled by a lifestyle activity factor
//! - **Daily calories**: TDEE minus the deficit required to hit the target
//!   weight in the requested number of days, clamped to a safe range
//! - **Water / sleep targets** and a time-to-goal estimate
//!
//! Every value here is a pure function of the survey input.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{Result, Violations};
use crate::models::{round_to, Gender, SurveyInput};

/// Energy density of body fat (kcal per kg)
pub const KCAL_PER_KG: f64 = 7700.0;

/// Lowest daily calorie target ever recommended
pub const MIN_DAILY_CALORIES: f64 = 1200.0;

/// Highest daily calorie target ever recommended
pub const MAX_DAILY_CALORIES: f64 = 5000.0;

pub const MIN_WATER_LITERS: f64 = 1.5;
pub const MAX_WATER_LITERS: f64 = 5.0;

/// Litres of water per kg of body weight
pub const WATER_LITERS_PER_KG: f64 = 0.033;

/// Baseline nightly sleep target (hours)
pub const SLEEP_TARGET_HOURS: f64 = 7.5;

/// Weight bounds shared by surveys, goals and weight logs
pub const MIN_WEIGHT_KG: f64 = 30.0;
pub const MAX_WEIGHT_KG: f64 = 300.0;

/// Weekly loss rate classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightLossPace {
    /// Under 0.25 kg/week
    Slow,
    /// 0.25-0.75 kg/week
    Moderate,
    /// Over 0.75 kg/week
    Aggressive,
}

impl WeightLossPace {
    pub fn from_weekly_rate(kg_per_week: f64) -> Self {
        if kg_per_week < 0.25 {
            WeightLossPace::Slow
        } else if kg_per_week <= 0.75 {
            WeightLossPace::Moderate
        } else {
            WeightLossPace::Aggressive
        }
    }
}

impl fmt::Display for WeightLossPace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightLossPace::Slow => write!(f, "slow"),
            WeightLossPace::Moderate => write!(f, "moderate"),
            WeightLossPace::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// WHO BMI category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BmiCategory::Underweight => write!(f, "underweight"),
            BmiCategory::Normal => write!(f, "normal"),
            BmiCategory::Overweight => write!(f, "overweight"),
            BmiCategory::Obese => write!(f, "obese"),
        }
    }
}

/// Derived metrics for a survey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub body_fat_percentage: f64,
    pub bmr: f64,
    pub tdee: f64,
    pub daily_calories: f64,
    /// Effective deficit after calorie clamping (kcal/day)
    pub daily_deficit: f64,
    pub water_target_liters: f64,
    pub sleep_target_hours: f64,
    /// Days until the target weight at the effective deficit; `None` when no deficit applies
    pub estimated_days_to_goal: Option<u32>,
    pub weekly_rate_kg: f64,
    pub weight_loss_pace: WeightLossPace,
}

/// Survey metric calculations
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Validate survey input, collecting every violated bound
    pub fn validate(input: &SurveyInput) -> Result<()> {
        let mut violations = Violations::new();
        violations.check_range("age", input.age as f64, 10.0, 120.0);
        violations.check_range("heightCm", input.height_cm, 100.0, 250.0);
        violations.check_range("weightKg", input.weight_kg, MIN_WEIGHT_KG, MAX_WEIGHT_KG);
        violations.check_range(
            "targetWeightKg",
            input.target_weight_kg,
            MIN_WEIGHT_KG,
            MAX_WEIGHT_KG,
        );
        if input.target_days == 0 {
            violations.push("targetDays must be greater than 0");
        }
        violations.into_result()
    }

    /// Compute the full metrics block for a survey
    pub fn compute(input: &SurveyInput) -> Result<Metrics> {
        Self::validate(input)?;

        let bmi = Self::bmi(input.weight_kg, input.height_cm);
        let body_fat = Self::body_fat_percentage(bmi, input.age, input.gender);
        let bmr = Self::bmr(input.weight_kg, input.height_cm, input.age, input.gender);
        let tdee = bmr * input.lifestyle.activity_factor();

        let requested_deficit =
            Self::requested_deficit(input.weight_kg, input.target_weight_kg, input.target_days);
        let daily_calories =
            (tdee - requested_deficit).clamp(MIN_DAILY_CALORIES, MAX_DAILY_CALORIES);
        if daily_calories != tdee - requested_deficit {
            debug!(
                tdee,
                requested_deficit, daily_calories, "Daily calorie target clamped"
            );
        }
        let effective_deficit = tdee - daily_calories;

        let weekly_rate = effective_deficit.max(0.0) * 7.0 / KCAL_PER_KG;

        Ok(Metrics {
            bmi: round_to(bmi, 1),
            bmi_category: BmiCategory::from_bmi(bmi),
            body_fat_percentage: round_to(body_fat, 1),
            bmr: bmr.round(),
            tdee: tdee.round(),
            daily_calories: daily_calories.round(),
            daily_deficit: effective_deficit.round(),
            water_target_liters: Self::water_target(input.weight_kg),
            sleep_target_hours: SLEEP_TARGET_HOURS,
            estimated_days_to_goal: Self::estimated_days_to_goal(
                input.weight_kg,
                input.target_weight_kg,
                effective_deficit,
            ),
            weekly_rate_kg: round_to(weekly_rate, 2),
            weight_loss_pace: WeightLossPace::from_weekly_rate(weekly_rate),
        })
    }

    pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
        let height_m = height_cm / 100.0;
        weight_kg / (height_m * height_m)
    }

    /// Deurenberg body-fat estimate
    ///
    /// Non-binary and other genders use the neutral midpoint factor 0.5.
    pub fn body_fat_percentage(bmi: f64, age: u32, gender: Gender) -> f64 {
        let gender_factor = match gender {
            Gender::Male => 1.0,
            Gender::Female => 0.0,
            Gender::NonBinary | Gender::Other => 0.5,
        };
        1.20 * bmi + 0.23 * age as f64 - 10.8 * gender_factor - 5.4
    }

    /// Mifflin-St Jeor BMR
    ///
    /// Non-binary and other genders use the mean of the male and female formulas.
    pub fn bmr(weight_kg: f64, height_cm: f64, age: u32, gender: Gender) -> f64 {
        let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
        match gender {
            Gender::Male => base + 5.0,
            Gender::Female => base - 161.0,
            Gender::NonBinary | Gender::Other => base + (5.0 - 161.0) / 2.0,
        }
    }

    /// Deficit needed to reach the target in `target_days` (0 when not losing weight)
    pub fn requested_deficit(weight_kg: f64, target_weight_kg: f64, target_days: u32) -> f64 {
        if weight_kg > target_weight_kg && target_days > 0 {
            (weight_kg - target_weight_kg) * KCAL_PER_KG / target_days as f64
        } else {
            0.0
        }
    }

    pub fn water_target(weight_kg: f64) -> f64 {
        round_to(
            (weight_kg * WATER_LITERS_PER_KG).clamp(MIN_WATER_LITERS, MAX_WATER_LITERS),
            2,
        )
    }

    pub fn estimated_days_to_goal(
        weight_kg: f64,
        target_weight_kg: f64,
        effective_deficit: f64,
    ) -> Option<u32> {
        if effective_deficit <= 0.0 {
            return None;
        }
        let days = (weight_kg - target_weight_kg).abs() * KCAL_PER_KG / effective_deficit;
        Some(days.ceil() as u32)
    }
}
