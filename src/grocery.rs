//! Weekly grocery planning from a daily calorie target
//!
//! The weekly calorie budget is split into macros (carbs 40%, protein 30%,
//! fat 30%) and a reference basket sized for 14,000 kcal/week is scaled to the
//! budget. Quantities are rounded to the nearest 50 g.
//!
//! The optimization variant adds a cost range for the selected price mode,
//! mode-specific shopping tips, and allergy substitutions.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{HealthError, Result, Violations};
use crate::metrics::{MAX_DAILY_CALORIES, MIN_DAILY_CALORIES};

/// Weekly calories the reference basket is sized for
pub const REFERENCE_WEEKLY_CALORIES: f64 = 14000.0;

pub const CARBS_RATIO: f64 = 0.40;
pub const PROTEIN_RATIO: f64 = 0.30;
pub const FAT_RATIO: f64 = 0.30;

pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

const ROUNDING_STEP_GRAMS: f64 = 50.0;

/// Grocery item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Vegetables,
    Fruits,
    Proteins,
    GrainsAndDairy,
}

impl Category {
    pub fn all() -> [Category; 4] {
        [
            Category::Vegetables,
            Category::Fruits,
            Category::Proteins,
            Category::GrainsAndDairy,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Vegetables => write!(f, "Vegetables"),
            Category::Fruits => write!(f, "Fruits"),
            Category::Proteins => write!(f, "Proteins"),
            Category::GrainsAndDairy => write!(f, "Grains & Dairy"),
        }
    }
}

/// Reference basket for one week at 14,000 kcal: (category, item, grams)
const REFERENCE_BASKET: &[(Category, &str, f64)] = &[
    (Category::Vegetables, "Broccoli", 700.0),
    (Category::Vegetables, "Spinach", 500.0),
    (Category::Vegetables, "Bell peppers", 600.0),
    (Category::Vegetables, "Carrots", 800.0),
    (Category::Vegetables, "Tomatoes", 700.0),
    (Category::Fruits, "Bananas", 1000.0),
    (Category::Fruits, "Apples", 1000.0),
    (Category::Fruits, "Berries", 500.0),
    (Category::Fruits, "Oranges", 800.0),
    (Category::Proteins, "Chicken breast", 1200.0),
    (Category::Proteins, "Salmon", 600.0),
    (Category::Proteins, "Eggs", 700.0),
    (Category::Proteins, "Lentils", 500.0),
    (Category::Proteins, "Tofu", 400.0),
    (Category::GrainsAndDairy, "Brown rice", 1000.0),
    (Category::GrainsAndDairy, "Oats", 500.0),
    (Category::GrainsAndDairy, "Whole-wheat bread", 800.0),
    (Category::GrainsAndDairy, "Greek yogurt", 1000.0),
    (Category::GrainsAndDairy, "Milk", 2000.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryItem {
    pub name: String,
    pub grams: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryItems {
    pub vegetables: Vec<GroceryItem>,
    pub fruits: Vec<GroceryItem>,
    pub proteins: Vec<GroceryItem>,
    pub grains_and_dairy: Vec<GroceryItem>,
}

impl GroceryItems {
    pub fn category(&self, category: Category) -> &[GroceryItem] {
        match category {
            Category::Vegetables => &self.vegetables,
            Category::Fruits => &self.fruits,
            Category::Proteins => &self.proteins,
            Category::GrainsAndDairy => &self.grains_and_dairy,
        }
    }

    fn category_mut(&mut self, category: Category) -> &mut Vec<GroceryItem> {
        match category {
            Category::Vegetables => &mut self.vegetables,
            Category::Fruits => &mut self.fruits,
            Category::Proteins => &mut self.proteins,
            Category::GrainsAndDairy => &mut self.grains_and_dairy,
        }
    }

    pub fn total_grams(&self) -> u32 {
        Category::all()
            .iter()
            .flat_map(|c| self.category(*c))
            .map(|item| item.grams)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyMacros {
    pub carbs_grams: f64,
    pub protein_grams: f64,
    pub fat_grams: f64,
}

/// Weekly grocery plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryPlan {
    pub survey_id: Option<Uuid>,
    pub target_daily_calories: f64,
    pub weekly_calories: f64,
    pub weekly_macros: WeeklyMacros,
    pub items: GroceryItems,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<Optimization>,
}

/// Price level the shopper is aiming for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMode {
    Budget,
    Standard,
    Premium,
}

impl Default for PriceMode {
    fn default() -> Self {
        PriceMode::Standard
    }
}

impl PriceMode {
    /// Cost per 1000 kcal as (low, high)
    pub fn rate_per_thousand_kcal(&self) -> (Decimal, Decimal) {
        match self {
            PriceMode::Budget => (dec!(1.80), dec!(2.60)),
            PriceMode::Standard => (dec!(2.75), dec!(3.90)),
            PriceMode::Premium => (dec!(4.50), dec!(6.75)),
        }
    }

    pub fn tips(&self) -> &'static [&'static str] {
        match self {
            PriceMode::Budget => &[
                "Buy rice, oats and lentils in bulk.",
                "Choose frozen vegetables and berries; they keep nutrients and cost less.",
                "Swap salmon for canned fish or eggs on some days.",
                "Plan meals around weekly store promotions.",
            ],
            PriceMode::Standard => &[
                "Shop seasonal produce for the best price and flavour.",
                "Batch-cook proteins and grains twice a week to reduce waste.",
                "Compare unit prices rather than package prices.",
            ],
            PriceMode::Premium => &[
                "Choose wild-caught fish and pasture-raised eggs.",
                "Buy organic for produce eaten with the skin, such as berries and apples.",
                "Visit a farmers' market for fresher seasonal vegetables.",
            ],
        }
    }
}

impl fmt::Display for PriceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceMode::Budget => write!(f, "budget"),
            PriceMode::Standard => write!(f, "standard"),
            PriceMode::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for PriceMode {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "budget" => Ok(PriceMode::Budget),
            "standard" => Ok(PriceMode::Standard),
            "premium" => Ok(PriceMode::Premium),
            _ => Err(HealthError::Validation(vec![format!(
                "priceMode must be one of budget, standard, premium (got {})",
                s
            )])),
        }
    }
}

/// Options for the optimization variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryOptions {
    /// Emit cost estimate, tips and substitutions
    #[serde(default)]
    pub optimize: bool,
    #[serde(default)]
    pub price_mode: PriceMode,
    #[serde(default)]
    pub allergies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub low: Decimal,
    pub high: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub ingredient: String,
    pub alternatives: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    pub price_mode: PriceMode,
    pub weekly_cost: CostEstimate,
    pub tips: Vec<String>,
    pub substitutions: Vec<Substitution>,
    pub unmatched_allergies: Vec<String>,
}

/// Allergy substitution table: (allergen, ingredient, alternatives, reason)
const SUBSTITUTIONS: &[(&str, &str, &[&str], &str)] = &[
    (
        "dairy",
        "Milk & Greek yogurt",
        &["Oat milk", "Soy yogurt", "Coconut yogurt"],
        "Dairy-free alternatives with comparable calcium when fortified",
    ),
    (
        "eggs",
        "Eggs",
        &["Tofu scramble", "Chickpea flour", "Flax eggs"],
        "Egg-free protein and binding options",
    ),
    (
        "fish",
        "Salmon",
        &["Chicken thigh", "Walnuts", "Chia seeds"],
        "Replaces protein and omega-3 fats",
    ),
    (
        "gluten",
        "Whole-wheat bread & oats",
        &["Quinoa", "Certified gluten-free oats", "Buckwheat"],
        "Gluten-free whole grains with similar fibre",
    ),
    (
        "peanuts",
        "Peanut butter",
        &["Sunflower seed butter", "Pumpkin seeds"],
        "Nut-free sources of healthy fats",
    ),
    (
        "shellfish",
        "Shrimp",
        &["White fish", "Chicken breast"],
        "Lean protein without crustacean allergens",
    ),
    (
        "soy",
        "Tofu",
        &["Lentils", "Chickpeas", "Tempeh-free bean patties"],
        "Soy-free plant protein",
    ),
    (
        "tree nuts",
        "Almonds & walnuts",
        &["Sunflower seeds", "Pumpkin seeds"],
        "Seed-based fats and protein",
    ),
];

pub struct GroceryPlanner;

impl GroceryPlanner {
    pub fn validate(daily_calories: f64) -> Result<()> {
        let mut violations = Violations::new();
        violations.check_range("dailyCalories", daily_calories, MIN_DAILY_CALORIES, MAX_DAILY_CALORIES);
        violations.into_result()
    }

    pub fn build(daily_calories: f64, options: &GroceryOptions) -> Result<GroceryPlan> {
        Self::validate(daily_calories)?;

        let weekly_calories = daily_calories * 7.0;
        let optimization = if options.optimize {
            Some(Self::optimize(weekly_calories, options))
        } else {
            None
        };

        Ok(GroceryPlan {
            survey_id: None,
            target_daily_calories: daily_calories,
            weekly_calories,
            weekly_macros: Self::weekly_macros(weekly_calories),
            items: Self::scaled_items(weekly_calories),
            optimization,
        })
    }

    pub fn weekly_macros(weekly_calories: f64) -> WeeklyMacros {
        WeeklyMacros {
            carbs_grams: (weekly_calories * CARBS_RATIO / KCAL_PER_GRAM_CARBS).round(),
            protein_grams: (weekly_calories * PROTEIN_RATIO / KCAL_PER_GRAM_PROTEIN).round(),
            fat_grams: (weekly_calories * FAT_RATIO / KCAL_PER_GRAM_FAT).round(),
        }
    }

    /// Scale the reference basket to the weekly calorie budget
    pub fn scaled_items(weekly_calories: f64) -> GroceryItems {
        let scale = weekly_calories / REFERENCE_WEEKLY_CALORIES;
        let mut items = GroceryItems {
            vegetables: Vec::new(),
            fruits: Vec::new(),
            proteins: Vec::new(),
            grains_and_dairy: Vec::new(),
        };
        for (category, name, grams) in REFERENCE_BASKET {
            items.category_mut(*category).push(GroceryItem {
                name: name.to_string(),
                grams: round_to_step(grams * scale),
            });
        }
        items
    }

    /// Weekly cost range scales linearly with weekly calories; tips and
    /// substitutions depend only on the price mode and allergies.
    fn optimize(weekly_calories: f64, options: &GroceryOptions) -> Optimization {
        let thousands = Decimal::from_f64(weekly_calories / 1000.0).unwrap_or_default();
        let (low_rate, high_rate) = options.price_mode.rate_per_thousand_kcal();

        let (substitutions, unmatched_allergies) = Self::substitutions(&options.allergies);

        Optimization {
            price_mode: options.price_mode,
            weekly_cost: CostEstimate {
                low: (thousands * low_rate).round_dp(2),
                high: (thousands * high_rate).round_dp(2),
                currency: "USD".to_string(),
            },
            tips: options.price_mode.tips().iter().map(|t| t.to_string()).collect(),
            substitutions,
            unmatched_allergies,
        }
    }

    /// Substitutions for the requested allergens, or the full table when none are given
    pub fn substitutions(allergies: &[String]) -> (Vec<Substitution>, Vec<String>) {
        if allergies.is_empty() {
            return (SUBSTITUTIONS.iter().map(to_substitution).collect(), Vec::new());
        }

        let mut matched = Vec::new();
        let mut unmatched = Vec::new();
        for allergy in allergies {
            let key = allergy.trim().to_lowercase();
            match SUBSTITUTIONS.iter().find(|entry| entry.0 == key) {
                Some(entry) => {
                    let substitution = to_substitution(entry);
                    if !matched.contains(&substitution) {
                        matched.push(substitution);
                    }
                }
                None => unmatched.push(allergy.clone()),
            }
        }
        (matched, unmatched)
    }
}

fn to_substitution(entry: &(&str, &str, &[&str], &str)) -> Substitution {
    let (_, ingredient, alternatives, reason) = entry;
    Substitution {
        ingredient: ingredient.to_string(),
        alternatives: alternatives.iter().map(|a| a.to_string()).collect(),
        reason: reason.to_string(),
    }
}

fn round_to_step(grams: f64) -> u32 {
    let rounded = (grams / ROUNDING_STEP_GRAMS).round() * ROUNDING_STEP_GRAMS;
    rounded.max(ROUNDING_STEP_GRAMS) as u32
}
