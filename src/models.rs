use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::HealthError;
use crate::threshold::Status;

/// Gender as reported in the body-metrics survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non-binary",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "non-binary" | "nonbinary" | "non_binary" => Ok(Gender::NonBinary),
            "other" => Ok(Gender::Other),
            _ => Err(HealthError::Validation(vec![format!(
                "gender must be one of male, female, non-binary, other (got {})",
                s
            )])),
        }
    }
}

/// Self-reported activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifestyle {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl Lifestyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifestyle::Sedentary => "sedentary",
            Lifestyle::Light => "light",
            Lifestyle::Moderate => "moderate",
            Lifestyle::Active => "active",
            Lifestyle::VeryActive => "very_active",
        }
    }

    /// TDEE multiplier applied to BMR
    pub fn activity_factor(&self) -> f64 {
        match self {
            Lifestyle::Sedentary => 1.2,
            Lifestyle::Light => 1.375,
            Lifestyle::Moderate => 1.55,
            Lifestyle::Active => 1.725,
            Lifestyle::VeryActive => 1.9,
        }
    }
}

impl fmt::Display for Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Lifestyle {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(Lifestyle::Sedentary),
            "light" => Ok(Lifestyle::Light),
            "moderate" => Ok(Lifestyle::Moderate),
            "active" => Ok(Lifestyle::Active),
            "very_active" => Ok(Lifestyle::VeryActive),
            _ => Err(HealthError::Validation(vec![format!(
                "lifestyle must be one of sedentary, light, moderate, active, very_active (got {})",
                s
            )])),
        }
    }
}

/// Raw body-metrics survey answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyInput {
    pub gender: Gender,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    pub target_days: u32,
    pub lifestyle: Lifestyle,
}

/// Stored survey record
///
/// Immutable once created. Derived metrics are never stored on the record; they
/// are recomputed from `input` whenever the survey is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Uuid,
    #[serde(flatten)]
    pub input: SurveyInput,
    pub created_at: DateTime<Utc>,
}

/// Weight goal creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWeightGoal {
    pub start_weight_kg: f64,
    pub target_weight_kg: f64,
    #[serde(default)]
    pub weigh_in_days: Vec<Weekday>,
    #[serde(default)]
    pub survey_id: Option<Uuid>,
}

/// Weight goal tracked over a series of weight logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightGoal {
    pub id: Uuid,
    pub start_weight_kg: f64,
    pub target_weight_kg: f64,
    /// Weight from the most recent accepted log (start weight until then)
    pub current_weight_kg: f64,
    pub weigh_in_days: Vec<Weekday>,
    pub survey_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub logs_count: u32,
}

/// Mutable goal fields written back after a log is accepted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    pub current_weight_kg: f64,
    pub logs_count: u32,
}

impl WeightGoal {
    pub fn apply_update(&mut self, update: GoalUpdate) {
        self.current_weight_kg = update.current_weight_kg;
        // logs_count never goes backwards
        self.logs_count = self.logs_count.max(update.logs_count);
    }
}

/// Weight log submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightLogInput {
    pub weight_kg: f64,
    #[serde(default)]
    pub water_liters: Option<f64>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Accepted weight log with fields derived at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightLog {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub weight_kg: f64,
    pub water_liters: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub notes: Option<String>,
    pub is_weight_loss: bool,
    pub lost_kg: f64,
    pub remaining_kg: f64,
    pub progress: u8,
    pub progress_status: Status,
    pub hydration_status: Option<Status>,
    pub sleep_status: Option<Status>,
    pub created_at: DateTime<Utc>,
}

/// Standalone daily log submission (hydration litres or sleep hours)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogInput {
    pub value: f64,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub survey_id: Option<Uuid>,
}

/// Daily habit entry, independent of any goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: Uuid,
    pub kind: DailyLogKind,
    pub value: f64,
    pub target: f64,
    pub status: Status,
    pub percentage: f64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

pub type HydrationLog = DailyLog;
pub type SleepLog = DailyLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DailyLogKind {
    Hydration,
    Sleep,
}

impl DailyLogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DailyLogKind::Hydration => "hydration",
            DailyLogKind::Sleep => "sleep",
        }
    }
}

impl std::str::FromStr for DailyLogKind {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hydration" => Ok(DailyLogKind::Hydration),
            "sleep" => Ok(DailyLogKind::Sleep),
            _ => Err(HealthError::InvalidInput(format!("Unknown log kind: {}", s))),
        }
    }
}

/// Parse a weekday name such as "mon" or "Monday"
pub fn parse_weekday(s: &str) -> Result<Weekday, HealthError> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| HealthError::Validation(vec![format!("unknown weigh-in day: {}", s)]))
}

/// Round to a fixed number of decimal places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
