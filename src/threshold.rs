//! Threshold classification shared by every adherence and scoring component
//!
//! Two classifiers live here:
//!
//! - [`ThresholdClassifier`]: maps `actual / target` onto a tri-state
//!   [`Status`] (red / yellow / green). Hydration, sleep, and weight-goal
//!   progress all go through it, each with its own cutoffs.
//! - [`LevelClassifier`]: maps a 0-100 score onto a four-step [`Level`]
//!   used by readiness scoring.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HealthError, Result};

/// Upper bound for reported percentages
pub const MAX_PERCENTAGE: f64 = 999.0;

/// Tri-state adherence status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Red,
    Yellow,
    Green,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Red => "red",
            Status::Yellow => "yellow",
            Status::Green => "green",
        }
    }

    /// Short human label
    pub fn label(&self) -> &'static str {
        match self {
            Status::Red => "Off track",
            Status::Yellow => "Getting there",
            Status::Green => "On track",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "red" => Ok(Status::Red),
            "yellow" => Ok(Status::Yellow),
            "green" => Ok(Status::Green),
            _ => Err(HealthError::InvalidInput(format!("Unknown status: {}", s))),
        }
    }
}

/// Four-step quality level for composite scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Poor => "poor",
            Level::Fair => "fair",
            Level::Good => "good",
            Level::Excellent => "excellent",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying an actual value against its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub status: Status,
    /// Whole-number percentage of target reached, clamped to `[0, 999]`
    pub percentage: f64,
}

/// Tri-state classifier with configurable cutoffs
///
/// `green` when the percentage is at or above `green_at`, `yellow` when at or
/// above `yellow_at`, otherwise `red`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdClassifier {
    pub green_at: f64,
    pub yellow_at: f64,
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::adherence()
    }
}

impl ThresholdClassifier {
    pub fn new(green_at: f64, yellow_at: f64) -> Self {
        Self { green_at, yellow_at }
    }

    /// Daily habit adherence: green ≥ 90, yellow 70-89, red < 70
    pub fn adherence() -> Self {
        Self::new(90.0, 70.0)
    }

    /// Weight-goal progress without a timeframe: green ≥ 50, yellow 10-49, red < 10
    pub fn progress() -> Self {
        Self::new(50.0, 10.0)
    }

    /// Classify a precomputed percentage
    pub fn status_for(&self, percentage: f64) -> Status {
        if percentage >= self.green_at {
            Status::Green
        } else if percentage >= self.yellow_at {
            Status::Yellow
        } else {
            Status::Red
        }
    }

    /// Classify `actual` against `target`
    ///
    /// The percentage is rounded before the status is assigned, so the reported
    /// number and its status always agree.
    pub fn classify(&self, actual: f64, target: f64) -> Result<Classification> {
        if !target.is_finite() || target <= 0.0 {
            return Err(HealthError::InvalidInput(format!(
                "target must be a positive finite number (got {})",
                target
            )));
        }
        if !actual.is_finite() || actual < 0.0 {
            return Err(HealthError::InvalidInput(format!(
                "value must be a non-negative finite number (got {})",
                actual
            )));
        }

        let percentage = clamp_percentage((actual / target * 100.0).round());

        Ok(Classification {
            status: self.status_for(percentage),
            percentage,
        })
    }
}

fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, MAX_PERCENTAGE)
}

/// Four-step classifier: excellent ≥ 80, good 60-79, fair 40-59, poor < 40
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelClassifier {
    pub excellent_at: f64,
    pub good_at: f64,
    pub fair_at: f64,
}

impl Default for LevelClassifier {
    fn default() -> Self {
        Self {
            excellent_at: 80.0,
            good_at: 60.0,
            fair_at: 40.0,
        }
    }
}

impl LevelClassifier {
    pub fn level_for(&self, score: f64) -> Level {
        if score >= self.excellent_at {
            Level::Excellent
        } else if score >= self.good_at {
            Level::Good
        } else if score >= self.fair_at {
            Level::Fair
        } else {
            Level::Poor
        }
    }
}
