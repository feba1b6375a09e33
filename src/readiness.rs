//! Training readiness from HRV, resting heart rate and sleep
//!
//! # Background
//!
//! - **HRV** (heart rate variability, ms): higher values indicate parasympathetic
//!   dominance and better recovery.
//! - **Resting HR** (bpm): an elevated morning heart rate is an early sign of
//!   fatigue, illness or under-recovery.
//! - **Sleep** (hours): the single biggest driver of day-to-day recovery.
//!
//! Each factor is classified against fixed reference bands and mapped to a
//! sub-score of 100 / 50 / 0. The composite score weights HRV 40%, resting HR
//! 30% and sleep 30%, and the readiness level is the four-step level of that
//! composite. Advice is deterministic: the same inputs always yield the same text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, Violations};
use crate::threshold::{Level, LevelClassifier};

pub const HRV_WEIGHT: f64 = 0.4;
pub const RESTING_HR_WEIGHT: f64 = 0.3;
pub const SLEEP_WEIGHT: f64 = 0.3;

/// Status of one readiness factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorStatus {
    Good,
    /// Sleep that meets the reference amount
    Adequate,
    Fair,
    Poor,
}

impl FactorStatus {
    /// Sub-score used in the weighted composite
    pub fn sub_score(&self) -> f64 {
        match self {
            FactorStatus::Good | FactorStatus::Adequate => 100.0,
            FactorStatus::Fair => 50.0,
            FactorStatus::Poor => 0.0,
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, FactorStatus::Good | FactorStatus::Adequate)
    }
}

impl fmt::Display for FactorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorStatus::Good => write!(f, "good"),
            FactorStatus::Adequate => write!(f, "adequate"),
            FactorStatus::Fair => write!(f, "fair"),
            FactorStatus::Poor => write!(f, "poor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub value: f64,
    pub status: FactorStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessFactors {
    pub hrv: Factor,
    pub resting_hr: Factor,
    pub sleep: Factor,
}

/// Readiness assessment for one morning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResult {
    pub score: u8,
    pub level: Level,
    pub factors: ReadinessFactors,
    pub recommendations: Vec<String>,
}

/// Readiness scoring
pub struct ReadinessScorer;

impl ReadinessScorer {
    pub fn validate(hrv: f64, resting_hr: f64, sleep_hours: f64) -> Result<()> {
        let mut violations = Violations::new();
        if !hrv.is_finite() || hrv <= 0.0 || hrv > 300.0 {
            violations.push(format!("hrv must be greater than 0 and at most 300 ms (got {})", hrv));
        }
        violations.check_range("restingHr", resting_hr, 25.0, 220.0);
        violations.check_range("sleepHours", sleep_hours, 0.0, 24.0);
        violations.into_result()
    }

    /// HRV band: ≥ 60 ms good, 40-59 fair, < 40 poor
    pub fn hrv_status(hrv: f64) -> FactorStatus {
        if hrv >= 60.0 {
            FactorStatus::Good
        } else if hrv >= 40.0 {
            FactorStatus::Fair
        } else {
            FactorStatus::Poor
        }
    }

    /// Resting HR band: ≤ 60 bpm good, 61-75 fair, > 75 poor
    pub fn resting_hr_status(resting_hr: f64) -> FactorStatus {
        if resting_hr <= 60.0 {
            FactorStatus::Good
        } else if resting_hr <= 75.0 {
            FactorStatus::Fair
        } else {
            FactorStatus::Poor
        }
    }

    /// Sleep band: ≥ 7 h adequate, 6-7 fair, < 6 poor
    pub fn sleep_status(sleep_hours: f64) -> FactorStatus {
        if sleep_hours >= 7.0 {
            FactorStatus::Adequate
        } else if sleep_hours >= 6.0 {
            FactorStatus::Fair
        } else {
            FactorStatus::Poor
        }
    }

    pub fn score(hrv: f64, resting_hr: f64, sleep_hours: f64) -> Result<ReadinessResult> {
        Self::validate(hrv, resting_hr, sleep_hours)?;

        let factors = ReadinessFactors {
            hrv: Factor {
                value: hrv,
                status: Self::hrv_status(hrv),
            },
            resting_hr: Factor {
                value: resting_hr,
                status: Self::resting_hr_status(resting_hr),
            },
            sleep: Factor {
                value: sleep_hours,
                status: Self::sleep_status(sleep_hours),
            },
        };

        let composite = factors.hrv.status.sub_score() * HRV_WEIGHT
            + factors.resting_hr.status.sub_score() * RESTING_HR_WEIGHT
            + factors.sleep.status.sub_score() * SLEEP_WEIGHT;
        let score = composite.round().clamp(0.0, 100.0);
        let level = LevelClassifier::default().level_for(score);

        Ok(ReadinessResult {
            score: score as u8,
            level,
            recommendations: Self::recommendations(level, &factors),
            factors,
        })
    }

    /// Level-keyed advice followed by one line per factor that is not good
    pub fn recommendations(level: Level, factors: &ReadinessFactors) -> Vec<String> {
        let mut advice: Vec<String> = match level {
            Level::Excellent => vec![
                "You're well recovered - a good day for a hard or long session.",
                "Keep your sleep and hydration routine consistent.",
            ],
            Level::Good => vec![
                "Moderate to hard training is fine today.",
                "Include a proper warm-up and monitor how you feel.",
            ],
            Level::Fair => vec![
                "Favour easy aerobic work or technique today.",
                "Prioritise an early night and steady hydration.",
            ],
            Level::Poor => vec![
                "Take a rest day or very light movement only.",
                "Focus on sleep, nutrition and stress management before training hard again.",
            ],
        }
        .into_iter()
        .map(String::from)
        .collect();

        if !factors.hrv.status.is_good() {
            advice.push("HRV is below your reference range; avoid high-intensity intervals.".to_string());
        }
        if !factors.resting_hr.status.is_good() {
            advice.push(
                "Resting heart rate is elevated; check for illness, stress or accumulated fatigue."
                    .to_string(),
            );
        }
        if !factors.sleep.status.is_good() {
            advice.push("You slept less than 7 hours; aim for at least 7-9 hours tonight.".to_string());
        }
        advice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthError;

    #[test]
    fn test_well_recovered_is_excellent() {
        let result = ReadinessScorer::score(65.0, 55.0, 7.5).unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(result.level, Level::Excellent);
        assert_eq!(result.factors.hrv.status, FactorStatus::Good);
        assert_eq!(result.factors.resting_hr.status, FactorStatus::Good);
        assert_eq!(result.factors.sleep.status, FactorStatus::Adequate);
        assert_eq!(result.recommendations.len(), 2);
    }

    #[test]
    fn test_weighted_composite() {
        // fair HRV (50*0.4), good HR (100*0.3), poor sleep (0)
        let result = ReadinessScorer::score(45.0, 58.0, 5.0).unwrap();
        assert_eq!(result.score, 50);
        assert_eq!(result.level, Level::Fair);
        assert_eq!(result.recommendations.len(), 4);

        let result = ReadinessScorer::score(30.0, 80.0, 4.0).unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.level, Level::Poor);

        // good HRV, fair HR, fair sleep: 40 + 15 + 15
        let result = ReadinessScorer::score(70.0, 70.0, 6.5).unwrap();
        assert_eq!(result.score, 70);
        assert_eq!(result.level, Level::Good);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(ReadinessScorer::hrv_status(60.0), FactorStatus::Good);
        assert_eq!(ReadinessScorer::hrv_status(40.0), FactorStatus::Fair);
        assert_eq!(ReadinessScorer::resting_hr_status(60.0), FactorStatus::Good);
        assert_eq!(ReadinessScorer::resting_hr_status(75.0), FactorStatus::Fair);
        assert_eq!(ReadinessScorer::resting_hr_status(76.0), FactorStatus::Poor);
        assert_eq!(ReadinessScorer::sleep_status(7.0), FactorStatus::Adequate);
        assert_eq!(ReadinessScorer::sleep_status(5.9), FactorStatus::Poor);
    }

    #[test]
    fn test_deterministic_advice() {
        let a = ReadinessScorer::score(50.0, 66.0, 6.2).unwrap();
        let b = ReadinessScorer::score(50.0, 66.0, 6.2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_validation() {
        let err = ReadinessScorer::score(0.0, 300.0, 25.0).unwrap_err();
        assert!(matches!(err, HealthError::Validation(ref v) if v.len() == 3));
        assert!(ReadinessScorer::score(f64::NAN, 60.0, 7.0).is_err());
    }
}
