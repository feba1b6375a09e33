//! Sleep debt accumulation
//!
//! Debt is the cumulative unmet sleep target over the tracked nights. Nights
//! above target never pay back earlier shortfalls; the surplus is reported
//! separately for information only. Every request recomputes from the full
//! history, no state is carried between calls.

use serde::{Deserialize, Serialize};

use crate::error::{HealthError, Result};
use crate::models::round_to;

/// Floor on the nightly recovery rate used for the recovery estimate (hours)
pub const MIN_RECOVERY_RATE_HOURS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepDebtResult {
    pub target_hours: f64,
    pub debt: f64,
    pub days_tracked: usize,
    pub average_sleep: f64,
    pub days_to_recover: u32,
    pub surplus_hours: f64,
    pub worst_night: f64,
}

pub struct SleepDebtTracker;

impl SleepDebtTracker {
    pub fn compute(target_hours: f64, sleep_hours: &[f64]) -> Result<SleepDebtResult> {
        if !target_hours.is_finite() || target_hours <= 0.0 || target_hours > 24.0 {
            return Err(HealthError::InvalidInput(format!(
                "target hours must be greater than 0 and at most 24 (got {})",
                target_hours
            )));
        }
        if sleep_hours.is_empty() {
            return Err(HealthError::InvalidInput(
                "sleep history must contain at least one night".to_string(),
            ));
        }
        if let Some((index, night)) = sleep_hours
            .iter()
            .enumerate()
            .find(|(_, h)| !h.is_finite() || **h < 0.0 || **h > 24.0)
        {
            return Err(HealthError::InvalidInput(format!(
                "night {} has invalid sleep hours: {}",
                index + 1,
                night
            )));
        }

        let debt: f64 = sleep_hours.iter().map(|h| (target_hours - h).max(0.0)).sum();
        let surplus: f64 = sleep_hours.iter().map(|h| (h - target_hours).max(0.0)).sum();
        let average_sleep =
            round_to(sleep_hours.iter().sum::<f64>() / sleep_hours.len() as f64, 2);
        let worst_night = sleep_hours.iter().copied().fold(f64::INFINITY, f64::min);

        let debt = round_to(debt, 2);
        let days_to_recover = if debt > 0.0 {
            let rate = (target_hours - average_sleep).max(MIN_RECOVERY_RATE_HOURS);
            (debt / rate).ceil() as u32
        } else {
            0
        };

        Ok(SleepDebtResult {
            target_hours,
            debt,
            days_tracked: sleep_hours.len(),
            average_sleep,
            days_to_recover,
            surplus_hours: round_to(surplus, 2),
            worst_night,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_of_sleep() {
        let result =
            SleepDebtTracker::compute(8.0, &[7.0, 7.5, 8.0, 6.5, 7.0, 7.5, 8.0]).unwrap();

        assert_eq!(result.days_tracked, 7);
        assert_eq!(result.average_sleep, 7.36);
        // 1 + 0.5 + 0 + 1.5 + 1 + 0.5 + 0
        assert_eq!(result.debt, 4.5);
        // 4.5 / (8 - 7.36)
        assert_eq!(result.days_to_recover, 8);
        assert_eq!(result.worst_night, 6.5);
        assert_eq!(result.surplus_hours, 0.0);
    }

    #[test]
    fn test_surplus_does_not_offset_debt() {
        let result = SleepDebtTracker::compute(8.0, &[6.0, 10.0]).unwrap();
        assert_eq!(result.debt, 2.0);
        assert_eq!(result.surplus_hours, 2.0);
        assert_eq!(result.average_sleep, 8.0);
        // denominator floors at 0.5h
        assert_eq!(result.days_to_recover, 4);
    }

    #[test]
    fn test_no_debt() {
        let result = SleepDebtTracker::compute(7.0, &[7.0, 8.0]).unwrap();
        assert_eq!(result.debt, 0.0);
        assert_eq!(result.days_to_recover, 0);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            SleepDebtTracker::compute(8.0, &[]),
            Err(HealthError::InvalidInput(_))
        ));
        assert!(matches!(
            SleepDebtTracker::compute(0.0, &[7.0]),
            Err(HealthError::InvalidInput(_))
        ));
        assert!(matches!(
            SleepDebtTracker::compute(8.0, &[7.0, f64::NAN]),
            Err(HealthError::InvalidInput(_))
        ));
    }
}
