//! Hydration and sleep adherence
//!
//! Resolves the daily target for a habit (from the linked survey when there is
//! one, otherwise a global default) and classifies the logged value against it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Result, Violations};
use crate::metrics::MetricsCalculator;
use crate::models::{round_to, DailyLog, DailyLogKind, Survey};
use crate::threshold::{Classification, Status, ThresholdClassifier};

pub const DEFAULT_WATER_TARGET_LITERS: f64 = 2.5;
pub const DEFAULT_SLEEP_TARGET_HOURS: f64 = 8.0;

pub const MAX_WATER_LITERS_PER_DAY: f64 = 20.0;
pub const MAX_SLEEP_HOURS_PER_DAY: f64 = 24.0;

/// Classifies hydration and sleep against personal or default targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdherenceStatusEngine {
    pub classifier: ThresholdClassifier,
    pub default_water_liters: f64,
    pub default_sleep_hours: f64,
}

impl Default for AdherenceStatusEngine {
    fn default() -> Self {
        Self {
            classifier: ThresholdClassifier::adherence(),
            default_water_liters: DEFAULT_WATER_TARGET_LITERS,
            default_sleep_hours: DEFAULT_SLEEP_TARGET_HOURS,
        }
    }
}

impl AdherenceStatusEngine {
    /// Daily target for a habit, taken from the survey when one is linked
    pub fn resolve_target(&self, kind: DailyLogKind, survey: Option<&Survey>) -> f64 {
        match (kind, survey) {
            (DailyLogKind::Hydration, Some(survey)) => {
                MetricsCalculator::water_target(survey.input.weight_kg)
            }
            (DailyLogKind::Sleep, Some(_)) => crate::metrics::SLEEP_TARGET_HOURS,
            (DailyLogKind::Hydration, None) => {
                debug!(default_target = self.default_water_liters, "Using default hydration target");
                self.default_water_liters
            }
            (DailyLogKind::Sleep, None) => {
                debug!(default_target = self.default_sleep_hours, "Using default sleep target");
                self.default_sleep_hours
            }
        }
    }

    pub fn hydration(&self, liters: f64, survey: Option<&Survey>) -> Result<Classification> {
        self.classify(DailyLogKind::Hydration, liters, survey)
    }

    pub fn sleep(&self, hours: f64, survey: Option<&Survey>) -> Result<Classification> {
        self.classify(DailyLogKind::Sleep, hours, survey)
    }

    pub fn classify(
        &self,
        kind: DailyLogKind,
        value: f64,
        survey: Option<&Survey>,
    ) -> Result<Classification> {
        let target = self.resolve_target(kind, survey);
        self.classifier.classify(value, target)
    }

    /// Check a logged value against the physical bounds for its habit
    pub fn validate_value(kind: DailyLogKind, value: f64) -> Result<()> {
        let mut violations = Violations::new();
        match kind {
            DailyLogKind::Hydration => {
                violations.check_range("waterLiters", value, 0.0, MAX_WATER_LITERS_PER_DAY)
            }
            DailyLogKind::Sleep => {
                violations.check_range("sleepHours", value, 0.0, MAX_SLEEP_HOURS_PER_DAY)
            }
        }
        violations.into_result()
    }

    /// Summarize a series of daily logs of one habit
    ///
    /// Logs may arrive in any order. When several entries share a date only
    /// the latest-created one counts, for the day tallies as well as the streak.
    pub fn summarize(logs: &[DailyLog]) -> AdherenceSummary {
        let mut summary = AdherenceSummary::default();

        let mut by_date: BTreeMap<NaiveDate, &DailyLog> = BTreeMap::new();
        for log in logs {
            let replace = by_date
                .get(&log.date)
                .map_or(true, |existing| log.created_at >= existing.created_at);
            if replace {
                by_date.insert(log.date, log);
            }
        }
        if by_date.is_empty() {
            return summary;
        }

        for log in by_date.values() {
            match log.status {
                Status::Green => summary.green_days += 1,
                Status::Yellow => summary.yellow_days += 1,
                Status::Red => summary.red_days += 1,
            }
        }
        let total: f64 = by_date.values().map(|log| log.percentage).sum();
        summary.average_percentage = round_to(total / by_date.len() as f64, 1);

        let mut expected: Option<NaiveDate> = None;
        for (date, log) in by_date.iter().rev() {
            if log.status != Status::Green {
                break;
            }
            if let Some(expected_date) = expected {
                if *date != expected_date {
                    break;
                }
            }
            summary.current_green_streak += 1;
            expected = date.pred_opt();
        }

        summary.days_logged = by_date.len() as u32;
        summary
    }
}

/// Aggregate view over a series of daily habit logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceSummary {
    pub days_logged: u32,
    pub green_days: u32,
    pub yellow_days: u32,
    pub red_days: u32,
    pub average_percentage: f64,
    /// Consecutive green days ending at the most recent logged date
    pub current_green_streak: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Lifestyle, SurveyInput};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn survey(weight_kg: f64) -> Survey {
        Survey {
            id: Uuid::new_v4(),
            input: SurveyInput {
                gender: Gender::Female,
                age: 35,
                height_cm: 165.0,
                weight_kg,
                target_weight_kg: weight_kg - 5.0,
                target_days: 120,
                lifestyle: Lifestyle::Light,
            },
            created_at: Utc::now(),
        }
    }

    fn log(day: u32, status: Status, percentage: f64) -> DailyLog {
        DailyLog {
            id: Uuid::new_v4(),
            kind: DailyLogKind::Hydration,
            value: 2.0,
            target: 2.5,
            status,
            percentage,
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 20, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_default_targets_without_survey() {
        let engine = AdherenceStatusEngine::default();

        let hydration = engine.hydration(2.0, None).unwrap();
        assert_eq!(hydration.percentage, 80.0);
        assert_eq!(hydration.status, Status::Yellow);

        let sleep = engine.sleep(7.5, None).unwrap();
        assert_eq!(sleep.percentage, 94.0);
        assert_eq!(sleep.status, Status::Green);
    }

    #[test]
    fn test_survey_targets() {
        let engine = AdherenceStatusEngine::default();
        let survey = survey(100.0);

        // 100 kg * 0.033 = 3.3 L
        assert_eq!(engine.resolve_target(DailyLogKind::Hydration, Some(&survey)), 3.3);
        assert_eq!(engine.resolve_target(DailyLogKind::Sleep, Some(&survey)), 7.5);

        let hydration = engine.hydration(2.5, Some(&survey)).unwrap();
        assert_eq!(hydration.percentage, 76.0);
        assert_eq!(hydration.status, Status::Yellow);

        let sleep = engine.sleep(7.5, Some(&survey)).unwrap();
        assert_eq!(sleep.percentage, 100.0);
    }

    #[test]
    fn test_value_bounds() {
        assert!(AdherenceStatusEngine::validate_value(DailyLogKind::Sleep, 25.0).is_err());
        assert!(AdherenceStatusEngine::validate_value(DailyLogKind::Hydration, -1.0).is_err());
        assert!(AdherenceStatusEngine::validate_value(DailyLogKind::Hydration, 3.0).is_ok());
    }

    #[test]
    fn test_summary_streak() {
        let logs = vec![
            log(1, Status::Green, 100.0),
            log(2, Status::Red, 40.0),
            log(4, Status::Green, 96.0),
            log(3, Status::Green, 92.0),
            log(5, Status::Green, 90.0),
        ];
        let summary = AdherenceStatusEngine::summarize(&logs);

        assert_eq!(summary.days_logged, 5);
        assert_eq!(summary.green_days, 4);
        assert_eq!(summary.red_days, 1);
        assert_eq!(summary.current_green_streak, 3);
        assert_eq!(summary.average_percentage, 83.6);
    }

    #[test]
    fn test_summary_counts_one_entry_per_date() {
        let morning = DailyLog {
            created_at: Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap(),
            ..log(4, Status::Yellow, 80.0)
        };
        let evening = log(4, Status::Green, 100.0);
        let earlier_day = log(3, Status::Red, 40.0);

        let summary = AdherenceStatusEngine::summarize(&[evening, earlier_day, morning]);
        assert_eq!(summary.days_logged, 2);
        assert_eq!(summary.green_days, 1);
        assert_eq!(summary.yellow_days, 0);
        assert_eq!(summary.red_days, 1);
        assert_eq!(summary.average_percentage, 70.0);
        assert_eq!(summary.current_green_streak, 1);
    }

    #[test]
    fn test_summary_streak_breaks_on_gap() {
        let logs = vec![log(1, Status::Green, 100.0), log(3, Status::Green, 100.0)];
        let summary = AdherenceStatusEngine::summarize(&logs);
        assert_eq!(summary.current_green_streak, 1);

        assert_eq!(AdherenceStatusEngine::summarize(&[]), AdherenceSummary::default());
    }
}
