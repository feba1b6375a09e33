//! Weight-goal progress tracking
//!
//! A goal stays open for as long as logs keep arriving; completion is inferred
//! per log by comparing the new weight with the target. Each accepted log
//! captures its derived fields (progress, status, hydration/sleep status) at
//! creation time and is never recomputed when later logs arrive.
//!
//! # Progress status
//!
//! With a linked survey the goal has a timeframe (`targetDays` counted from goal
//! creation). Progress is then judged against the progress expected for the
//! elapsed time, using the adherence bands. Without a timeframe, or on the day
//! the goal was created, fixed progress bands apply (green ≥ 50, yellow ≥ 10).

use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::adherence::{AdherenceStatusEngine, MAX_SLEEP_HOURS_PER_DAY, MAX_WATER_LITERS_PER_DAY};
use crate::error::{HealthError, Result, Violations};
use crate::metrics::{MetricsCalculator, MAX_WEIGHT_KG, MIN_WEIGHT_KG};
use crate::models::{
    round_to, GoalUpdate, NewWeightGoal, Survey, WeightGoal, WeightLog, WeightLogInput,
};
use crate::threshold::{Status, ThresholdClassifier};

/// Encouragement emitted when a log shows weight loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Celebration {
    pub message: String,
    /// Kilograms still to lose
    pub remaining: f64,
}

/// Everything produced by accepting one weight log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightLogOutcome {
    pub goal_update: GoalUpdate,
    pub log: WeightLog,
    pub celebration: Option<Celebration>,
    /// Progress expected by now when the goal has a timeframe
    pub expected_progress: Option<f64>,
    pub projected_completion_date: Option<NaiveDate>,
}

/// Longitudinal view over all logs of a goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub goal_id: Uuid,
    pub total_logs: usize,
    /// Latest weight minus start weight (negative means weight lost)
    pub net_change_kg: f64,
    pub lowest_weight_kg: Option<f64>,
    pub longest_loss_streak: u32,
    /// Average change per week between the first and latest log
    pub average_weekly_change_kg: Option<f64>,
    pub goal_reached: bool,
}

/// Applies weight logs to goals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgressTracker {
    pub progress_bands: ThresholdClassifier,
    pub adherence: AdherenceStatusEngine,
}

impl Default for GoalProgressTracker {
    fn default() -> Self {
        Self {
            progress_bands: ThresholdClassifier::progress(),
            adherence: AdherenceStatusEngine::default(),
        }
    }
}

impl GoalProgressTracker {
    pub fn new(progress_bands: ThresholdClassifier, adherence: AdherenceStatusEngine) -> Self {
        Self {
            progress_bands,
            adherence,
        }
    }

    /// Build a new open goal from a creation request
    pub fn create_goal(
        request: &NewWeightGoal,
        id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<WeightGoal> {
        let mut violations = Violations::new();
        violations.check_range("startWeightKg", request.start_weight_kg, MIN_WEIGHT_KG, MAX_WEIGHT_KG);
        violations.check_range(
            "targetWeightKg",
            request.target_weight_kg,
            MIN_WEIGHT_KG,
            MAX_WEIGHT_KG,
        );
        violations.into_result()?;

        let mut weigh_in_days: Vec<Weekday> = Vec::new();
        for day in &request.weigh_in_days {
            if !weigh_in_days.contains(day) {
                weigh_in_days.push(*day);
            }
        }
        weigh_in_days.sort_by_key(|day| day.num_days_from_monday());

        Ok(WeightGoal {
            id,
            start_weight_kg: request.start_weight_kg,
            target_weight_kg: request.target_weight_kg,
            current_weight_kg: request.start_weight_kg,
            weigh_in_days,
            survey_id: request.survey_id,
            created_at,
            logs_count: 0,
        })
    }

    fn validate_log(input: &WeightLogInput) -> Result<()> {
        let mut violations = Violations::new();
        violations.check_range("weightKg", input.weight_kg, MIN_WEIGHT_KG, MAX_WEIGHT_KG);
        if let Some(water) = input.water_liters {
            violations.check_range("waterLiters", water, 0.0, MAX_WATER_LITERS_PER_DAY);
        }
        if let Some(sleep) = input.sleep_hours {
            violations.check_range("sleepHours", sleep, 0.0, MAX_SLEEP_HOURS_PER_DAY);
        }
        violations.into_result()
    }

    /// Accept a weight log against the goal's current state
    ///
    /// The goal itself is not modified; the caller persists `goal_update`.
    pub fn apply_log(
        &self,
        goal: &WeightGoal,
        survey: Option<&Survey>,
        input: &WeightLogInput,
        log_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<WeightLogOutcome> {
        Self::validate_log(input)?;

        let total_to_lose = goal.start_weight_kg - goal.target_weight_kg;
        if total_to_lose <= 0.0 {
            return Err(HealthError::InvalidGoal(format!(
                "target weight {} kg is not below start weight {} kg",
                goal.target_weight_kg, goal.start_weight_kg
            )));
        }

        let previous_weight = if goal.logs_count == 0 {
            goal.start_weight_kg
        } else {
            goal.current_weight_kg
        };
        let new_weight = input.weight_kg;

        let is_weight_loss = new_weight < previous_weight;
        let lost_kg = goal.start_weight_kg - new_weight;
        let progress = (lost_kg / total_to_lose * 100.0).round().clamp(0.0, 100.0) as u8;
        let remaining_kg = (new_weight - goal.target_weight_kg).max(0.0);

        let expected_progress = survey.and_then(|s| Self::expected_progress(goal, s, now));
        let progress_status = self.progress_status(progress as f64, expected_progress);

        let hydration_status = input
            .water_liters
            .map(|water| self.adherence.hydration(water, survey))
            .transpose()?
            .map(|c| c.status);
        let sleep_status = input
            .sleep_hours
            .map(|hours| self.adherence.sleep(hours, survey))
            .transpose()?
            .map(|c| c.status);

        let celebration = if is_weight_loss {
            Some(Self::celebrate(lost_kg, previous_weight - new_weight, remaining_kg))
        } else {
            None
        };

        let projected_completion_date = match survey {
            Some(s) => MetricsCalculator::compute(&s.input)?
                .estimated_days_to_goal
                .map(|days| s.created_at.date_naive() + Duration::days(days as i64)),
            None => None,
        };

        debug!(
            goal_id = %goal.id,
            progress,
            status = %progress_status,
            is_weight_loss,
            "Weight log applied"
        );

        Ok(WeightLogOutcome {
            goal_update: GoalUpdate {
                current_weight_kg: new_weight,
                logs_count: goal.logs_count + 1,
            },
            log: WeightLog {
                id: log_id,
                goal_id: goal.id,
                weight_kg: new_weight,
                water_liters: input.water_liters,
                sleep_hours: input.sleep_hours,
                notes: input.notes.clone(),
                is_weight_loss,
                lost_kg: round_to(lost_kg, 1),
                remaining_kg: round_to(remaining_kg, 1),
                progress,
                progress_status,
                hydration_status,
                sleep_status,
                created_at: now,
            },
            celebration,
            expected_progress,
            projected_completion_date,
        })
    }

    /// Percentage of the goal expected to be done after the elapsed days
    pub fn expected_progress(goal: &WeightGoal, survey: &Survey, now: DateTime<Utc>) -> Option<f64> {
        let target_days = survey.input.target_days;
        if target_days == 0 {
            return None;
        }
        let elapsed_days = (now - goal.created_at).num_days().max(0) as f64;
        Some(round_to((elapsed_days / target_days as f64 * 100.0).min(100.0), 1))
    }

    pub fn progress_status(&self, progress: f64, expected: Option<f64>) -> Status {
        match expected {
            Some(expected) if expected > 0.0 => self
                .adherence
                .classifier
                .status_for((progress / expected * 100.0).round()),
            _ => self.progress_bands.status_for(progress),
        }
    }

    fn celebrate(lost_kg: f64, since_last_kg: f64, remaining_kg: f64) -> Celebration {
        let message = if remaining_kg <= 0.0 {
            format!("Goal reached! You've lost {:.1} kg.", lost_kg)
        } else if lost_kg > 0.0 {
            format!(
                "Great progress! You've lost {:.1} kg so far, {:.1} kg to go.",
                lost_kg, remaining_kg
            )
        } else {
            format!(
                "Nice work! You're down {:.1} kg since your last weigh-in ({:.1} kg overall).",
                since_last_kg, lost_kg
            )
        };
        Celebration {
            message,
            remaining: round_to(remaining_kg, 1),
        }
    }

    /// Summarize every log recorded for a goal
    pub fn summarize(goal: &WeightGoal, logs: &[WeightLog]) -> GoalSummary {
        let mut ordered: Vec<&WeightLog> = logs.iter().filter(|l| l.goal_id == goal.id).collect();
        ordered.sort_by_key(|l| l.created_at);

        let latest_weight = ordered.last().map_or(goal.current_weight_kg, |l| l.weight_kg);
        let lowest_weight_kg = ordered.iter().map(|l| l.weight_kg).reduce(f64::min);

        let mut longest_loss_streak = 0;
        let mut streak = 0;
        for log in &ordered {
            if log.is_weight_loss {
                streak += 1;
                longest_loss_streak = longest_loss_streak.max(streak);
            } else {
                streak = 0;
            }
        }

        let average_weekly_change_kg = match (ordered.first(), ordered.last()) {
            (Some(first), Some(last)) => {
                let days = (last.created_at - first.created_at).num_days();
                if days >= 1 {
                    Some(round_to((last.weight_kg - first.weight_kg) / days as f64 * 7.0, 2))
                } else {
                    None
                }
            }
            _ => None,
        };

        GoalSummary {
            goal_id: goal.id,
            total_logs: ordered.len(),
            net_change_kg: round_to(latest_weight - goal.start_weight_kg, 1),
            lowest_weight_kg,
            longest_loss_streak,
            average_weekly_change_kg,
            goal_reached: latest_weight <= goal.target_weight_kg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Lifestyle, SurveyInput};
    use chrono::TimeZone;

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    fn goal(start: f64, target: f64) -> WeightGoal {
        GoalProgressTracker::create_goal(
            &NewWeightGoal {
                start_weight_kg: start,
                target_weight_kg: target,
                weigh_in_days: vec![Weekday::Fri, Weekday::Mon, Weekday::Mon],
                survey_id: None,
            },
            Uuid::new_v4(),
            start_time(),
        )
        .unwrap()
    }

    fn weigh(weight_kg: f64) -> WeightLogInput {
        WeightLogInput {
            weight_kg,
            ..Default::default()
        }
    }

    fn survey(target_days: u32) -> Survey {
        Survey {
            id: Uuid::new_v4(),
            input: SurveyInput {
                gender: Gender::Male,
                age: 40,
                height_cm: 178.0,
                weight_kg: 90.0,
                target_weight_kg: 80.0,
                target_days,
                lifestyle: Lifestyle::Moderate,
            },
            created_at: start_time(),
        }
    }

    #[test]
    fn test_first_log_progress() {
        let tracker = GoalProgressTracker::default();
        let goal = goal(90.0, 80.0);

        let outcome = tracker
            .apply_log(&goal, None, &weigh(88.5), Uuid::new_v4(), start_time())
            .unwrap();

        assert!(outcome.log.is_weight_loss);
        assert_eq!(outcome.log.lost_kg, 1.5);
        assert_eq!(outcome.log.remaining_kg, 8.5);
        assert_eq!(outcome.log.progress, 15);
        assert_eq!(outcome.log.progress_status, Status::Yellow);
        assert_eq!(outcome.goal_update.current_weight_kg, 88.5);
        assert_eq!(outcome.goal_update.logs_count, 1);

        let celebration = outcome.celebration.unwrap();
        assert!(celebration.message.contains("1.5 kg"));
        assert_eq!(celebration.remaining, 8.5);
    }

    #[test]
    fn test_weight_gain_has_no_celebration() {
        let tracker = GoalProgressTracker::default();
        let mut goal = goal(90.0, 80.0);
        goal.apply_update(GoalUpdate {
            current_weight_kg: 88.0,
            logs_count: 1,
        });

        let outcome = tracker
            .apply_log(&goal, None, &weigh(91.0), Uuid::new_v4(), start_time())
            .unwrap();

        assert!(!outcome.log.is_weight_loss);
        assert_eq!(outcome.log.lost_kg, -1.0);
        assert_eq!(outcome.log.progress, 0);
        assert_eq!(outcome.log.progress_status, Status::Red);
        assert!(outcome.celebration.is_none());
    }

    #[test]
    fn test_loss_since_last_log_while_above_start() {
        let tracker = GoalProgressTracker::default();
        let mut goal = goal(90.0, 80.0);
        goal.apply_update(GoalUpdate {
            current_weight_kg: 92.0,
            logs_count: 1,
        });

        let outcome = tracker
            .apply_log(&goal, None, &weigh(91.0), Uuid::new_v4(), start_time())
            .unwrap();
        assert!(outcome.log.is_weight_loss);
        let celebration = outcome.celebration.unwrap();
        assert!(celebration.message.contains("since your last weigh-in"));
    }

    #[test]
    fn test_goal_reached_caps_progress() {
        let tracker = GoalProgressTracker::default();
        let goal = goal(90.0, 80.0);

        let outcome = tracker
            .apply_log(&goal, None, &weigh(78.0), Uuid::new_v4(), start_time())
            .unwrap();
        assert_eq!(outcome.log.progress, 100);
        assert_eq!(outcome.log.remaining_kg, 0.0);
        assert_eq!(outcome.log.progress_status, Status::Green);
        assert!(outcome.celebration.unwrap().message.starts_with("Goal reached"));
    }

    #[test]
    fn test_non_reducing_goal_is_invalid() {
        let tracker = GoalProgressTracker::default();
        let goal = goal(80.0, 85.0);
        let result = tracker.apply_log(&goal, None, &weigh(79.0), Uuid::new_v4(), start_time());
        assert!(matches!(result, Err(HealthError::InvalidGoal(_))));
    }

    #[test]
    fn test_log_validation() {
        let tracker = GoalProgressTracker::default();
        let goal = goal(90.0, 80.0);
        let input = WeightLogInput {
            weight_kg: 400.0,
            water_liters: Some(-1.0),
            sleep_hours: Some(30.0),
            notes: None,
        };
        let err = tracker
            .apply_log(&goal, None, &input, Uuid::new_v4(), start_time())
            .unwrap_err();
        assert_eq!(err.violations().len(), 3);
    }

    #[test]
    fn test_hydration_and_sleep_status_use_defaults() {
        let tracker = GoalProgressTracker::default();
        let goal = goal(90.0, 80.0);
        let input = WeightLogInput {
            weight_kg: 89.0,
            water_liters: Some(2.0),
            sleep_hours: Some(5.0),
            notes: Some("after holidays".to_string()),
        };
        let outcome = tracker
            .apply_log(&goal, None, &input, Uuid::new_v4(), start_time())
            .unwrap();
        assert_eq!(outcome.log.hydration_status, Some(Status::Yellow));
        assert_eq!(outcome.log.sleep_status, Some(Status::Red));
        assert_eq!(outcome.log.notes.as_deref(), Some("after holidays"));
    }

    #[test]
    fn test_timeframe_status() {
        let tracker = GoalProgressTracker::default();
        let survey = survey(100);
        let mut goal = goal(90.0, 80.0);
        goal.survey_id = Some(survey.id);

        // 20 of 100 days elapsed: 20% expected, 15% achieved → 75% of pace
        let now = start_time() + Duration::days(20);
        let outcome = tracker
            .apply_log(&goal, Some(&survey), &weigh(88.5), Uuid::new_v4(), now)
            .unwrap();
        assert_eq!(outcome.expected_progress, Some(20.0));
        assert_eq!(outcome.log.progress_status, Status::Yellow);

        // 10 of 100 days elapsed: ahead of pace
        let now = start_time() + Duration::days(10);
        let outcome = tracker
            .apply_log(&goal, Some(&survey), &weigh(88.5), Uuid::new_v4(), now)
            .unwrap();
        assert_eq!(outcome.log.progress_status, Status::Green);
        assert!(outcome.projected_completion_date.is_some());

        // day zero falls back to the default bands
        let outcome = tracker
            .apply_log(&goal, Some(&survey), &weigh(88.5), Uuid::new_v4(), start_time())
            .unwrap();
        assert_eq!(outcome.expected_progress, Some(0.0));
        assert_eq!(outcome.log.progress_status, Status::Yellow);
    }

    #[test]
    fn test_create_goal_dedups_and_validates() {
        let goal = goal(90.0, 80.0);
        assert_eq!(goal.weigh_in_days, vec![Weekday::Mon, Weekday::Fri]);
        assert_eq!(goal.current_weight_kg, 90.0);
        assert_eq!(goal.logs_count, 0);

        let request = NewWeightGoal {
            start_weight_kg: 20.0,
            target_weight_kg: 500.0,
            weigh_in_days: vec![],
            survey_id: None,
        };
        let err = GoalProgressTracker::create_goal(&request, Uuid::new_v4(), start_time())
            .unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_summary() {
        let tracker = GoalProgressTracker::default();
        let mut goal = goal(90.0, 80.0);
        let mut logs = Vec::new();

        for (day, weight) in [(0, 89.0), (7, 88.0), (14, 88.5), (21, 87.0)] {
            let now = start_time() + Duration::days(day);
            let outcome = tracker
                .apply_log(&goal, None, &weigh(weight), Uuid::new_v4(), now)
                .unwrap();
            goal.apply_update(outcome.goal_update);
            logs.push(outcome.log);
        }

        let summary = GoalProgressTracker::summarize(&goal, &logs);
        assert_eq!(summary.total_logs, 4);
        assert_eq!(summary.net_change_kg, -3.0);
        assert_eq!(summary.lowest_weight_kg, Some(87.0));
        assert_eq!(summary.longest_loss_streak, 2);
        // (87 - 89) over 3 weeks
        assert_eq!(summary.average_weekly_change_kg, Some(-0.67));
        assert!(!summary.goal_reached);
    }
}
