//! Engine facade
//!
//! [`HealthEngine`] wires the pure calculators to a [`HealthStore`] and a
//! [`Clock`]. It is the only place that reads or writes stored state; the
//! calculators themselves never touch storage or the system time.
//!
//! The engine does not lock. Callers that share one store across threads must
//! serialize weight-log submissions per goal.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adherence::{AdherenceStatusEngine, AdherenceSummary};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{HealthError, Result};
use crate::goals::{GoalProgressTracker, GoalSummary, WeightLogOutcome};
use crate::grocery::{GroceryOptions, GroceryPlan, GroceryPlanner};
use crate::metrics::{Metrics, MetricsCalculator};
use crate::models::{
    DailyLog, DailyLogInput, DailyLogKind, HydrationLog, NewWeightGoal, SleepLog, Survey,
    SurveyInput, WeightGoal, WeightLogInput,
};
use crate::readiness::{ReadinessResult, ReadinessScorer};
use crate::repository::HealthStore;
use crate::sleep_debt::{SleepDebtResult, SleepDebtTracker};
use crate::threshold::Classification;

/// Stored survey together with metrics recomputed from its input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyWithMetrics {
    #[serde(flatten)]
    pub survey: Survey,
    pub metrics: Metrics,
}

pub struct HealthEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    tracker: GoalProgressTracker,
    adherence: AdherenceStatusEngine,
}

impl<S: HealthStore> HealthEngine<S, SystemClock> {
    /// Engine over `store` using wall-clock time and default thresholds
    pub fn with_system_clock(store: S) -> Self {
        Self::new(store, SystemClock)
    }
}

impl<S: HealthStore, C: Clock> HealthEngine<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            tracker: GoalProgressTracker::default(),
            adherence: AdherenceStatusEngine::default(),
        }
    }

    /// Engine with thresholds and default targets taken from configuration
    pub fn with_config(store: S, clock: C, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            clock,
            tracker: config.goal_tracker(),
            adherence: config.adherence_engine(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ---- surveys ----

    pub fn compute_survey_metrics(&self, input: &SurveyInput) -> Result<Metrics> {
        MetricsCalculator::compute(input)
    }

    /// Validate and store a survey, returning it with its metrics
    pub fn submit_survey(&mut self, input: SurveyInput) -> Result<SurveyWithMetrics> {
        let metrics = MetricsCalculator::compute(&input)?;
        let survey = Survey {
            id: Uuid::new_v4(),
            input,
            created_at: self.clock.now(),
        };
        self.store.create_survey(&survey)?;

        info!(
            survey_id = %survey.id,
            daily_calories = metrics.daily_calories,
            "Survey stored"
        );
        Ok(SurveyWithMetrics { survey, metrics })
    }

    /// Fetch a survey and recompute its metrics
    pub fn survey_with_metrics(&self, id: &Uuid) -> Result<SurveyWithMetrics> {
        let survey = self.load_survey(id)?;
        let metrics = MetricsCalculator::compute(&survey.input)?;
        Ok(SurveyWithMetrics { survey, metrics })
    }

    pub fn list_surveys(&self) -> Result<Vec<Survey>> {
        Ok(self.store.list_surveys()?)
    }

    fn load_survey(&self, id: &Uuid) -> Result<Survey> {
        self.store
            .get_survey(id)?
            .ok_or_else(|| HealthError::not_found("Survey", id))
    }

    // ---- weight goals ----

    pub fn create_goal(&mut self, request: &NewWeightGoal) -> Result<WeightGoal> {
        if let Some(survey_id) = &request.survey_id {
            self.load_survey(survey_id)?;
        }
        let goal = GoalProgressTracker::create_goal(request, Uuid::new_v4(), self.clock.now())?;
        self.store.create_goal(&goal)?;

        info!(
            goal_id = %goal.id,
            start = goal.start_weight_kg,
            target = goal.target_weight_kg,
            "Weight goal created"
        );
        Ok(goal)
    }

    pub fn get_goal(&self, goal_id: &Uuid) -> Result<WeightGoal> {
        self.store
            .get_goal(goal_id)?
            .ok_or_else(|| HealthError::not_found("WeightGoal", goal_id))
    }

    /// Accept a weight log and write the derived goal fields back
    pub fn apply_weight_log(
        &mut self,
        goal_id: &Uuid,
        input: &WeightLogInput,
    ) -> Result<WeightLogOutcome> {
        let goal = self.get_goal(goal_id)?;
        let survey = self.linked_survey(&goal)?;

        let outcome =
            self.tracker
                .apply_log(&goal, survey.as_ref(), input, Uuid::new_v4(), self.clock.now())?;

        self.store.record_log(&outcome.log, outcome.goal_update)?;

        info!(
            goal_id = %goal_id,
            weight_kg = outcome.log.weight_kg,
            progress = outcome.log.progress,
            status = %outcome.log.progress_status,
            "Weight log accepted"
        );
        Ok(outcome)
    }

    pub fn goal_summary(&self, goal_id: &Uuid) -> Result<GoalSummary> {
        let goal = self.get_goal(goal_id)?;
        let logs = self.store.list_weight_logs(goal_id)?;
        Ok(GoalProgressTracker::summarize(&goal, &logs))
    }

    /// Survey linked to a goal; a dangling link falls back to default targets
    fn linked_survey(&self, goal: &WeightGoal) -> Result<Option<Survey>> {
        let Some(survey_id) = goal.survey_id else {
            return Ok(None);
        };
        let survey = self.store.get_survey(&survey_id)?;
        if survey.is_none() {
            warn!(
                goal_id = %goal.id,
                survey_id = %survey_id,
                "Linked survey missing, using default targets"
            );
        }
        Ok(survey)
    }

    // ---- daily habits ----

    pub fn log_hydration(&mut self, input: &DailyLogInput) -> Result<HydrationLog> {
        self.log_daily(DailyLogKind::Hydration, input)
    }

    pub fn log_sleep(&mut self, input: &DailyLogInput) -> Result<SleepLog> {
        self.log_daily(DailyLogKind::Sleep, input)
    }

    fn log_daily(&mut self, kind: DailyLogKind, input: &DailyLogInput) -> Result<DailyLog> {
        AdherenceStatusEngine::validate_value(kind, input.value)?;
        let survey = input
            .survey_id
            .map(|id| self.load_survey(&id))
            .transpose()?;

        let target = self.adherence.resolve_target(kind, survey.as_ref());
        let classification = self.adherence.classifier.classify(input.value, target)?;

        let now = self.clock.now();
        let log = DailyLog {
            id: Uuid::new_v4(),
            kind,
            value: input.value,
            target,
            status: classification.status,
            percentage: classification.percentage,
            date: input.date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        };
        self.store.create_daily_log(&log)?;

        debug!(
            kind = kind.as_str(),
            value = log.value,
            target,
            status = %log.status,
            "Daily log stored"
        );
        Ok(log)
    }

    pub fn daily_logs(&self, kind: DailyLogKind) -> Result<Vec<DailyLog>> {
        Ok(self.store.list_daily_logs(kind)?)
    }

    pub fn adherence_summary(&self, kind: DailyLogKind) -> Result<AdherenceSummary> {
        let logs = self.store.list_daily_logs(kind)?;
        Ok(AdherenceStatusEngine::summarize(&logs))
    }

    // ---- stateless calculators ----

    pub fn classify_adherence(&self, value: f64, target: f64) -> Result<Classification> {
        self.adherence.classifier.classify(value, target)
    }

    pub fn score_readiness(
        &self,
        hrv: f64,
        resting_hr: f64,
        sleep_hours: f64,
    ) -> Result<ReadinessResult> {
        ReadinessScorer::score(hrv, resting_hr, sleep_hours)
    }

    pub fn compute_sleep_debt(&self, target_hours: f64, sleep_hours: &[f64]) -> Result<SleepDebtResult> {
        SleepDebtTracker::compute(target_hours, sleep_hours)
    }

    pub fn build_grocery_plan(
        &self,
        daily_calories: f64,
        options: &GroceryOptions,
    ) -> Result<GroceryPlan> {
        GroceryPlanner::build(daily_calories, options)
    }

    /// Grocery plan sized to the daily calorie target of a stored survey
    pub fn build_grocery_plan_for_survey(
        &self,
        survey_id: &Uuid,
        options: &GroceryOptions,
    ) -> Result<GroceryPlan> {
        let SurveyWithMetrics { survey, metrics } = self.survey_with_metrics(survey_id)?;
        let mut plan = GroceryPlanner::build(metrics.daily_calories, options)?;
        plan.survey_id = Some(survey.id);
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Gender, Lifestyle};
    use crate::database::DatabaseError;
    use crate::models::{DailyLog, GoalUpdate, Survey, WeightLog};
    use crate::repository::{
        DailyLogRepository, InMemoryRepository, RepoResult, SurveyRepository,
        WeightGoalRepository, WeightLogRepository,
    };
    use crate::threshold::Status;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    /// Store whose goal writes always fail, to check nothing half-lands
    #[derive(Default)]
    struct RejectingGoalWrites(InMemoryRepository);

    impl SurveyRepository for RejectingGoalWrites {
        fn create_survey(&mut self, survey: &Survey) -> RepoResult<()> {
            self.0.create_survey(survey)
        }
        fn get_survey(&self, id: &Uuid) -> RepoResult<Option<Survey>> {
            self.0.get_survey(id)
        }
        fn list_surveys(&self) -> RepoResult<Vec<Survey>> {
            self.0.list_surveys()
        }
    }

    impl WeightGoalRepository for RejectingGoalWrites {
        fn create_goal(&mut self, goal: &WeightGoal) -> RepoResult<()> {
            self.0.create_goal(goal)
        }
        fn get_goal(&self, id: &Uuid) -> RepoResult<Option<WeightGoal>> {
            self.0.get_goal(id)
        }
        fn update_goal(&mut self, id: &Uuid, _update: GoalUpdate) -> RepoResult<()> {
            Err(DatabaseError::NotFound(id.to_string()))
        }
        fn record_log(&mut self, log: &WeightLog, _update: GoalUpdate) -> RepoResult<()> {
            Err(DatabaseError::NotFound(log.goal_id.to_string()))
        }
    }

    impl WeightLogRepository for RejectingGoalWrites {
        fn create_weight_log(&mut self, log: &WeightLog) -> RepoResult<()> {
            self.0.create_weight_log(log)
        }
        fn list_weight_logs(&self, goal_id: &Uuid) -> RepoResult<Vec<WeightLog>> {
            self.0.list_weight_logs(goal_id)
        }
    }

    impl DailyLogRepository for RejectingGoalWrites {
        fn create_daily_log(&mut self, log: &DailyLog) -> RepoResult<()> {
            self.0.create_daily_log(log)
        }
        fn list_daily_logs(&self, kind: DailyLogKind) -> RepoResult<Vec<DailyLog>> {
            self.0.list_daily_logs(kind)
        }
    }

    fn stored_goal(survey_id: Option<Uuid>) -> WeightGoal {
        WeightGoal {
            id: Uuid::new_v4(),
            start_weight_kg: 90.0,
            target_weight_kg: 80.0,
            current_weight_kg: 90.0,
            weigh_in_days: vec![],
            survey_id,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap(),
            logs_count: 0,
        }
    }

    fn engine() -> HealthEngine<InMemoryRepository, FixedClock> {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 7, 0, 0).unwrap());
        HealthEngine::new(InMemoryRepository::new(), clock)
    }

    fn survey_input() -> SurveyInput {
        SurveyInput {
            gender: Gender::Male,
            age: 30,
            height_cm: 180.0,
            weight_kg: 90.0,
            target_weight_kg: 80.0,
            target_days: 100,
            lifestyle: Lifestyle::Moderate,
        }
    }

    #[test]
    fn test_survey_round_trip_recomputes_metrics() {
        let mut engine = engine();
        let stored = engine.submit_survey(survey_input()).unwrap();
        assert_eq!(stored.survey.created_at, engine.clock().now());

        let fetched = engine.survey_with_metrics(&stored.survey.id).unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.metrics.daily_calories, 2144.0);
    }

    #[test]
    fn test_unknown_survey_is_not_found() {
        let engine = engine();
        let err = engine.survey_with_metrics(&Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, HealthError::NotFound { ref entity, .. } if entity == "Survey"));
    }

    #[test]
    fn test_weight_log_updates_goal() {
        let mut engine = engine();
        let goal = engine
            .create_goal(&NewWeightGoal {
                start_weight_kg: 90.0,
                target_weight_kg: 80.0,
                weigh_in_days: vec![],
                survey_id: None,
            })
            .unwrap();

        let outcome = engine
            .apply_weight_log(
                &goal.id,
                &WeightLogInput {
                    weight_kg: 88.5,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(outcome.log.progress, 15);
        assert!(outcome.celebration.is_some());

        let stored = engine.get_goal(&goal.id).unwrap();
        assert_eq!(stored.current_weight_kg, 88.5);
        assert_eq!(stored.logs_count, 1);

        let summary = engine.goal_summary(&goal.id).unwrap();
        assert_eq!(summary.total_logs, 1);
        assert_eq!(summary.net_change_kg, -1.5);
    }

    #[test]
    fn test_failed_goal_write_leaves_no_weight_log() {
        let goal = stored_goal(None);
        let mut store = RejectingGoalWrites::default();
        store.create_goal(&goal).unwrap();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 7, 0, 0).unwrap());
        let mut engine = HealthEngine::new(store, clock);

        let result = engine.apply_weight_log(
            &goal.id,
            &WeightLogInput {
                weight_kg: 88.5,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(HealthError::Database(_))));

        assert!(engine.store().list_weight_logs(&goal.id).unwrap().is_empty());
        let unchanged = engine.get_goal(&goal.id).unwrap();
        assert_eq!(unchanged.logs_count, 0);
        assert_eq!(unchanged.current_weight_kg, 90.0);
    }

    #[test]
    fn test_missing_linked_survey_falls_back_to_default_targets() {
        let goal = stored_goal(Some(Uuid::new_v4()));
        let mut store = InMemoryRepository::new();
        store.create_goal(&goal).unwrap();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 7, 0, 0).unwrap());
        let mut engine = HealthEngine::new(store, clock);

        let outcome = engine
            .apply_weight_log(
                &goal.id,
                &WeightLogInput {
                    weight_kg: 89.0,
                    water_liters: Some(2.0),
                    sleep_hours: Some(5.0),
                    notes: None,
                },
            )
            .unwrap();
        // 2.0 of 2.5 L and 5 of 8 h
        assert_eq!(outcome.log.hydration_status, Some(Status::Yellow));
        assert_eq!(outcome.log.sleep_status, Some(Status::Red));
        assert_eq!(outcome.expected_progress, None);
        assert_eq!(engine.get_goal(&goal.id).unwrap().logs_count, 1);
    }

    #[test]
    fn test_goal_with_unknown_survey_is_rejected() {
        let mut engine = engine();
        let result = engine.create_goal(&NewWeightGoal {
            start_weight_kg: 90.0,
            target_weight_kg: 80.0,
            weigh_in_days: vec![],
            survey_id: Some(Uuid::new_v4()),
        });
        assert!(matches!(result, Err(HealthError::NotFound { .. })));
    }

    #[test]
    fn test_daily_logs_use_clock_and_survey_target() {
        let mut engine = engine();
        let survey = engine.submit_survey(survey_input()).unwrap();

        let log = engine
            .log_hydration(&DailyLogInput {
                value: 2.97,
                date: None,
                survey_id: Some(survey.survey.id),
            })
            .unwrap();
        assert_eq!(log.target, 2.97);
        assert_eq!(log.status, Status::Green);
        assert_eq!(log.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        engine.clock().advance(Duration::days(1));
        let log = engine
            .log_sleep(&DailyLogInput {
                value: 5.0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(log.target, 8.0);
        assert_eq!(log.status, Status::Red);
        assert_eq!(log.date, NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());

        let summary = engine.adherence_summary(DailyLogKind::Hydration).unwrap();
        assert_eq!(summary.days_logged, 1);
        assert_eq!(summary.current_green_streak, 1);
    }

    #[test]
    fn test_configured_thresholds_apply() {
        let config = EngineConfig {
            default_water_liters: 2.0,
            ..EngineConfig::default()
        };
        let clock = FixedClock::new(Utc::now());
        let mut engine = HealthEngine::with_config(InMemoryRepository::new(), clock, &config).unwrap();

        let log = engine
            .log_hydration(&DailyLogInput {
                value: 2.0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(log.percentage, 100.0);
        assert_eq!(log.status, Status::Green);
    }

    #[test]
    fn test_grocery_plan_for_survey() {
        let mut engine = engine();
        let survey = engine.submit_survey(survey_input()).unwrap();
        let plan = engine
            .build_grocery_plan_for_survey(&survey.survey.id, &GroceryOptions::default())
            .unwrap();
        assert_eq!(plan.survey_id, Some(survey.survey.id));
        assert_eq!(plan.target_daily_calories, 2144.0);
        assert_eq!(plan.weekly_calories, 15008.0);
    }
}
