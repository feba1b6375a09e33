//! Storage contracts consumed by the engine
//!
//! The engine holds no persistent state of its own. Everything it reads or
//! writes goes through these traits, which the SQLite [`Database`] and the
//! [`InMemoryRepository`] implement.
//!
//! [`Database`]: crate::database::Database

use std::collections::HashMap;
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::models::{DailyLog, DailyLogKind, GoalUpdate, Survey, WeightGoal, WeightLog};

pub type RepoResult<T> = std::result::Result<T, DatabaseError>;

pub trait SurveyRepository {
    fn create_survey(&mut self, survey: &Survey) -> RepoResult<()>;
    fn get_survey(&self, id: &Uuid) -> RepoResult<Option<Survey>>;
    fn list_surveys(&self) -> RepoResult<Vec<Survey>>;
}

pub trait WeightGoalRepository {
    fn create_goal(&mut self, goal: &WeightGoal) -> RepoResult<()>;
    fn get_goal(&self, id: &Uuid) -> RepoResult<Option<WeightGoal>>;
    fn update_goal(&mut self, id: &Uuid, update: GoalUpdate) -> RepoResult<()>;

    /// Store an accepted weight log and apply its goal update as one unit
    ///
    /// Either both writes land or neither does.
    fn record_log(&mut self, log: &WeightLog, update: GoalUpdate) -> RepoResult<()>;
}

pub trait WeightLogRepository {
    fn create_weight_log(&mut self, log: &WeightLog) -> RepoResult<()>;
    fn list_weight_logs(&self, goal_id: &Uuid) -> RepoResult<Vec<WeightLog>>;
}

pub trait DailyLogRepository {
    fn create_daily_log(&mut self, log: &DailyLog) -> RepoResult<()>;
    fn list_daily_logs(&self, kind: DailyLogKind) -> RepoResult<Vec<DailyLog>>;
}

/// Every contract the engine needs from one store
pub trait HealthStore:
    SurveyRepository + WeightGoalRepository + WeightLogRepository + DailyLogRepository
{
}

impl<T> HealthStore for T where
    T: SurveyRepository + WeightGoalRepository + WeightLogRepository + DailyLogRepository
{
}

/// HashMap-backed store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    surveys: HashMap<Uuid, Survey>,
    goals: HashMap<Uuid, WeightGoal>,
    weight_logs: Vec<WeightLog>,
    daily_logs: Vec<DailyLog>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SurveyRepository for InMemoryRepository {
    fn create_survey(&mut self, survey: &Survey) -> RepoResult<()> {
        if self.surveys.contains_key(&survey.id) {
            return Err(DatabaseError::Duplicate(survey.id.to_string()));
        }
        self.surveys.insert(survey.id, survey.clone());
        Ok(())
    }

    fn get_survey(&self, id: &Uuid) -> RepoResult<Option<Survey>> {
        Ok(self.surveys.get(id).cloned())
    }

    fn list_surveys(&self) -> RepoResult<Vec<Survey>> {
        let mut surveys: Vec<Survey> = self.surveys.values().cloned().collect();
        surveys.sort_by_key(|s| s.created_at);
        Ok(surveys)
    }
}

impl WeightGoalRepository for InMemoryRepository {
    fn create_goal(&mut self, goal: &WeightGoal) -> RepoResult<()> {
        if self.goals.contains_key(&goal.id) {
            return Err(DatabaseError::Duplicate(goal.id.to_string()));
        }
        self.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    fn get_goal(&self, id: &Uuid) -> RepoResult<Option<WeightGoal>> {
        Ok(self.goals.get(id).cloned())
    }

    fn update_goal(&mut self, id: &Uuid, update: GoalUpdate) -> RepoResult<()> {
        let goal = self
            .goals
            .get_mut(id)
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))?;
        goal.apply_update(update);
        Ok(())
    }

    fn record_log(&mut self, log: &WeightLog, update: GoalUpdate) -> RepoResult<()> {
        let goal = self
            .goals
            .get_mut(&log.goal_id)
            .ok_or_else(|| DatabaseError::NotFound(log.goal_id.to_string()))?;
        goal.apply_update(update);
        self.weight_logs.push(log.clone());
        Ok(())
    }
}

impl WeightLogRepository for InMemoryRepository {
    fn create_weight_log(&mut self, log: &WeightLog) -> RepoResult<()> {
        self.weight_logs.push(log.clone());
        Ok(())
    }

    fn list_weight_logs(&self, goal_id: &Uuid) -> RepoResult<Vec<WeightLog>> {
        Ok(self
            .weight_logs
            .iter()
            .filter(|log| log.goal_id == *goal_id)
            .cloned()
            .collect())
    }
}

impl DailyLogRepository for InMemoryRepository {
    fn create_daily_log(&mut self, log: &DailyLog) -> RepoResult<()> {
        self.daily_logs.push(log.clone());
        Ok(())
    }

    fn list_daily_logs(&self, kind: DailyLogKind) -> RepoResult<Vec<DailyLog>> {
        let mut logs: Vec<DailyLog> = self
            .daily_logs
            .iter()
            .filter(|log| log.kind == kind)
            .cloned()
            .collect();
        logs.sort_by_key(|log| (log.date, log.created_at));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_goal_update_round_trip() {
        let mut repo = InMemoryRepository::new();
        let goal = WeightGoal {
            id: Uuid::new_v4(),
            start_weight_kg: 90.0,
            target_weight_kg: 80.0,
            current_weight_kg: 90.0,
            weigh_in_days: vec![],
            survey_id: None,
            created_at: Utc::now(),
            logs_count: 0,
        };
        repo.create_goal(&goal).unwrap();
        assert!(matches!(repo.create_goal(&goal), Err(DatabaseError::Duplicate(_))));

        repo.update_goal(
            &goal.id,
            GoalUpdate {
                current_weight_kg: 89.0,
                logs_count: 1,
            },
        )
        .unwrap();
        let stored = repo.get_goal(&goal.id).unwrap().unwrap();
        assert_eq!(stored.current_weight_kg, 89.0);
        assert_eq!(stored.logs_count, 1);

        let missing = Uuid::new_v4();
        assert!(repo.get_goal(&missing).unwrap().is_none());
        assert!(matches!(
            repo.update_goal(&missing, GoalUpdate { current_weight_kg: 1.0, logs_count: 1 }),
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_record_log_for_missing_goal_stores_nothing() {
        let mut repo = InMemoryRepository::new();
        let goal_id = Uuid::new_v4();
        let log = WeightLog {
            id: Uuid::new_v4(),
            goal_id,
            weight_kg: 88.0,
            water_liters: None,
            sleep_hours: None,
            notes: None,
            is_weight_loss: true,
            lost_kg: 2.0,
            remaining_kg: 8.0,
            progress: 20,
            progress_status: crate::threshold::Status::Yellow,
            hydration_status: None,
            sleep_status: None,
            created_at: Utc::now(),
        };

        let result = repo.record_log(&log, GoalUpdate { current_weight_kg: 88.0, logs_count: 1 });
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
        assert!(repo.list_weight_logs(&goal_id).unwrap().is_empty());
    }
}
