//! SQLite storage for surveys, goals and logs
//!
//! Implements every repository contract on a single `rusqlite` connection.
//! Enumerations are stored as their lowercase wire names and weigh-in days as
//! a JSON array.

use chrono::Weekday;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    DailyLog, DailyLogKind, Gender, GoalUpdate, Lifestyle, Survey, SurveyInput, WeightGoal,
    WeightLog,
};
use crate::repository::{
    DailyLogRepository, RepoResult, SurveyRepository, WeightGoalRepository, WeightLogRepository,
};
use crate::threshold::Status;

/// Database error types
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

/// SQLite-backed health store
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create or open a database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, DatabaseError> {
        let conn = Connection::open(db_path.as_ref())?;
        let db = Self { conn };
        db.init_schema()?;
        info!(path = %db_path.as_ref().display(), "Database opened");
        Ok(db)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema with tables and indexes
    fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS surveys (
                id TEXT PRIMARY KEY,
                gender TEXT NOT NULL,
                age INTEGER NOT NULL,
                height_cm REAL NOT NULL,
                weight_kg REAL NOT NULL,
                target_weight_kg REAL NOT NULL,
                target_days INTEGER NOT NULL,
                lifestyle TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS weight_goals (
                id TEXT PRIMARY KEY,
                start_weight_kg REAL NOT NULL,
                target_weight_kg REAL NOT NULL,
                current_weight_kg REAL NOT NULL,
                weigh_in_days TEXT NOT NULL,
                survey_id TEXT,
                created_at TEXT NOT NULL,
                logs_count INTEGER NOT NULL DEFAULT 0
            );

            -- goal_id is a plain reference: deleting a goal leaves its logs in place
            CREATE TABLE IF NOT EXISTS weight_logs (
                id TEXT PRIMARY KEY,
                goal_id TEXT NOT NULL,
                weight_kg REAL NOT NULL,
                water_liters REAL,
                sleep_hours REAL,
                notes TEXT,
                is_weight_loss INTEGER NOT NULL,
                lost_kg REAL NOT NULL,
                remaining_kg REAL NOT NULL,
                progress INTEGER NOT NULL,
                progress_status TEXT NOT NULL,
                hydration_status TEXT,
                sleep_status TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_logs (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                value REAL NOT NULL,
                target REAL NOT NULL,
                status TEXT NOT NULL,
                percentage REAL NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_weight_logs_goal ON weight_logs(goal_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_daily_logs_kind_date ON daily_logs(kind, date);
            "#,
        )?;
        Ok(())
    }

    fn survey_from_row(row: &Row) -> rusqlite::Result<Survey> {
        Ok(Survey {
            id: parse_column(row, "id", Uuid::parse_str)?,
            input: SurveyInput {
                gender: parse_column(row, "gender", str::parse::<Gender>)?,
                age: row.get("age")?,
                height_cm: row.get("height_cm")?,
                weight_kg: row.get("weight_kg")?,
                target_weight_kg: row.get("target_weight_kg")?,
                target_days: row.get("target_days")?,
                lifestyle: parse_column(row, "lifestyle", str::parse::<Lifestyle>)?,
            },
            created_at: row.get("created_at")?,
        })
    }

    fn goal_from_row(row: &Row) -> rusqlite::Result<WeightGoal> {
        let survey_id: Option<String> = row.get("survey_id")?;
        Ok(WeightGoal {
            id: parse_column(row, "id", Uuid::parse_str)?,
            start_weight_kg: row.get("start_weight_kg")?,
            target_weight_kg: row.get("target_weight_kg")?,
            current_weight_kg: row.get("current_weight_kg")?,
            weigh_in_days: parse_column(row, "weigh_in_days", |text| {
                serde_json::from_str::<Vec<Weekday>>(text)
            })?,
            survey_id: survey_id
                .map(|id| Uuid::parse_str(&id))
                .transpose()
                .map_err(|e| conversion_error(row, "survey_id", e))?,
            created_at: row.get("created_at")?,
            logs_count: row.get("logs_count")?,
        })
    }

    fn weight_log_from_row(row: &Row) -> rusqlite::Result<WeightLog> {
        Ok(WeightLog {
            id: parse_column(row, "id", Uuid::parse_str)?,
            goal_id: parse_column(row, "goal_id", Uuid::parse_str)?,
            weight_kg: row.get("weight_kg")?,
            water_liters: row.get("water_liters")?,
            sleep_hours: row.get("sleep_hours")?,
            notes: row.get("notes")?,
            is_weight_loss: row.get("is_weight_loss")?,
            lost_kg: row.get("lost_kg")?,
            remaining_kg: row.get("remaining_kg")?,
            progress: row.get("progress")?,
            progress_status: parse_column(row, "progress_status", str::parse::<Status>)?,
            hydration_status: parse_optional_status(row, "hydration_status")?,
            sleep_status: parse_optional_status(row, "sleep_status")?,
            created_at: row.get("created_at")?,
        })
    }

    fn daily_log_from_row(row: &Row) -> rusqlite::Result<DailyLog> {
        Ok(DailyLog {
            id: parse_column(row, "id", Uuid::parse_str)?,
            kind: parse_column(row, "kind", str::parse::<DailyLogKind>)?,
            value: row.get("value")?,
            target: row.get("target")?,
            status: parse_column(row, "status", str::parse::<Status>)?,
            percentage: row.get("percentage")?,
            date: row.get("date")?,
            created_at: row.get("created_at")?,
        })
    }
}

fn conversion_error<E>(row: &Row, column: &str, error: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let index = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
}

/// Read a text column and parse it into a domain type
fn parse_column<T, E, F>(row: &Row, column: &str, parse: F) -> rusqlite::Result<T>
where
    F: FnOnce(&str) -> Result<T, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(column)?;
    parse(&text).map_err(|e| conversion_error(row, column, e))
}

fn parse_optional_status(row: &Row, column: &str) -> rusqlite::Result<Option<Status>> {
    let text: Option<String> = row.get(column)?;
    text.map(|s| s.parse::<Status>())
        .transpose()
        .map_err(|e| conversion_error(row, column, e))
}

/// Map primary-key violations onto `Duplicate`
fn insert_error(error: rusqlite::Error, id: &Uuid) -> DatabaseError {
    match error {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            DatabaseError::Duplicate(id.to_string())
        }
        other => DatabaseError::SqliteError(other),
    }
}

/// Write back goal fields; MAX keeps logs_count monotonic even if a stale update arrives
fn apply_goal_update(conn: &Connection, id: &Uuid, update: GoalUpdate) -> RepoResult<()> {
    let changed = conn.execute(
        r#"
        UPDATE weight_goals
        SET current_weight_kg = ?2, logs_count = MAX(logs_count, ?3)
        WHERE id = ?1
        "#,
        params![id.to_string(), update.current_weight_kg, update.logs_count],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound(id.to_string()));
    }
    Ok(())
}

fn insert_weight_log(conn: &Connection, log: &WeightLog) -> RepoResult<()> {
    conn.execute(
        r#"
        INSERT INTO weight_logs (
            id, goal_id, weight_kg, water_liters, sleep_hours, notes, is_weight_loss,
            lost_kg, remaining_kg, progress, progress_status, hydration_status,
            sleep_status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
        params![
            log.id.to_string(),
            log.goal_id.to_string(),
            log.weight_kg,
            log.water_liters,
            log.sleep_hours,
            log.notes,
            log.is_weight_loss,
            log.lost_kg,
            log.remaining_kg,
            log.progress,
            log.progress_status.as_str(),
            log.hydration_status.map(|s| s.as_str()),
            log.sleep_status.map(|s| s.as_str()),
            log.created_at,
        ],
    )
    .map_err(|e| insert_error(e, &log.id))?;
    Ok(())
}

impl SurveyRepository for Database {
    fn create_survey(&mut self, survey: &Survey) -> RepoResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO surveys (
                    id, gender, age, height_cm, weight_kg, target_weight_kg, target_days,
                    lifestyle, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    survey.id.to_string(),
                    survey.input.gender.as_str(),
                    survey.input.age,
                    survey.input.height_cm,
                    survey.input.weight_kg,
                    survey.input.target_weight_kg,
                    survey.input.target_days,
                    survey.input.lifestyle.as_str(),
                    survey.created_at,
                ],
            )
            .map_err(|e| insert_error(e, &survey.id))?;
        debug!(survey_id = %survey.id, "Survey stored");
        Ok(())
    }

    fn get_survey(&self, id: &Uuid) -> RepoResult<Option<Survey>> {
        let survey = self
            .conn
            .query_row(
                "SELECT * FROM surveys WHERE id = ?1",
                params![id.to_string()],
                Self::survey_from_row,
            )
            .optional()?;
        Ok(survey)
    }

    fn list_surveys(&self) -> RepoResult<Vec<Survey>> {
        let mut stmt = self.conn.prepare("SELECT * FROM surveys ORDER BY created_at")?;
        let surveys = stmt
            .query_map([], Self::survey_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(surveys)
    }
}

impl WeightGoalRepository for Database {
    fn create_goal(&mut self, goal: &WeightGoal) -> RepoResult<()> {
        let weigh_in_days = serde_json::to_string(&goal.weigh_in_days)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
        self.conn
            .execute(
                r#"
                INSERT INTO weight_goals (
                    id, start_weight_kg, target_weight_kg, current_weight_kg, weigh_in_days,
                    survey_id, created_at, logs_count
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    goal.id.to_string(),
                    goal.start_weight_kg,
                    goal.target_weight_kg,
                    goal.current_weight_kg,
                    weigh_in_days,
                    goal.survey_id.map(|id| id.to_string()),
                    goal.created_at,
                    goal.logs_count,
                ],
            )
            .map_err(|e| insert_error(e, &goal.id))?;
        debug!(goal_id = %goal.id, "Weight goal stored");
        Ok(())
    }

    fn get_goal(&self, id: &Uuid) -> RepoResult<Option<WeightGoal>> {
        let goal = self
            .conn
            .query_row(
                "SELECT * FROM weight_goals WHERE id = ?1",
                params![id.to_string()],
                Self::goal_from_row,
            )
            .optional()?;
        Ok(goal)
    }

    fn update_goal(&mut self, id: &Uuid, update: GoalUpdate) -> RepoResult<()> {
        apply_goal_update(&self.conn, id, update)
    }

    fn record_log(&mut self, log: &WeightLog, update: GoalUpdate) -> RepoResult<()> {
        let tx = self.conn.transaction()?;
        insert_weight_log(&tx, log)?;
        apply_goal_update(&tx, &log.goal_id, update)?;
        tx.commit()?;
        debug!(goal_id = %log.goal_id, log_id = %log.id, "Weight log recorded");
        Ok(())
    }
}

impl WeightLogRepository for Database {
    fn create_weight_log(&mut self, log: &WeightLog) -> RepoResult<()> {
        insert_weight_log(&self.conn, log)
    }

    fn list_weight_logs(&self, goal_id: &Uuid) -> RepoResult<Vec<WeightLog>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM weight_logs WHERE goal_id = ?1 ORDER BY created_at")?;
        let logs = stmt
            .query_map(params![goal_id.to_string()], Self::weight_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}

impl DailyLogRepository for Database {
    fn create_daily_log(&mut self, log: &DailyLog) -> RepoResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO daily_logs (
                    id, kind, value, target, status, percentage, date, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    log.id.to_string(),
                    log.kind.as_str(),
                    log.value,
                    log.target,
                    log.status.as_str(),
                    log.percentage,
                    log.date,
                    log.created_at,
                ],
            )
            .map_err(|e| insert_error(e, &log.id))?;
        Ok(())
    }

    fn list_daily_logs(&self, kind: DailyLogKind) -> RepoResult<Vec<DailyLog>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM daily_logs WHERE kind = ?1 ORDER BY date, created_at")?;
        let logs = stmt
            .query_map(params![kind.as_str()], Self::daily_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}
