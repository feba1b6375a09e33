// Library interface for VitalRS modules
// Integration tests and the CLI binary go through this crate root

pub mod adherence;
pub mod clock;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod goals;
pub mod grocery;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod readiness;
pub mod repository;
pub mod sleep_debt;
pub mod threshold;

// Re-export commonly used types for convenience
pub use models::*;
pub use adherence::{AdherenceStatusEngine, AdherenceSummary};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, EngineConfig};
pub use database::Database;
pub use engine::{HealthEngine, SurveyWithMetrics};
pub use error::{HealthError, Result};
pub use goals::{Celebration, GoalProgressTracker, GoalSummary, WeightLogOutcome};
pub use grocery::{GroceryOptions, GroceryPlan, GroceryPlanner, PriceMode};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{Metrics, MetricsCalculator, WeightLossPace};
pub use readiness::{ReadinessResult, ReadinessScorer};
pub use repository::{HealthStore, InMemoryRepository};
pub use sleep_debt::{SleepDebtResult, SleepDebtTracker};
pub use threshold::{Classification, Level, Status, ThresholdClassifier};
