//! Unified error hierarchy for VitalRS
//!
//! Engine operations fail synchronously with one of a small set of error kinds:
//! a caller-supplied value violated a documented bound (`Validation`), a referenced
//! entity is missing (`NotFound`), or the requested computation is undefined for
//! the given input (`InvalidGoal`, `InvalidInput`).

use thiserror::Error;

pub use crate::database::DatabaseError;

/// Top-level error type for all VitalRS operations
#[derive(Debug, Error)]
pub enum HealthError {
    /// One or more input fields violated a documented bound
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Goal cannot be tracked (e.g. it does not reduce weight)
    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    /// Computation is undefined for the supplied input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage collaborator errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for VitalRS operations
pub type Result<T> = std::result::Result<T, HealthError>;

impl HealthError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        HealthError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Violated-field messages carried by a validation error
    pub fn violations(&self) -> &[String] {
        match self {
            HealthError::Validation(violations) => violations,
            _ => &[],
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HealthError::Validation(_) => ErrorSeverity::Warning,
            HealthError::NotFound { .. } => ErrorSeverity::Warning,
            HealthError::InvalidGoal(_) | HealthError::InvalidInput(_) => ErrorSeverity::Warning,
            HealthError::Database(_) => ErrorSeverity::Error,
            HealthError::Configuration(_) => ErrorSeverity::Error,
            HealthError::Io(_) => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            HealthError::Validation(violations) if violations.len() == 1 => {
                format!("Please check your input: {}", violations[0])
            }
            HealthError::Validation(violations) => {
                format!(
                    "Please check your input ({} problems): {}",
                    violations.len(),
                    violations.join(", ")
                )
            }
            HealthError::NotFound { entity, .. } => {
                format!("The requested {} could not be found.", entity.to_lowercase())
            }
            HealthError::InvalidGoal(_) => {
                "This goal cannot be tracked: the target weight must be below the starting weight."
                    .to_string()
            }
            HealthError::Database(_) => {
                "Unable to access stored data. Please check your configuration.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Collects violated constraints so every problem is reported at once
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<String>);

impl Violations {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a violation unless `value` lies in `[min, max]`
    pub(crate) fn check_range(&mut self, field: &str, value: f64, min: f64, max: f64) {
        if !value.is_finite() || value < min || value > max {
            self.0
                .push(format!("{} must be between {} and {} (got {})", field, min, max, value));
        }
    }

    pub(crate) fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub(crate) fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(HealthError::Validation(self.0))
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
