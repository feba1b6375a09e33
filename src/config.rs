use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::adherence::{
    AdherenceStatusEngine, DEFAULT_SLEEP_TARGET_HOURS, DEFAULT_WATER_TARGET_LITERS,
};
use crate::error::HealthError;
use crate::goals::GoalProgressTracker;
use crate::grocery::PriceMode;
use crate::logging::LogConfig;
use crate::threshold::ThresholdClassifier;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    pub settings: AppSettings,

    /// Classification thresholds and default targets
    pub engine: EngineConfig,

    /// Logging output
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Data directory path
    pub data_dir: PathBuf,

    /// SQLite database file name inside `data_dir`
    pub database_file: String,
}

/// Engine thresholds and fallbacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hydration/sleep adherence bands (percent of target)
    pub adherence_green_at: f64,
    pub adherence_yellow_at: f64,

    /// Weight-goal progress bands used when no timeframe is known
    pub progress_green_at: f64,
    pub progress_yellow_at: f64,

    /// Hydration target when no survey is linked (litres)
    pub default_water_liters: f64,

    /// Sleep target when no survey is linked (hours)
    pub default_sleep_hours: f64,

    /// Price mode used by grocery optimization when none is requested
    pub default_price_mode: PriceMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            engine: EngineConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("vitalrs"),
            database_file: "vitalrs.db".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let adherence = ThresholdClassifier::adherence();
        let progress = ThresholdClassifier::progress();
        EngineConfig {
            adherence_green_at: adherence.green_at,
            adherence_yellow_at: adherence.yellow_at,
            progress_green_at: progress.green_at,
            progress_yellow_at: progress.yellow_at,
            default_water_liters: DEFAULT_WATER_TARGET_LITERS,
            default_sleep_hours: DEFAULT_SLEEP_TARGET_HOURS,
            default_price_mode: PriceMode::Standard,
        }
    }
}

impl EngineConfig {
    /// Reject bands that overlap and defaults that cannot act as targets
    pub fn validate(&self) -> std::result::Result<(), HealthError> {
        let mut problems = Vec::new();
        if self.adherence_yellow_at >= self.adherence_green_at {
            problems.push("adherence yellow band must start below the green band");
        }
        if self.progress_yellow_at >= self.progress_green_at {
            problems.push("progress yellow band must start below the green band");
        }
        if !(self.default_water_liters > 0.0) {
            problems.push("default water target must be positive");
        }
        if !(self.default_sleep_hours > 0.0) {
            problems.push("default sleep target must be positive");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(HealthError::Configuration(problems.join("; ")))
        }
    }

    pub fn adherence_engine(&self) -> AdherenceStatusEngine {
        AdherenceStatusEngine {
            classifier: ThresholdClassifier::new(self.adherence_green_at, self.adherence_yellow_at),
            default_water_liters: self.default_water_liters,
            default_sleep_hours: self.default_sleep_hours,
        }
    }

    pub fn goal_tracker(&self) -> GoalProgressTracker {
        GoalProgressTracker::new(
            ThresholdClassifier::new(self.progress_green_at, self.progress_yellow_at),
            self.adherence_engine(),
        )
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.engine.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vitalrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Config file not loaded, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.settings.data_dir.join(&self.settings.database_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.engine, deserialized.engine);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.engine.progress_green_at = 60.0;
        original.engine.default_price_mode = PriceMode::Budget;
        original.save_to_file(&config_path).unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.engine.progress_green_at, 60.0);
        assert_eq!(loaded.engine.default_price_mode, PriceMode::Budget);
    }

    #[test]
    fn test_engine_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());

        let config = EngineConfig {
            adherence_yellow_at: 95.0,
            default_sleep_hours: 0.0,
            ..EngineConfig::default()
        };
        match config.validate() {
            Err(HealthError::Configuration(message)) => {
                assert!(message.contains("adherence"));
                assert!(message.contains("sleep"));
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_engine_config_builds_components() {
        let config = EngineConfig {
            progress_green_at: 40.0,
            progress_yellow_at: 5.0,
            default_water_liters: 3.0,
            ..EngineConfig::default()
        };
        let tracker = config.goal_tracker();
        assert_eq!(tracker.progress_bands.green_at, 40.0);
        assert_eq!(tracker.adherence.default_water_liters, 3.0);
    }
}
