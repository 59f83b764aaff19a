use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregator::ZoneTimeConfig;
use crate::collector::CollectorConfig;
use crate::error::VitalError;
use crate::fallback::FallbackConfig;
use crate::goals::{GoalSettings, GoalStore};
use crate::logging::LogConfig;
use crate::trend::TrendConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Per-day provider query settings
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Placeholder data for empty windows
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Trend sub-window size
    #[serde(default)]
    pub trend: TrendConfig,

    /// Intraday zone-time settings
    #[serde(default)]
    pub zone_time: ZoneTimeConfig,

    /// User goals
    #[serde(default)]
    pub goals: GoalSettings,

    /// Logging settings
    #[serde(default)]
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

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            collector: CollectorConfig::default(),
            fallback: FallbackConfig::default(),
            trend: TrendConfig::default(),
            zone_time: ZoneTimeConfig::default(),
            goals: GoalSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        // Update modification timestamp
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
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
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "Config not loaded, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.collector.per_day_timeout_ms == 0 {
            return Err(VitalError::Configuration(
                "collector.per_day_timeout_ms must be greater than zero".to_string(),
            )
            .into());
        }
        self.goals.validate()?;
        Ok(())
    }
}

/// Goal store persisted in the `[goals]` section of a config file
///
/// A missing file loads default goals; saving rewrites only the goals of the
/// existing configuration.
#[derive(Debug, Clone)]
pub struct TomlGoalStore {
    path: PathBuf,
}

impl TomlGoalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_config(&self) -> crate::error::Result<Option<AppConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| VitalError::Configuration(format!("{}: {}", self.path.display(), e)))
    }
}

impl GoalStore for TomlGoalStore {
    fn load(&self) -> crate::error::Result<GoalSettings> {
        Ok(self.read_config()?.map(|c| c.goals).unwrap_or_default())
    }

    fn save(&self, settings: &GoalSettings) -> crate::error::Result<()> {
        settings.validate()?;
        let mut config = self.read_config()?.unwrap_or_default();
        config.goals = settings.clone();
        config
            .save_to_file(&self.path)
            .map_err(|e| VitalError::Configuration(e.to_string()))
    }
}
