//! Configuration settings for the wallaby scheduling engine.

use crate::error::{ConfigError, Result};
use crate::scheduling::datetime::parse_hhmm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduling: SchedulingConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduling: SchedulingConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            // Current directory
            PathBuf::from("config.toml"),
            PathBuf::from("wallaby.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("wallaby/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        let s = &self.scheduling;

        for (field, value) in [
            ("scheduling.all_day_start", &s.all_day_start),
            ("scheduling.all_day_end", &s.all_day_end),
            ("scheduling.half_day_start", &s.half_day_start),
            ("scheduling.half_day_end", &s.half_day_end),
            ("scheduling.birthday_default_start", &s.birthday_default_start),
            ("scheduling.subscription_start", &s.subscription_start),
            ("scheduling.subscription_end", &s.subscription_end),
        ] {
            if parse_hhmm(value).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{} is not a valid HH:MM time: {}",
                    field, value
                ))
                .into());
            }
        }

        if s.subscription_day > 6 {
            return Err(ConfigError::Invalid(format!(
                "subscription_day must be 0..=6 (0 = Monday), got {}",
                s.subscription_day
            ))
            .into());
        }

        if s.default_horizon_weeks == 0 {
            return Err(
                ConfigError::Invalid("default_horizon_weeks must be > 0".to_string()).into(),
            );
        }

        if s.weeks_per_month == 0 {
            return Err(ConfigError::Invalid("weeks_per_month must be > 0".to_string()).into());
        }

        if s.default_location_capacity == 0 {
            return Err(ConfigError::Invalid(
                "default_location_capacity must be > 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

/// Scheduling engine configuration.
///
/// Every business tunable the engine uses: capacity defaults per event type,
/// the camp day windows, the birthday party window, and the defaults applied
/// to subscription recurring templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Fallback capacity when a location record cannot be found.
    pub default_location_capacity: u32,
    /// Default max capacity for camp events.
    pub camp_capacity: u32,
    /// Default max capacity for birthday events.
    pub birthday_capacity: u32,
    /// Default max capacity when no type-specific default applies.
    pub default_event_capacity: u32,
    /// Camp products longer than this run as all-day sessions (minutes).
    pub all_day_threshold_minutes: u32,
    /// All-day camp window.
    pub all_day_start: String,
    pub all_day_end: String,
    /// Half-day camp window.
    pub half_day_start: String,
    pub half_day_end: String,
    /// Length of a birthday party booking (minutes).
    pub birthday_duration_minutes: u32,
    /// Start time used when a birthday item carries no explicit time.
    pub birthday_default_start: String,
    /// How many weeks one subscription "month" spans.
    pub weeks_per_month: u32,
    /// Horizon applied when a recurring template has no end date (weeks).
    pub default_horizon_weeks: u32,
    /// Default weekday for subscription sessions (0 = Monday .. 6 = Sunday).
    pub subscription_day: u8,
    /// Default subscription session window.
    pub subscription_start: String,
    pub subscription_end: String,
    /// Default max capacity for subscription recurring templates.
    pub subscription_capacity: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_location_capacity: 20,
            camp_capacity: 15,
            birthday_capacity: 12,
            default_event_capacity: 10,
            all_day_threshold_minutes: 360,
            all_day_start: "09:00".to_string(),
            all_day_end: "17:00".to_string(),
            half_day_start: "09:00".to_string(),
            half_day_end: "15:00".to_string(),
            birthday_duration_minutes: 120,
            birthday_default_start: "10:00".to_string(),
            weeks_per_month: 4,
            default_horizon_weeks: 12,
            subscription_day: 2, // Wednesday
            subscription_start: "16:00".to_string(),
            subscription_end: "17:00".to_string(),
            subscription_capacity: 8,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the embedded store's JSON snapshot. In-memory only when unset.
    pub data_dir: Option<PathBuf>,
}
