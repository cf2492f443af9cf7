//! Configuration loading and typed config structures for the Hourglass
//! simulation.
//!
//! The canonical configuration lives in `hourglass-config.yaml`. This module
//! defines strongly-typed structs mirroring the YAML structure and a loader
//! that reads it. Every field has a default, so an empty file is valid and
//! yields the stock thresholds.

use std::path::Path;

use chrono::Weekday;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Session start used when a clock has to be seeded.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Need-driven goal generation thresholds.
    #[serde(default)]
    pub goals: GoalConfig,

    /// Goal pursuit gating and replay seed.
    #[serde(default)]
    pub pursuit: PursuitConfig,

    /// Routine-driven repositioning.
    #[serde(default)]
    pub positions: PositionConfig,

    /// Activity resolution for need decay.
    #[serde(default)]
    pub activity: ActivityConfig,

    /// Player travel between locations.
    #[serde(default)]
    pub travel: TravelConfig,

    /// Engine harness run parameters.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The `HOURGLASS_LOG` environment variable overrides `logging.level`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// Where a freshly seeded session clock starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// First day number.
    #[serde(default = "default_start_day")]
    pub start_day: u32,

    /// Starting time of day, `"HH:MM"`.
    #[serde(default = "default_start_time")]
    pub start_time: String,

    /// Starting weekday.
    #[serde(default = "default_start_weekday")]
    pub start_weekday: Weekday,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start_day: default_start_day(),
            start_time: default_start_time(),
            start_weekday: default_start_weekday(),
        }
    }
}

/// Thresholds for turning unmet needs into goals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoalConfig {
    /// Minimum urgency that spawns a goal.
    #[serde(default = "default_urgency_threshold")]
    pub urgency_threshold: u32,

    /// How far below the threshold a need must fall to count as satisfied.
    #[serde(default = "default_completion_margin")]
    pub completion_margin: u32,

    /// Urgency at or above which a goal is `URGENT`.
    #[serde(default = "default_urgent_at")]
    pub urgent_at: u32,

    /// Urgency at or above which a goal is `HIGH`.
    #[serde(default = "default_high_at")]
    pub high_at: u32,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            urgency_threshold: default_urgency_threshold(),
            completion_margin: default_completion_margin(),
            urgent_at: default_urgent_at(),
            high_at: default_high_at(),
        }
    }
}

/// Goal pursuit gating.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PursuitConfig {
    /// Minimum step length, in hours, for any goal step to execute.
    #[serde(default = "default_min_hours")]
    pub min_hours: f64,

    /// Base seed for deterministic replay. Absent means unseeded rolls.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            min_hours: default_min_hours(),
            seed: None,
        }
    }
}

/// Routine-driven repositioning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PositionConfig {
    /// Minimum step length, in hours, for routine movement.
    #[serde(default = "default_min_hours")]
    pub min_hours: f64,

    /// Urgency above which a need pins an actor in place.
    #[serde(default = "default_override_urgency")]
    pub routine_override_urgency: u32,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            min_hours: default_min_hours(),
            routine_override_urgency: default_override_urgency(),
        }
    }
}

/// Activity resolution for need decay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivityConfig {
    /// Urgency above which the need, not the routine, decides the activity.
    #[serde(default = "default_override_urgency")]
    pub urgent_need_threshold: u32,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            urgent_need_threshold: default_override_urgency(),
        }
    }
}

/// Player travel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TravelConfig {
    /// Whole minutes charged for a location change that reports no travel
    /// time.
    #[serde(default = "default_minimum_travel_minutes")]
    pub minimum_minutes: u32,
}

impl TravelConfig {
    /// The minimum travel time in hours.
    pub fn minimum_hours(&self) -> f64 {
        f64::from(self.minimum_minutes) / 60.0
    }
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            minimum_minutes: default_minimum_travel_minutes(),
        }
    }
}

/// Engine harness run parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Number of steps to simulate before exiting.
    #[serde(default = "default_turns")]
    pub turns: u32,

    /// In-game hours per step.
    #[serde(default = "default_hours_per_turn")]
    pub hours_per_turn: f64,

    /// Real-time pause between steps, in milliseconds.
    #[serde(default = "default_turn_interval_ms")]
    pub turn_interval_ms: u64,

    /// Path of the YAML world seed file.
    #[serde(default = "default_world_file")]
    pub world_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turns: default_turns(),
            hours_per_turn: default_hours_per_turn(),
            turn_interval_ms: default_turn_interval_ms(),
            world_file: default_world_file(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// Override the level with `HOURGLASS_LOG` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOURGLASS_LOG") {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_start_day() -> u32 {
    1
}

fn default_start_time() -> String {
    "08:00".to_owned()
}

const fn default_start_weekday() -> Weekday {
    Weekday::Mon
}

const fn default_urgency_threshold() -> u32 {
    75
}

const fn default_completion_margin() -> u32 {
    20
}

const fn default_urgent_at() -> u32 {
    90
}

const fn default_high_at() -> u32 {
    80
}

const fn default_min_hours() -> f64 {
    0.5
}

const fn default_override_urgency() -> u32 {
    70
}

const fn default_minimum_travel_minutes() -> u32 {
    5
}

const fn default_turns() -> u32 {
    12
}

const fn default_hours_per_turn() -> f64 {
    1.0
}

const fn default_turn_interval_ms() -> u64 {
    250
}

fn default_world_file() -> String {
    "data/world.yaml".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}
