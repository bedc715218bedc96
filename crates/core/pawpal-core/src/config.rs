//! Configuration management and environment variable loading

use crate::workflow::MOOD_WINDOW;
use crate::{PawpalError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Load environment variables from a .env file in the current directory
/// or a parent directory.
///
/// A missing file is not an error; the system environment is used as-is.
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(PawpalError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(PawpalError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Load environment variables from a specific file
pub fn load_env_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(_) => {
            tracing::info!("Loaded environment from: {}", path.as_ref().display());
            Ok(())
        }
        Err(e) => Err(PawpalError::config(format!(
            "Failed to load {} environment file: {}",
            path.as_ref().display(),
            e
        ))),
    }
}

/// Get optional environment variable with default
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get environment variable as boolean
pub fn get_env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Get environment variable as float
pub fn get_env_float(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}

/// Tuning for the turn workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Minutes without interaction after which a turn opens with a greeting
    pub idle_greeting_minutes: i64,

    /// Energy strictly below this appends the tired message
    pub low_energy_threshold: i32,

    /// History pairs handed to the generator
    pub history_turns: usize,

    /// Upper bound on a single generator call
    pub generator_timeout_secs: u64,

    /// Most recent messages a companion keeps between turns
    pub max_carried_messages: usize,

    /// Location used when a weather request names no known city
    pub default_weather_location: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            idle_greeting_minutes: 5,
            low_energy_threshold: 30,
            history_turns: 6,
            generator_timeout_secs: 20,
            max_carried_messages: 40,
            default_weather_location: "北京".to_string(),
        }
    }
}

impl WorkflowConfig {
    /// Read overrides from `PAWPAL_*` variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            idle_greeting_minutes: get_env_int(
                "PAWPAL_IDLE_GREETING_MINUTES",
                defaults.idle_greeting_minutes,
            ),
            low_energy_threshold: get_env_int(
                "PAWPAL_LOW_ENERGY_THRESHOLD",
                defaults.low_energy_threshold,
            ),
            history_turns: get_env_int("PAWPAL_HISTORY_TURNS", defaults.history_turns),
            generator_timeout_secs: get_env_int(
                "PAWPAL_GENERATOR_TIMEOUT_SECS",
                defaults.generator_timeout_secs,
            ),
            max_carried_messages: get_env_int(
                "PAWPAL_MAX_CARRIED_MESSAGES",
                defaults.max_carried_messages,
            ),
            default_weather_location: get_env_or(
                "PAWPAL_WEATHER_LOCATION",
                &defaults.default_weather_location,
            ),
        }
    }

    /// Generator timeout as a `Duration`
    pub fn generator_timeout(&self) -> Duration {
        Duration::from_secs(self.generator_timeout_secs)
    }

    /// Smallest carried conversation that still covers the history pairs
    /// and the mood window
    pub fn min_carried_messages(&self) -> usize {
        (self.history_turns * 2).max(MOOD_WINDOW)
    }
}

/// Tuning for the proactive scheduler loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between ticks
    pub tick_interval_secs: u64,

    /// Seconds slept after repeated failing ticks
    pub backoff_secs: u64,

    /// Consecutive failing ticks before the loop backs off
    pub failure_backoff_threshold: u32,

    /// Apply the health decay step once per tick
    pub health_decay: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            backoff_secs: 60,
            failure_backoff_threshold: 2,
            health_decay: true,
        }
    }
}

impl SchedulerConfig {
    /// Read overrides from `PAWPAL_*` variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_interval_secs: get_env_int(
                "PAWPAL_TICK_INTERVAL_SECS",
                defaults.tick_interval_secs,
            ),
            backoff_secs: get_env_int("PAWPAL_BACKOFF_SECS", defaults.backoff_secs),
            failure_backoff_threshold: get_env_int(
                "PAWPAL_FAILURE_BACKOFF_THRESHOLD",
                defaults.failure_backoff_threshold,
            ),
            health_decay: get_env_bool("PAWPAL_HEALTH_DECAY", defaults.health_decay),
        }
    }

    /// Tick period as a `Duration`
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Backoff period as a `Duration`
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

/// Complete PawPal configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PawpalConfig {
    /// Turn workflow settings
    pub workflow: WorkflowConfig,

    /// Proactive scheduler settings
    pub scheduler: SchedulerConfig,
}

impl PawpalConfig {
    /// Build from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            workflow: WorkflowConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
        }
    }

    /// Reject settings the runtime cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.tick_interval_secs == 0 {
            return Err(PawpalError::config("PAWPAL_TICK_INTERVAL_SECS must be > 0"));
        }
        if self.scheduler.backoff_secs == 0 {
            return Err(PawpalError::config("PAWPAL_BACKOFF_SECS must be > 0"));
        }
        if !(0..=100).contains(&self.workflow.low_energy_threshold) {
            return Err(PawpalError::config(format!(
                "PAWPAL_LOW_ENERGY_THRESHOLD must be within 0..=100, got {}",
                self.workflow.low_energy_threshold
            )));
        }
        if self.workflow.generator_timeout_secs == 0 {
            return Err(PawpalError::config(
                "PAWPAL_GENERATOR_TIMEOUT_SECS must be > 0",
            ));
        }
        let floor = self.workflow.min_carried_messages();
        if self.workflow.max_carried_messages < floor {
            return Err(PawpalError::config(format!(
                "PAWPAL_MAX_CARRIED_MESSAGES must be at least {}, got {}",
                floor, self.workflow.max_carried_messages
            )));
        }
        Ok(())
    }
}
