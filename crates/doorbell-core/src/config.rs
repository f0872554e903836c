//! Configuration loading and typed config structures.
//!
//! The deployed configuration lives in `doorbell-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure and a loader
//! that reads, overrides, and validates it. Every field has a default, so an
//! empty file is a valid configuration.

use std::path::Path;
use std::time::Duration;

use doorbell_db::{Durability, SqliteConfig};
use doorbell_types::ActorId;
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

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `doorbell-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DoorbellConfig {
    /// Door sensor sampling and debouncing.
    #[serde(default)]
    pub sensor: SensorConfig,

    /// Space status state machine settings.
    #[serde(default)]
    pub space: SpaceConfig,

    /// Event database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Statistics report settings.
    #[serde(default)]
    pub statistics: StatisticsConfig,

    /// Read-only HTTP API settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DoorbellConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `DATABASE_URL` overrides `storage.database_url` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.storage.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// Environment overrides are not applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.debounce_ticks == 0 {
            return Err(invalid("sensor.debounce_ticks must be at least 1"));
        }
        if self.sensor.poll_interval_ms == 0 {
            return Err(invalid("sensor.poll_interval_ms must be at least 1"));
        }
        if self.storage.max_connections == 0 {
            return Err(invalid("storage.max_connections must be at least 1"));
        }
        if self.statistics.cache_ttl_secs == 0 {
            return Err(invalid("statistics.cache_ttl_secs must be at least 1"));
        }
        if self.statistics.top_n == 0 {
            return Err(invalid("statistics.top_n must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Where sensor samples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    /// Runtime-toggled virtual sensor, driven from the console.
    #[default]
    Virtual,
    /// A sysfs-style GPIO value file.
    Gpio,
}

/// Door sensor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SensorConfig {
    /// Sampling source.
    #[serde(default)]
    pub mode: SensorMode,

    /// Path of the GPIO value file, used in `gpio` mode.
    #[serde(default = "default_gpio_value_path")]
    pub gpio_value_path: String,

    /// Whether a high (`1`) reading means locked. The stock wiring pulls the
    /// pin up and the reed switch grounds it, so low means locked.
    #[serde(default)]
    pub locked_when_high: bool,

    /// Milliseconds between samples.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Consecutive identical samples required to confirm a transition.
    #[serde(default = "default_debounce_ticks")]
    pub debounce_ticks: u32,
}

impl SensorConfig {
    /// The sampling interval as a [`Duration`].
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            mode: SensorMode::default(),
            gpio_value_path: default_gpio_value_path(),
            locked_when_high: false,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ticks: default_debounce_ticks(),
        }
    }
}

/// Space status configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpaceConfig {
    /// Actor id recorded for sensor-driven events.
    #[serde(default = "default_system_actor")]
    pub system_actor: i64,
}

impl SpaceConfig {
    /// The system sentinel as an [`ActorId`].
    pub const fn system_actor(&self) -> ActorId {
        ActorId(self.system_actor)
    }
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            system_actor: default_system_actor(),
        }
    }
}

/// Event database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` connection URL.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Milliseconds a statement waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Commit durability: `full` or `normal`.
    #[serde(default)]
    pub durability: Durability,
}

impl StorageConfig {
    /// Override the database URL with `DATABASE_URL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.database_url = val;
        }
    }

    /// Build the pool configuration for [`doorbell_db::Database::connect`].
    pub fn to_sqlite_config(&self) -> SqliteConfig {
        SqliteConfig::new(&self.database_url)
            .with_max_connections(self.max_connections)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .with_durability(self.durability)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
            durability: Durability::default(),
        }
    }
}

/// Statistics report configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatisticsConfig {
    /// Seconds a generated report is served before regeneration.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Time zone for calendar bucketing: `local`, `UTC`, or an offset such
    /// as `-07:00`.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Length of every leaderboard.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl StatisticsConfig {
    /// The cache TTL as a [`Duration`].
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            time_zone: default_time_zone(),
            top_n: default_top_n(),
        }
    }
}

/// Observer HTTP API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to serve the API at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is
    /// unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

fn default_gpio_value_path() -> String {
    "/sys/class/gpio/gpio4/value".to_owned()
}

const fn default_poll_interval_ms() -> u64 {
    1_000
}

const fn default_debounce_ticks() -> u32 {
    60
}

const fn default_system_actor() -> i64 {
    -1
}

fn default_database_url() -> String {
    "sqlite://doorbell/stats.sqlite".to_owned()
}

const fn default_max_connections() -> u32 {
    4
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_cache_ttl_secs() -> u64 {
    900
}

fn default_time_zone() -> String {
    "local".to_owned()
}

const fn default_top_n() -> usize {
    5
}

fn default_observer_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}
