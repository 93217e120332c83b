//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `doorwatch.toml` in the working directory, or the file named by
//! `DOORWATCH_CONFIG`. Every field except the door list has a default, and
//! environment variables take precedence over file values.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;

use doorwatch_adapter_gpio_rppal::GpioConfig;
use doorwatch_app::command_loop::CommandPolicy;
use doorwatch_app::door_controller::DoorTimings;
use doorwatch_domain::subscription::Recipient;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub timings: TimingsConfig,
    pub hardware: HardwareConfig,
    pub doors: Vec<DoorConfig>,
    pub commands: CommandsConfig,
    pub nightly: NightlyConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Controller delays and the sensor poll period.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingsConfig {
    pub settle_secs: u64,
    pub transition_secs: u64,
    pub quiet_secs: u64,
    pub reminder_secs: u64,
    pub poll_millis: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Simulated doors; nothing is wired.
    #[default]
    Virtual,
    /// Raspberry Pi GPIO header.
    Gpio,
}

/// Which hardware drives the doors. The GPIO keys only matter for the
/// gpio backend.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub backend: Backend,
    #[serde(flatten)]
    pub gpio: GpioConfig,
}

/// One monitored door.
#[derive(Debug, Clone, Deserialize)]
pub struct DoorConfig {
    pub name: String,
    pub abbreviation: String,
    #[serde(default)]
    pub sensor_pin: Option<u8>,
    #[serde(default)]
    pub actuator_pin: Option<u8>,
}

/// Command transport policy.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Origins allowed to send commands.
    pub allowed: Vec<String>,
    /// Origins alerted about commands from anyone else.
    pub admins: Vec<String>,
    /// Longest wait for a command before the liveness beat.
    pub queue_poll_secs: u64,
    /// File rewritten on every liveness beat, for an external watchdog.
    pub heartbeat_file: Option<PathBuf>,
}

/// Daily open-door check.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NightlyConfig {
    pub enabled: bool,
    /// Local wall-clock time, `HH:MM`.
    pub at: String,
}

impl Config {
    /// Load configuration from `doorwatch.toml` (or `DOORWATCH_CONFIG`),
    /// then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("DOORWATCH_CONFIG").unwrap_or_else(|_| "doorwatch.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// `DOORWATCH_LOG` takes precedence over `RUST_LOG`.
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("DOORWATCH_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("DOORWATCH_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.doors.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[doors]] entry is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut abbreviations = HashSet::new();
        for door in &self.doors {
            if door.name.trim().is_empty() || door.abbreviation.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "door name and abbreviation must not be empty".to_string(),
                ));
            }
            if !names.insert(door.name.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "door {:?} is configured twice",
                    door.name
                )));
            }
            if !abbreviations.insert(door.abbreviation.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "abbreviation {:?} is used by two doors",
                    door.abbreviation
                )));
            }
            if self.hardware.backend == Backend::Gpio
                && (door.sensor_pin.is_none() || door.actuator_pin.is_none())
            {
                return Err(ConfigError::Validation(format!(
                    "door {:?} needs sensor_pin and actuator_pin with the gpio backend",
                    door.name
                )));
            }
        }

        let t = &self.timings;
        if [t.settle_secs, t.transition_secs, t.quiet_secs, t.reminder_secs, t.poll_millis]
            .contains(&0)
        {
            return Err(ConfigError::Validation(
                "timings must be non-zero".to_string(),
            ));
        }
        if self.commands.queue_poll_secs == 0 {
            return Err(ConfigError::Validation(
                "queue_poll_secs must be non-zero".to_string(),
            ));
        }

        self.policy()?;
        self.nightly_at()?;
        Ok(())
    }

    /// Controller delays in the shape the controller takes them.
    #[must_use]
    pub fn door_timings(&self) -> DoorTimings {
        DoorTimings {
            settle: Duration::from_secs(self.timings.settle_secs),
            transition: Duration::from_secs(self.timings.transition_secs),
            quiet: Duration::from_secs(self.timings.quiet_secs),
            reminder: Duration::from_secs(self.timings.reminder_secs),
        }
    }

    #[must_use]
    pub fn sensor_poll(&self) -> Duration {
        Duration::from_millis(self.timings.poll_millis)
    }

    #[must_use]
    pub fn queue_poll(&self) -> Duration {
        Duration::from_secs(self.commands.queue_poll_secs)
    }

    /// The allow-list and admin list as recipients.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an empty recipient.
    pub fn policy(&self) -> Result<CommandPolicy, ConfigError> {
        let parse = |raw: &String| {
            Recipient::new(raw.clone())
                .map_err(|err| ConfigError::Validation(format!("recipient {raw:?}: {err}")))
        };
        Ok(CommandPolicy {
            allowed: self
                .commands
                .allowed
                .iter()
                .map(parse)
                .collect::<Result<BTreeSet<_>, _>>()?,
            admins: self
                .commands
                .admins
                .iter()
                .map(parse)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `[nightly] at` is not `HH:MM`.
    pub fn nightly_at(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.nightly.at, "%H:%M").map_err(|_| {
            ConfigError::Validation(format!(
                "nightly check time {:?} is not HH:MM",
                self.nightly.at
            ))
        })
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:doorwatch.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "doorwatchd=info,doorwatch=info".to_string(),
        }
    }
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            settle_secs: 20,
            transition_secs: 30,
            quiet_secs: 300,
            reminder_secs: 1800,
            poll_millis: 500,
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            allowed: Vec::new(),
            admins: Vec::new(),
            queue_poll_secs: 60,
            heartbeat_file: None,
        }
    }
}

impl Default for NightlyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            at: "22:00".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
