//! Application configuration loading, validation, and reporting.
//!
//! The effective [`Config`] is built once at startup from three layers, lowest
//! precedence first:
//!
//! 1. compiled-in defaults ([`Config::default`])
//! 2. an optional JSON (or TOML) file
//! 3. `GOBOT_BME280_*` environment variables
//!
//! The merged result is reported and validated before any hardware or network
//! resource is touched, and is immutable afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub mod logger;
pub mod mqtt;
pub mod report;
pub mod resolver;
pub mod sensor;
pub mod sources;
mod validation;

use self::{logger::LoggerConfig, mqtt::MqttConfig, sensor::SensorConfig, sources::{EnvSource, ProcessEnv}};

/// Process identity. Also the prefix of every environment override.
pub const BOT_NAME: &str = "gobot_bme280";

const DEFAULT_LOG_SENSOR: bool = false;
pub(crate) const DEFAULT_INTERVAL_SECONDS: i64 = 30;
const DEFAULT_METRICS_ADDR: &str = ":9192";

/// Severity of a message printed before the tracing subscriber is installed.
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
pub enum EarlyLevel {
    Info,
    Warn,
    Error,
}

/// Prints a timestamped line to stdout. Backend of the `print_*` macros.
#[doc(hidden)]
pub fn early_print(level: EarlyLevel, args: std::fmt::Arguments<'_>) {
    let now = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let level = match level {
        EarlyLevel::Info => console::style("INFO").green(),
        EarlyLevel::Warn => console::style("WARN").yellow(),
        EarlyLevel::Error => console::style("ERROR").red(),
    };
    println!("{}  {} {}", console::style(now).dim(), level, args);
}

/// Simple macros for printing timestamped messages before the tracing subscriber
/// is initialized. These are used during early configuration loading.
#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        $crate::config::early_print($crate::config::EarlyLevel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_warn {
    ($($arg:tt)*) => {
        $crate::config::early_print($crate::config::EarlyLevel::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::config::early_print($crate::config::EarlyLevel::Error, format_args!($($arg)*))
    };
}

/// Errors that can occur while resolving or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read config from file {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not a valid record for this schema.
    #[error("could not parse config file {}: {reason}", path.display())]
    ParseError { path: PathBuf, reason: String },

    /// The in-memory configuration could not be converted for merging.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A validation rule rejected the resolved configuration.
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationError),
}

/// The effective configuration of the daemon.
///
/// File keys are flat: the MQTT and sensor sub-configs are flattened into the
/// top-level record. Only `logger` is a nested table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Logical location of the sensor, e.g. `garage`. Required.
    pub placement: String,

    /// Listen address of the Prometheus endpoint. Empty disables metrics.
    pub metrics_addr: String,

    /// Sampling interval in seconds, 30..=300.
    pub interval_s: i64,

    /// Also log every reading.
    pub log_sensor: bool,

    /// Skip broker publishing entirely.
    pub disable_mqtt: bool,

    #[serde(flatten)]
    pub mqtt: MqttConfig,

    #[serde(flatten)]
    pub sensor: SensorConfig,

    /// Logging subsystem configuration.
    pub logger: LoggerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            placement: String::new(),
            metrics_addr: DEFAULT_METRICS_ADDR.to_string(),
            interval_s: DEFAULT_INTERVAL_SECONDS,
            log_sensor: DEFAULT_LOG_SENSOR,
            disable_mqtt: false,
            mqtt: MqttConfig::default(),
            sensor: SensorConfig::default(),
            logger: LoggerConfig::default(),
        }
    }
}

impl Config {
    /// Whether the Prometheus endpoint should be started.
    pub fn metrics_enabled(&self) -> bool {
        !self.metrics_addr.is_empty()
    }

    /// MQTT client identifier, unique per placement.
    pub fn client_id(&self) -> String {
        format!("{}_{}", BOT_NAME, self.placement)
    }
}

/// Resolves, reports and validates the configuration.
///
/// This is the single entry point used by the binary. `path` of `None` (or an
/// empty path) skips the file layer.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read or parsed, or if a
/// validation rule fails.
pub fn read(path: Option<&Path>) -> Result<Config, ConfigError> {
    read_with(path, &ProcessEnv)
}

/// Same as [`read`], with environment overrides taken from `env`.
pub fn read_with<E: EnvSource + ?Sized>(
    path: Option<&Path>,
    env: &E,
) -> Result<Config, ConfigError> {
    let config = resolver::resolve(path, env)?;

    print_info!("-----------------");
    print_info!("Configuration:");
    for entry in config.report().entries() {
        print_info!("{}", entry);
    }
    print_info!("-----------------");

    print_info!("Validating config...");
    config.validate_config()?;

    Ok(config)
}
