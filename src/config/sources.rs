//! Raw value providers: the configuration file decoder and the environment reader.
//!
//! Neither source knows about the other. The resolver decides their order.

use std::{collections::HashMap, fs, path::Path, str::FromStr};

use serde_json::Value;
use thiserror::Error;

use super::{Config, ConfigError, BOT_NAME};

/// Read-only access to environment variables.
pub trait EnvSource {
    /// Returns the value of `name`, or `None` if it is not set.
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Computes the environment variable name for a field key.
///
/// `placement` becomes `GOBOT_BME280_PLACEMENT`.
pub fn env_name(key: &str) -> String {
    format!("{}_{}", BOT_NAME.to_uppercase(), key.to_uppercase())
}

/// Parses the boolean tokens accepted for environment overrides.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// A single environment variable that could not be converted to its field type.
///
/// Never fatal: the field keeps the value of the previous layer.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("could not convert {name}={value:?}: {reason}")]
pub struct FieldConversionError {
    pub name: String,
    pub value: String,
    pub reason: String,
}

/// Fields that can be overridden from the environment.
///
/// The server CA path is intentionally absent: it can only come from the
/// defaults or the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvField {
    Placement,
    LogSensor,
    IntervalSecs,
    DisableMqtt,
    MqttHost,
    MqttTopic,
    MetricsAddr,
    ClientKeyFile,
    ClientCertFile,
    SensorBus,
    SensorAddress,
}

impl EnvField {
    /// All recognised fields, in the order they are applied.
    pub const ALL: [EnvField; 11] = [
        EnvField::Placement,
        EnvField::LogSensor,
        EnvField::IntervalSecs,
        EnvField::DisableMqtt,
        EnvField::MqttHost,
        EnvField::MqttTopic,
        EnvField::MetricsAddr,
        EnvField::ClientKeyFile,
        EnvField::ClientCertFile,
        EnvField::SensorBus,
        EnvField::SensorAddress,
    ];

    /// The field key, identical to the file key.
    pub fn key(self) -> &'static str {
        match self {
            EnvField::Placement => "placement",
            EnvField::LogSensor => "log_sensor",
            EnvField::IntervalSecs => "interval_s",
            EnvField::DisableMqtt => "disable_mqtt",
            EnvField::MqttHost => "mqtt_host",
            EnvField::MqttTopic => "mqtt_topic",
            EnvField::MetricsAddr => "metrics_addr",
            EnvField::ClientKeyFile => "ssl_client_key_file",
            EnvField::ClientCertFile => "ssl_client_cert_file",
            EnvField::SensorBus => "gpio_bus",
            EnvField::SensorAddress => "gpio_address",
        }
    }

    /// The environment variable carrying this field.
    pub fn env_name(self) -> String {
        env_name(self.key())
    }

    /// Converts `raw` and stores it in `config`.
    ///
    /// On error `config` is left untouched.
    pub fn apply(self, config: &mut Config, raw: &str) -> Result<(), FieldConversionError> {
        match self {
            EnvField::Placement => config.placement = raw.to_string(),
            EnvField::LogSensor => config.log_sensor = self.parse_flag(raw)?,
            EnvField::IntervalSecs => config.interval_s = self.parse_int(raw)?,
            EnvField::DisableMqtt => config.disable_mqtt = self.parse_flag(raw)?,
            EnvField::MqttHost => config.mqtt.host = raw.to_string(),
            EnvField::MqttTopic => config.mqtt.topic = raw.to_string(),
            EnvField::MetricsAddr => config.metrics_addr = raw.to_string(),
            EnvField::ClientKeyFile => config.mqtt.client_key_file = raw.to_string(),
            EnvField::ClientCertFile => config.mqtt.client_cert_file = raw.to_string(),
            EnvField::SensorBus => config.sensor.bus = self.parse_int(raw)?,
            EnvField::SensorAddress => config.sensor.address = self.parse_int(raw)?,
        }
        Ok(())
    }

    fn parse_flag(self, raw: &str) -> Result<bool, FieldConversionError> {
        parse_bool(raw).ok_or_else(|| self.conversion_error(raw, "not a boolean".to_string()))
    }

    fn parse_int<T>(self, raw: &str) -> Result<T, FieldConversionError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        raw.parse::<T>()
            .map_err(|e| self.conversion_error(raw, e.to_string()))
    }

    fn conversion_error(self, raw: &str, reason: String) -> FieldConversionError {
        FieldConversionError {
            name: self.env_name(),
            value: raw.to_string(),
            reason,
        }
    }
}

/// Reads and decodes a configuration file into a generic record.
///
/// `.toml` files are decoded as TOML, everything else as JSON. The record
/// must be a table/object.
pub fn decode_file(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |reason: String| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason,
    };

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let value: Value = if is_toml {
        toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
    } else {
        serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
    };

    if !value.is_object() {
        return Err(parse_error("top-level value must be an object".to_string()));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_env_name() {
        assert_eq!(env_name("placement"), "GOBOT_BME280_PLACEMENT");
        assert_eq!(env_name("interval_s"), "GOBOT_BME280_INTERVAL_S");
        assert_eq!(
            EnvField::ClientCertFile.env_name(),
            "GOBOT_BME280_SSL_CLIENT_CERT_FILE"
        );
    }

    #[test]
    fn test_server_ca_is_not_an_env_field() {
        assert!(EnvField::ALL
            .iter()
            .all(|field| field.key() != "ssl_server_ca_file"));
    }

    #[test]
    fn test_parse_bool_tokens() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        for raw in ["yes", "no", "tRuE", " true", ""] {
            assert_eq!(parse_bool(raw), None, "{raw}");
        }
    }

    #[test]
    fn test_apply_int_accepts_sign() {
        let mut config = Config::default();
        EnvField::IntervalSecs.apply(&mut config, "+60").unwrap();
        assert_eq!(config.interval_s, 60);
        EnvField::IntervalSecs.apply(&mut config, "-5").unwrap();
        assert_eq!(config.interval_s, -5);
    }

    #[test]
    fn test_apply_failure_leaves_field_untouched() {
        let mut config = Config::default();
        let err = EnvField::IntervalSecs.apply(&mut config, "0x3c").unwrap_err();
        assert_eq!(err.name, "GOBOT_BME280_INTERVAL_S");
        assert_eq!(err.value, "0x3c");
        assert_eq!(config.interval_s, 30);

        let err = EnvField::LogSensor.apply(&mut config, "yes").unwrap_err();
        assert!(err.to_string().contains("not a boolean"));
        assert!(!config.log_sensor);
    }

    #[test]
    fn test_decode_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"placement":"garage","interval_s":60}"#).unwrap();

        let value = decode_file(&path).unwrap();
        assert_eq!(value["placement"], "garage");
        assert_eq!(value["interval_s"], 60);
    }

    #[test]
    fn test_decode_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "placement = \"attic\"\n\n[logger]\nlevel = \"debug\"\n").unwrap();

        let value = decode_file(&path).unwrap();
        assert_eq!(value["placement"], "attic");
        assert_eq!(value["logger"]["level"], "debug");
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_file(Path::new("/nonexistent/bme280.json")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }

    #[test]
    fn test_decode_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{placement: garage").unwrap();

        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = decode_file(&path).unwrap_err();
        assert!(err.to_string().contains("must be an object"));
    }
}
