//! Rules checked against the resolved configuration.
//!
//! Validation is fail-fast: the first violated rule is reported as a
//! [`ValidationError`] carrying a stable code and a human-readable message.

use validator::ValidationError;

use super::Config;

const MIN_INTERVAL_SECONDS: i64 = 30;
const MAX_INTERVAL_SECONDS: i64 = 300;

impl Config {
    /// Checks the resolved configuration.
    ///
    /// Rules run in a fixed order and the first violation is returned. MQTT
    /// settings are only checked while publishing is enabled.
    pub fn validate_config(&self) -> Result<(), ValidationError> {
        if self.placement.is_empty() {
            let mut err = ValidationError::new("empty_placement");
            err.message = Some("empty placement provided".into());
            return Err(err);
        }

        if self.interval_s < MIN_INTERVAL_SECONDS {
            let mut err = ValidationError::new("interval_too_low");
            err.message = Some(
                format!(
                    "invalid interval: must not be lower than {} but is {}",
                    MIN_INTERVAL_SECONDS, self.interval_s
                )
                .into(),
            );
            return Err(err);
        }

        if self.interval_s > MAX_INTERVAL_SECONDS {
            let mut err = ValidationError::new("interval_too_high");
            err.message = Some(
                format!(
                    "invalid interval: must not be greater than {} but is {}",
                    MAX_INTERVAL_SECONDS, self.interval_s
                )
                .into(),
            );
            return Err(err);
        }

        self.sensor.validate_config()?;
        self.logger.validate_config()?;

        if self.disable_mqtt {
            return Ok(());
        }

        self.mqtt.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{logger::LoggerConfig, mqtt::MqttConfig, sensor::SensorConfig};

    fn valid() -> Config {
        Config {
            placement: "garage".into(),
            mqtt: MqttConfig {
                host: "tcp://broker:1883".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn code(config: &Config) -> String {
        config.validate_config().unwrap_err().code.to_string()
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate_config().is_ok());
    }

    #[test]
    fn test_defaults_fail_on_placement() {
        let err = Config::default().validate_config().unwrap_err();
        assert_eq!(err.code, "empty_placement");
        assert_eq!(err.to_string(), "empty placement provided");
    }

    #[test]
    fn test_interval_bounds() {
        for interval_s in [30, 31, 299, 300] {
            let config = Config { interval_s, ..valid() };
            assert!(config.validate_config().is_ok(), "{interval_s}");
        }

        let low = Config { interval_s: 29, ..valid() };
        let err = low.validate_config().unwrap_err();
        assert_eq!(err.code, "interval_too_low");
        assert_eq!(
            err.to_string(),
            "invalid interval: must not be lower than 30 but is 29"
        );

        let high = Config { interval_s: 301, ..valid() };
        let err = high.validate_config().unwrap_err();
        assert_eq!(err.code, "interval_too_high");
        assert_eq!(
            err.to_string(),
            "invalid interval: must not be greater than 300 but is 301"
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let config = Config {
            placement: String::new(),
            interval_s: 5,
            mqtt: MqttConfig::default(),
            ..Default::default()
        };
        assert_eq!(code(&config), "empty_placement");

        let config = Config {
            interval_s: 5,
            sensor: SensorConfig { bus: -1, address: 0 },
            ..valid()
        };
        assert_eq!(code(&config), "interval_too_low");
    }

    #[test]
    fn test_sensor_checked_even_without_mqtt() {
        let config = Config {
            disable_mqtt: true,
            sensor: SensorConfig { bus: 1, address: 0x80 },
            ..valid()
        };
        assert_eq!(code(&config), "invalid_sensor_address");
    }

    #[test]
    fn test_logger_checked() {
        let config = Config {
            logger: LoggerConfig {
                level: "loud".into(),
                ..Default::default()
            },
            ..valid()
        };
        assert_eq!(code(&config), "invalid_log_level");
    }

    #[test]
    fn test_mqtt_disabled_skips_broker_rules() {
        let config = Config {
            disable_mqtt: true,
            mqtt: MqttConfig {
                host: String::new(),
                client_cert_file: "/etc/bot/client.crt".into(),
                ..Default::default()
            },
            ..valid()
        };
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_mqtt_enabled_requires_host() {
        let config = Config {
            mqtt: MqttConfig::default(),
            ..valid()
        };
        assert_eq!(code(&config), "empty_mqtt_host");
    }

    #[test]
    fn test_client_auth_is_symmetric() {
        let cert_only = Config {
            mqtt: MqttConfig {
                client_cert_file: "/etc/bot/client.crt".into(),
                ..valid().mqtt
            },
            ..valid()
        };
        assert_eq!(code(&cert_only), "incomplete_client_auth");

        let key_only = Config {
            mqtt: MqttConfig {
                client_key_file: "/etc/bot/client.key".into(),
                ..valid().mqtt
            },
            ..valid()
        };
        assert_eq!(code(&key_only), "incomplete_client_auth");

        let both = Config {
            mqtt: MqttConfig {
                client_cert_file: "/etc/bot/client.crt".into(),
                client_key_file: "/etc/bot/client.key".into(),
                ..valid().mqtt
            },
            ..valid()
        };
        assert!(both.validate_config().is_ok());
    }

    #[test]
    fn test_server_ca_without_client_material() {
        let config = Config {
            mqtt: MqttConfig {
                server_ca_file: "/etc/bot/ca.pem".into(),
                ..valid().mqtt
            },
            ..valid()
        };
        assert_eq!(code(&config), "server_ca_without_client_auth");
    }
}
