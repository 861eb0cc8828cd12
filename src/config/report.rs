//! Human-readable listing of the effective configuration.

use std::fmt;

use super::Config;

/// One reported field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Every configuration field in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigReport {
    entries: Vec<ReportEntry>,
}

impl ConfigReport {
    fn push(&mut self, key: &'static str, value: impl ToString) {
        self.entries.push(ReportEntry {
            key,
            value: value.to_string(),
        });
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }
}

impl Config {
    /// Lists every field for startup diagnostics. Certificate and key
    /// settings are file paths, never file contents.
    pub fn report(&self) -> ConfigReport {
        let mut report = ConfigReport::default();

        report.push("placement", &self.placement);
        report.push("metrics_addr", &self.metrics_addr);
        report.push("interval_s", self.interval_s);
        report.push("log_sensor", self.log_sensor);
        report.push("disable_mqtt", self.disable_mqtt);

        report.push("mqtt_host", &self.mqtt.host);
        report.push("mqtt_topic", &self.mqtt.topic);
        report.push("ssl_client_cert_file", &self.mqtt.client_cert_file);
        report.push("ssl_client_key_file", &self.mqtt.client_key_file);
        report.push("ssl_server_ca_file", &self.mqtt.server_ca_file);

        report.push("gpio_bus", self.sensor.bus);
        report.push("gpio_address", format!("0x{:02x}", self.sensor.address));

        report.push("logger.level", &self.logger.level);
        match &self.logger.console {
            Some(console) => {
                report.push("logger.console.enabled", console.enabled);
                report.push("logger.console.format", console.format);
            }
            None => report.push("logger.console.enabled", false),
        }
        match &self.logger.journald {
            Some(journald) => {
                report.push("logger.journald.enabled", journald.enabled);
                report.push("logger.journald.identifier", &journald.identifier);
            }
            None => report.push("logger.journald.enabled", false),
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::logger::LoggerConfig;

    fn value<'a>(report: &'a ConfigReport, key: &str) -> Option<&'a str> {
        report
            .entries()
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    #[test]
    fn test_report_order() {
        let keys: Vec<_> = Config::default()
            .report()
            .entries()
            .iter()
            .map(|entry| entry.key)
            .collect();

        assert_eq!(
            keys,
            [
                "placement",
                "metrics_addr",
                "interval_s",
                "log_sensor",
                "disable_mqtt",
                "mqtt_host",
                "mqtt_topic",
                "ssl_client_cert_file",
                "ssl_client_key_file",
                "ssl_server_ca_file",
                "gpio_bus",
                "gpio_address",
                "logger.level",
                "logger.console.enabled",
                "logger.console.format",
                "logger.journald.enabled",
                "logger.journald.identifier",
            ]
        );
    }

    #[test]
    fn test_report_values() {
        let mut config = Config {
            placement: "garage".into(),
            log_sensor: true,
            ..Default::default()
        };
        config.mqtt.client_cert_file = "/etc/bot/client.crt".into();

        let report = config.report();
        assert_eq!(value(&report, "placement"), Some("garage"));
        assert_eq!(value(&report, "interval_s"), Some("30"));
        assert_eq!(value(&report, "log_sensor"), Some("true"));
        assert_eq!(value(&report, "mqtt_topic"), Some("sensors/bme280/%s"));
        assert_eq!(value(&report, "ssl_client_cert_file"), Some("/etc/bot/client.crt"));
        assert_eq!(value(&report, "gpio_address"), Some("0x77"));
        assert_eq!(value(&report, "logger.console.format"), Some("compact"));
        assert_eq!(value(&report, "unknown"), None);
    }

    #[test]
    fn test_report_without_logger_outputs() {
        let config = Config {
            logger: LoggerConfig {
                console: None,
                journald: None,
                ..Default::default()
            },
            ..Default::default()
        };
        let report = config.report();
        assert_eq!(value(&report, "logger.console.enabled"), Some("false"));
        assert_eq!(value(&report, "logger.console.format"), None);
    }

    #[test]
    fn test_entry_display() {
        let lines: Vec<String> = Config::default()
            .report()
            .entries()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(lines[..3], ["placement=", "metrics_addr=:9192", "interval_s=30"]);
        assert!(lines.contains(&"gpio_bus=1".to_string()));
    }
}
