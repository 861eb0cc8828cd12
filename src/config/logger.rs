//! Logging configuration structures and validation logic.
//!
//! Lives under the `logger` table of the configuration file. Every field is
//! optional; missing values fall back to the defaults below.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::BOT_NAME;

/// Available formats for console log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        };
        f.write_str(name)
    }
}

/// Top-level logging configuration.
///
/// Controls the global log level and output targets (console and/or journald).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggerConfig {
    /// Global log level. Valid values: trace, debug, info, warn, error (case-insensitive).
    #[validate(custom(function = "validate_log_level"))]
    pub level: String,

    /// Optional console output configuration.
    #[validate(nested)]
    pub console: Option<ConsoleConfig>,

    /// Optional systemd journald output configuration.
    #[validate(nested)]
    pub journald: Option<JournaldConfig>,
}

/// Validates that the provided log level is one of the supported values.
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => {
            let mut err = ValidationError::new("invalid_log_level");
            err.message = Some(format!("Invalid log level: {}", level).into());
            Err(err)
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            level: "info".to_string(),
            console: Some(ConsoleConfig::default()),
            journald: Some(JournaldConfig::default()),
        }
    }
}

impl LoggerConfig {
    /// Runs the derived rules and reduces the outcome to a single error.
    pub fn validate_config(&self) -> Result<(), ValidationError> {
        validate_log_level(&self.level)?;

        self.validate().map_err(|errors| {
            let mut err = ValidationError::new("invalid_logger");
            err.message = Some(format!("invalid logger configuration: {}", errors).into());
            err
        })
    }
}

/// Configuration for console log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Whether console output is enabled.
    pub enabled: bool,

    /// Output format for console logs.
    pub format: LogFormat,

    /// Include the log target (module path) in output.
    pub show_target: bool,

    /// Include thread IDs in output.
    pub show_thread_ids: bool,

    /// Enable ANSI color codes in console output.
    pub ansi_colors: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            enabled: true,
            format: LogFormat::default(),
            show_target: false,
            show_thread_ids: false,
            ansi_colors: true,
        }
    }
}

/// Configuration for systemd journald output (Unix only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct JournaldConfig {
    /// Whether journald output is enabled.
    pub enabled: bool,

    /// Identifier used for journal entries. Must be non-empty.
    #[validate(length(min = 1))]
    pub identifier: String,
}

impl Default for JournaldConfig {
    fn default() -> Self {
        JournaldConfig {
            enabled: false,
            identifier: BOT_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.console.as_ref().unwrap().format, LogFormat::Compact);
        let journald = config.journald.as_ref().unwrap();
        assert!(!journald.enabled);
        assert_eq!(journald.identifier, "gobot_bme280");
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_level_is_case_insensitive() {
        let config = LoggerConfig {
            level: "DEBUG".into(),
            ..Default::default()
        };
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_invalid_level() {
        let config = LoggerConfig {
            level: "verbose".into(),
            ..Default::default()
        };
        let err = config.validate_config().unwrap_err();
        assert_eq!(err.code, "invalid_log_level");
        assert_eq!(err.to_string(), "Invalid log level: verbose");
    }

    #[test]
    fn test_empty_journald_identifier() {
        let config = LoggerConfig {
            journald: Some(JournaldConfig {
                enabled: true,
                identifier: String::new(),
            }),
            ..Default::default()
        };
        assert_eq!(config.validate_config().unwrap_err().code, "invalid_logger");
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let console: ConsoleConfig = serde_json::from_str(r#"{"format":"json"}"#).unwrap();
        assert_eq!(console.format, LogFormat::Json);
        assert!(console.enabled);
        assert!(serde_json::from_str::<ConsoleConfig>(r#"{"format":"Json"}"#).is_err());
    }
}
