//! Centralized logging configuration and initialization manager.
//!
//! The `LoggerManager` validates logging configuration and initializes
//! the global `tracing` subscriber with layers for console and/or systemd
//! journald output.

use std::io;

use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};
use validator::{Validate, ValidationErrors};

#[cfg(feature = "journald")]
use crate::print_info;
use crate::{
    config::logger::{ConsoleConfig, LogFormat, LoggerConfig},
    print_warn,
};

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Errors that can occur during logger configuration or initialization.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// Validation errors from the logger configuration struct.
    #[error("Logger configuration validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    /// IO error, typically during journald socket operations.
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// Journald output was requested but the binary was built without it.
    #[error("journald output is not supported by this build")]
    JournaldUnsupported,

    /// No output layers were successfully configured.
    #[error("No logging layers were configured or successfully initialized")]
    NoLayersConfigured,

    /// Journald logger failed to initialize while console output is disabled.
    #[error("Failed to initialize journald logger and console output is disabled")]
    JournaldFailedWithoutConsole,

    /// A global subscriber is already installed.
    #[error("Failed to install global subscriber: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Manages logging configuration and global subscriber initialization.
pub struct LoggerManager {
    config: LoggerConfig,
}

impl LoggerManager {
    /// Creates a new `LoggerManager` and validates the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::ValidationError` if configuration validation fails.
    pub fn new(config: LoggerConfig) -> Result<Self, LoggerError> {
        config.validate()?;

        Ok(LoggerManager { config })
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.config.level))
    }

    /// Builds every enabled output layer.
    ///
    /// A journald failure is tolerated as long as console output is enabled.
    pub fn layers(&self) -> Result<Vec<BoxedLayer>, LoggerError> {
        let mut layers = Vec::new();
        let console_enabled = self.config.console.as_ref().is_some_and(|c| c.enabled);

        if let Some(console_config) = self.config.console.as_ref().filter(|c| c.enabled) {
            layers.push(self.console_layer(console_config));
        }

        if let Some(journald_config) = self.config.journald.as_ref().filter(|j| j.enabled) {
            match self.journald_layer(&journald_config.identifier) {
                Ok(layer) => {
                    layers.push(layer);
                    #[cfg(feature = "journald")]
                    print_info!(
                        "Systemd journald logger initialized with identifier: {}",
                        journald_config.identifier
                    );
                }
                Err(e) => {
                    print_warn!("Failed to initialize systemd journald logger: {}", e);
                    if !console_enabled {
                        return Err(LoggerError::JournaldFailedWithoutConsole);
                    }
                }
            }
        }

        if layers.is_empty() {
            print_warn!("No logging layers were initialized. Please check your configuration.");
            return Err(LoggerError::NoLayersConfigured);
        }

        Ok(layers)
    }

    /// Initializes the global `tracing` subscriber with configured layers.
    ///
    /// Must be called once at startup, after the configuration was read.
    pub fn init(&self) -> Result<(), LoggerError> {
        let layers = self.layers()?;
        tracing_subscriber::registry().with(layers).try_init()?;
        Ok(())
    }

    fn console_layer(&self, config: &ConsoleConfig) -> BoxedLayer {
        let layer = fmt::layer()
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_ansi(config.ansi_colors)
            .with_writer(io::stdout);

        match config.format {
            LogFormat::Json => layer.json().with_filter(self.filter()).boxed(),
            LogFormat::Pretty => layer.pretty().with_filter(self.filter()).boxed(),
            LogFormat::Compact => layer.compact().with_filter(self.filter()).boxed(),
        }
    }

    #[cfg(feature = "journald")]
    fn journald_layer(&self, identifier: &str) -> Result<BoxedLayer, LoggerError> {
        let layer = tracing_journald::layer()?.with_syslog_identifier(identifier.to_string());
        Ok(layer.with_filter(self.filter()).boxed())
    }

    #[cfg(not(feature = "journald"))]
    fn journald_layer(&self, _identifier: &str) -> Result<BoxedLayer, LoggerError> {
        Err(LoggerError::JournaldUnsupported)
    }
}
