use thiserror::Error;

/// Errors raised while taking a sensor reading.
#[derive(Error, Debug)]
pub enum SensorError {
    /// Failed to read a sysfs attribute.
    #[error("Failed to read file {path}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A sysfs attribute did not hold a number.
    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: String, reason: String },

    /// No IIO device is bound to the configured bus and address.
    #[error("No IIO device found below {path}, is the bmp280 driver bound?")]
    DeviceNotFound { path: String },
}

impl SensorError {
    /// Short label used for the error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            SensorError::FileRead { .. } => "sensor_read",
            SensorError::ParseError { .. } => "sensor_parse",
            SensorError::DeviceNotFound { .. } => "sensor_missing",
        }
    }
}

/// Errors raised by the Prometheus endpoint.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The listen address could not be resolved or bound.
    #[error("Failed to bind metrics address '{addr}': {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The global recorder could not be installed.
    #[error("Failed to install metrics recorder: {0}")]
    Recorder(String),

    /// Serving the listener failed.
    #[error("Metrics server error: {0}")]
    Io(#[from] std::io::Error),
}
