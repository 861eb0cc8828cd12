//! BME280 readings through the Linux IIO subsystem.
//!
//! The `bmp280` kernel driver exposes the sensor below the I2C client
//! directory of its bus and address:
//!
//! ```text
//! /sys/bus/i2c/devices/
//!   1-0077/
//!     iio:device0/
//!       in_temp_input              <- millidegrees Celsius, e.g. "21430"
//!       in_humidityrelative_input  <- milli-percent, absent on a BMP280
//!       in_pressure_input          <- kilopascal, e.g. "100.712343750"
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::trace;

use super::error::SensorError;
use crate::config::sensor::SensorConfig;

/// Default location of I2C client devices.
pub const I2C_DEVICES_ROOT: &str = "/sys/bus/i2c/devices";

const TEMPERATURE_CHANNEL: &str = "in_temp_input";
const HUMIDITY_CHANNEL: &str = "in_humidityrelative_input";
const PRESSURE_CHANNEL: &str = "in_pressure_input";

/// One measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub temperature_c: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity_pct: Option<f64>,
    pub pressure_hpa: f64,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
}

/// Source of readings.
#[async_trait::async_trait]
pub trait Sensor: Send + Sync {
    async fn read(&self) -> Result<Reading, SensorError>;
}

/// Reads a BME280 (or BMP280) bound to the `bmp280` IIO driver.
#[derive(Debug, Clone)]
pub struct IioSensor {
    client_dir: PathBuf,
}

impl IioSensor {
    pub fn new(config: &SensorConfig) -> Self {
        Self::with_root(I2C_DEVICES_ROOT, config)
    }

    /// Uses `root` instead of [`I2C_DEVICES_ROOT`].
    pub fn with_root(root: impl AsRef<Path>, config: &SensorConfig) -> Self {
        let client = format!("{}-{:04x}", config.bus, config.address);
        Self {
            client_dir: root.as_ref().join(client),
        }
    }

    pub fn client_dir(&self) -> &Path {
        &self.client_dir
    }

    /// Finds the `iio:device*` directory of the client.
    async fn device_dir(&self) -> Result<PathBuf, SensorError> {
        let not_found = || SensorError::DeviceNotFound {
            path: self.client_dir.display().to_string(),
        };

        let mut entries = tokio::fs::read_dir(&self.client_dir)
            .await
            .map_err(|_| not_found())?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with("iio:device"))
            {
                return Ok(entry.path());
            }
        }

        Err(not_found())
    }
}

#[async_trait::async_trait]
impl Sensor for IioSensor {
    async fn read(&self) -> Result<Reading, SensorError> {
        let device = self.device_dir().await?;
        trace!("Reading sensor from {}", device.display());

        let temperature = read_channel(&device.join(TEMPERATURE_CHANNEL)).await?;
        let pressure = read_channel(&device.join(PRESSURE_CHANNEL)).await?;

        let humidity_path = device.join(HUMIDITY_CHANNEL);
        let humidity = if tokio::fs::try_exists(&humidity_path).await.unwrap_or(false) {
            Some(read_channel(&humidity_path).await? / 1000.0)
        } else {
            None
        };

        Ok(Reading {
            temperature_c: temperature / 1000.0,
            humidity_pct: humidity,
            pressure_hpa: pressure * 10.0,
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
        })
    }
}

async fn read_channel(path: &Path) -> Result<f64, SensorError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SensorError::FileRead {
            path: path.display().to_string(),
            source,
        })?;

    raw.trim()
        .parse::<f64>()
        .map_err(|e| SensorError::ParseError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn device(root: &TempDir, client: &str, channels: &[(&str, &str)]) {
        let dir = root.path().join(client).join("iio:device0");
        fs::create_dir_all(&dir).unwrap();
        for (name, value) in channels {
            fs::write(dir.join(name), format!("{value}\n")).unwrap();
        }
    }

    #[test]
    fn test_client_dir_naming() {
        let sensor = IioSensor::new(&SensorConfig::default());
        assert_eq!(sensor.client_dir(), Path::new("/sys/bus/i2c/devices/1-0077"));

        let sensor = IioSensor::with_root("/tmp", &SensorConfig { bus: 0, address: 0x76 });
        assert_eq!(sensor.client_dir(), Path::new("/tmp/0-0076"));
    }

    #[tokio::test]
    async fn test_read_bme280() {
        let root = TempDir::new().unwrap();
        device(
            &root,
            "1-0077",
            &[
                (TEMPERATURE_CHANNEL, "21430"),
                (HUMIDITY_CHANNEL, "48512"),
                (PRESSURE_CHANNEL, "100.712343750"),
            ],
        );

        let reading = IioSensor::with_root(root.path(), &SensorConfig::default())
            .read()
            .await
            .unwrap();

        assert!((reading.temperature_c - 21.43).abs() < 1e-9);
        assert!((reading.humidity_pct.unwrap() - 48.512).abs() < 1e-9);
        assert!((reading.pressure_hpa - 1007.1234375).abs() < 1e-9);
        assert!(reading.timestamp > 0);
    }

    #[tokio::test]
    async fn test_read_bmp280_without_humidity() {
        let root = TempDir::new().unwrap();
        device(
            &root,
            "1-0076",
            &[(TEMPERATURE_CHANNEL, "-5250"), (PRESSURE_CHANNEL, "98.5")],
        );

        let config = SensorConfig { bus: 1, address: 0x76 };
        let reading = IioSensor::with_root(root.path(), &config).read().await.unwrap();

        assert!((reading.temperature_c + 5.25).abs() < 1e-9);
        assert_eq!(reading.humidity_pct, None);
        assert!(!serde_json::to_string(&reading).unwrap().contains("humidity_pct"));
    }

    #[tokio::test]
    async fn test_missing_device() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("1-0077")).unwrap();

        let err = IioSensor::with_root(root.path(), &SensorConfig::default())
            .read()
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::DeviceNotFound { .. }));
        assert_eq!(err.kind(), "sensor_missing");
    }

    #[tokio::test]
    async fn test_missing_pressure_channel() {
        let root = TempDir::new().unwrap();
        device(&root, "1-0077", &[(TEMPERATURE_CHANNEL, "21000")]);

        let err = IioSensor::with_root(root.path(), &SensorConfig::default())
            .read()
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::FileRead { .. }));
    }

    #[tokio::test]
    async fn test_garbage_value() {
        let root = TempDir::new().unwrap();
        device(
            &root,
            "1-0077",
            &[(TEMPERATURE_CHANNEL, "warm"), (PRESSURE_CHANNEL, "100.0")],
        );

        let err = IioSensor::with_root(root.path(), &SensorConfig::default())
            .read()
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::ParseError { .. }));
        assert!(err.to_string().contains(TEMPERATURE_CHANNEL));
    }
}
