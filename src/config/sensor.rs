//! Sensor location on the I2C bus.

use serde::{Deserialize, Serialize};
use validator::ValidationError;

const DEFAULT_BUS: i64 = 1;
const DEFAULT_ADDRESS: i64 = 0x77;

/// Lowest and highest non-reserved 7-bit I2C addresses.
const ADDRESS_RANGE: std::ops::RangeInclusive<i64> = 0x03..=0x77;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// I2C bus number, i.e. `/dev/i2c-<bus>`.
    #[serde(rename = "gpio_bus")]
    pub bus: i64,

    /// 7-bit device address. The BME280 answers on 0x76 or 0x77.
    #[serde(rename = "gpio_address")]
    pub address: i64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            bus: DEFAULT_BUS,
            address: DEFAULT_ADDRESS,
        }
    }
}

impl SensorConfig {
    pub fn validate_config(&self) -> Result<(), ValidationError> {
        if self.bus < 0 {
            let mut err = ValidationError::new("invalid_sensor_bus");
            err.message = Some(
                format!("invalid sensor bus: must not be negative but is {}", self.bus).into(),
            );
            return Err(err);
        }

        if !ADDRESS_RANGE.contains(&self.address) {
            let mut err = ValidationError::new("invalid_sensor_address");
            err.message = Some(
                format!(
                    "invalid sensor address: must be within 0x{:02x}..=0x{:02x} but is {}",
                    ADDRESS_RANGE.start(),
                    ADDRESS_RANGE.end(),
                    self.address
                )
                .into(),
            );
            return Err(err);
        }

        Ok(())
    }
}
