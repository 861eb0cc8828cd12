//! Sampling and publishing executor.
//!
//! The `Executor` reads the sensor once per interval, records the reading as
//! metrics and hands it to the configured publisher. Failures are logged and
//! counted; the loop keeps running until cancelled.

use std::{sync::Arc, time::Duration};

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{
    metrics,
    sensor::{Reading, Sensor},
};
use crate::config::{Config, DEFAULT_INTERVAL_SECONDS};

/// Trait for publishers that can send readings to an external system.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes `reading` to `topic`.
    async fn publish(
        &self,
        topic: &str,
        reading: &Reading,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait::async_trait]
impl Publisher for bme280_bot_mqtt::Publisher {
    async fn publish(
        &self,
        topic: &str,
        reading: &Reading,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.publish_json(topic, reading)
            .await
            .map_err(|e| Box::new(e) as _)
    }
}

/// The parts of [`Config`] the executor needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub placement: String,
    pub interval: Duration,
    pub log_sensor: bool,
    /// Fully expanded topic.
    pub topic: String,
}

/// Built from a validated [`Config`], whose interval is always in range. A
/// negative interval falls back to the default.
impl From<&Config> for ExecutorSettings {
    fn from(config: &Config) -> Self {
        let interval_s = u64::try_from(config.interval_s)
            .unwrap_or(DEFAULT_INTERVAL_SECONDS.unsigned_abs());
        Self {
            placement: config.placement.clone(),
            interval: Duration::from_secs(interval_s),
            log_sensor: config.log_sensor,
            topic: config.mqtt.topic_for(&config.placement),
        }
    }
}

pub struct Executor {
    sensor: Arc<dyn Sensor>,
    publisher: Option<Arc<dyn Publisher>>,
    settings: ExecutorSettings,
}

impl Executor {
    /// Creates a new executor. Without a publisher readings are only logged
    /// and recorded.
    pub fn new(
        sensor: Arc<dyn Sensor>,
        publisher: Option<Arc<dyn Publisher>>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            sensor,
            publisher,
            settings,
        }
    }

    /// Runs until `cancel` fires. The first reading is taken immediately.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Sampling started (placement: {}, interval: {}s, publishing: {})",
            self.settings.placement,
            self.settings.interval.as_secs(),
            self.publisher.is_some()
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Sampling stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// Takes and distributes a single reading.
    ///
    /// Returns the reading if the sensor could be read, even when publishing failed.
    pub async fn tick(&self) -> Option<Reading> {
        let reading = match self.sensor.read().await {
            Ok(reading) => reading,
            Err(e) => {
                error!("Failed to read sensor: {}", e);
                metrics::record_error(e.kind());
                return None;
            }
        };

        if self.settings.log_sensor {
            info!(
                "temperature={:.2}°C humidity={} pressure={:.2}hPa",
                reading.temperature_c,
                reading
                    .humidity_pct
                    .map_or_else(|| "n/a".to_string(), |h| format!("{:.2}%", h)),
                reading.pressure_hpa
            );
        }

        metrics::record_reading(&self.settings.placement, &reading);

        if let Some(publisher) = &self.publisher {
            match publisher.publish(&self.settings.topic, &reading).await {
                Ok(()) => debug!("Published reading to '{}'", self.settings.topic),
                Err(e) => {
                    error!("Publish failed for '{}': {}", self.settings.topic, e);
                    metrics::record_error("publish");
                }
            }
        }

        Some(reading)
    }
}
