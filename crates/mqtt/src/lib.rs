//! # bme280-bot-mqtt: MQTT transport for the BME280 sensor daemon
//!
//! A thin layer over `rumqttc` that adds:
//!
//! - **Broker URLs** (`tcp://`, `ssl://`, `mqtts://`, ...) with default ports
//! - **TLS** with a server CA and client certificate authentication
//! - **Automatic reconnection** with exponential backoff
//! - **JSON publishing** of any `serde::Serialize` value
//!
//! ```ignore
//! let cancel = CancellationToken::new();
//! let builder = ClientBuilder::from_url("gobot_bme280_garage", "tcp://broker:1883", 10)?
//!     .keep_alive(60);
//! let (publisher, driver) = Publisher::start(builder, cancel.clone())?;
//! publisher.publish_json("sensors/bme280/garage", &reading).await?;
//! ```

pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
pub mod publisher;

pub use backoff::Backoff;
pub use client::ClientBuilder;
pub use config::{BrokerUrl, TlsConfig};
pub use error::TransferError;
pub use publisher::Publisher;
pub use tokio_util::sync::CancellationToken;
