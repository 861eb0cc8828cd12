//! bme280-bot — BME280 sensor daemon with MQTT and Prometheus output
//!
//! Reads temperature, humidity and pressure from a BME280 on an I2C bus
//! through the Linux IIO driver, publishes each reading as JSON via MQTT and
//! exposes the latest values on a Prometheus endpoint.
//!
//! ## Modules
//!
//! * `config` — Layered configuration: defaults, an optional JSON/TOML file
//!   and `GOBOT_BME280_*` environment overrides, followed by reporting and
//!   fail-fast validation.
//!
//! * `core` — Runtime components:
//!   - IIO sensor reader
//!   - Sampling executor and publisher abstraction
//!   - Prometheus endpoint
//!
//! * `logger` — Centralized logging initialization using `tracing`.
//!   Supports console output in multiple formats (compact, pretty, JSON)
//!   and optional systemd journald integration.
//!
//! ## Features
//!
//! * `journald` — Enables the systemd journald log output (default: enabled).

pub mod config;
pub mod core;
pub mod logger;
