//! Prometheus endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{error::MetricsError, sensor::Reading};

const TEMPERATURE: &str = "gobot_bme280_temperature_celsius";
const HUMIDITY: &str = "gobot_bme280_humidity_percent";
const PRESSURE: &str = "gobot_bme280_pressure_hpa";
const LAST_READING: &str = "gobot_bme280_last_reading_timestamp_seconds";
const ERRORS: &str = "gobot_bme280_errors_total";

/// Expands a listen address. A bare `:port` listens on all interfaces;
/// host names are resolved when binding.
pub fn listen_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => addr.to_string(),
    }
}

/// Binds the listener for `addr`.
pub async fn bind(addr: &str) -> Result<TcpListener, MetricsError> {
    TcpListener::bind(listen_addr(addr))
        .await
        .map_err(|source| MetricsError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Installs the global Prometheus recorder.
///
/// Must be called once, before anything is recorded.
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Recorder(e.to_string()))
}

/// Records every channel of `reading`.
pub fn record_reading(placement: &str, reading: &Reading) {
    let placement = placement.to_string();

    gauge!(TEMPERATURE, "placement" => placement.clone()).set(reading.temperature_c);
    if let Some(humidity) = reading.humidity_pct {
        gauge!(HUMIDITY, "placement" => placement.clone()).set(humidity);
    }
    gauge!(PRESSURE, "placement" => placement.clone()).set(reading.pressure_hpa);
    gauge!(LAST_READING, "placement" => placement).set(reading.timestamp as f64);
}

pub fn record_error(kind: &'static str) {
    counter!(ERRORS, "type" => kind).increment(1);
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}

pub fn router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(handle)
}

/// Serves `/metrics` on `listener` until `cancel` fires.
pub async fn serve_on(
    listener: TcpListener,
    handle: PrometheusHandle,
    cancel: CancellationToken,
) -> Result<(), MetricsError> {
    info!("Metrics endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router(handle))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    Ok(())
}
