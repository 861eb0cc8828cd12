use std::{path::PathBuf, process, sync::Arc};

use bme280_bot::{
    config::{self, Config},
    core::{
        executor::{Executor, ExecutorSettings, Publisher},
        metrics,
        sensor::IioSensor,
    },
    logger::LoggerManager,
    print_error,
};
use bme280_bot_mqtt::CancellationToken;
use clap::Parser;
use tracing::{debug, error, info};

/// Reads a BME280 sensor and publishes its readings via MQTT and Prometheus.
#[derive(Parser, Debug)]
#[command(name = "gobot-bme280", version, about)]
struct Cli {
    /// Path to a JSON or TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Binds the metrics listener and spawns the server. A bad address is fatal.
async fn start_metrics(cfg: &Config, cancel: &CancellationToken) {
    let listener = match metrics::bind(&cfg.metrics_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let handle = match metrics::install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = metrics::serve_on(listener, handle, cancel).await {
            error!("{}", e);
        }
    });
}

fn start_publisher(
    cfg: &Config,
    cancel: &CancellationToken,
) -> Option<(bme280_bot_mqtt::Publisher, tokio::task::JoinHandle<()>)> {
    if cfg.disable_mqtt {
        info!("MQTT publishing disabled");
        return None;
    }

    let started = cfg
        .mqtt
        .client_builder(&cfg.client_id())
        .and_then(|builder| {
            info!(
                "Connecting to MQTT broker {} (tls: {})",
                cfg.mqtt.host,
                builder.uses_tls()
            );
            bme280_bot_mqtt::Publisher::start(builder, cancel.clone())
        });

    match started {
        Ok(started) => Some(started),
        Err(e) => {
            error!("Failed to start MQTT client: {}", e);
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = config::read(cli.config.as_deref()).unwrap_or_else(|e| {
        print_error!("Could not load config: {}", e);
        process::exit(1);
    });

    let logger_manager = LoggerManager::new(cfg.logger.clone()).unwrap_or_else(|e| {
        print_error!("Failed to setup Log Manager: {}", e);
        process::exit(1);
    });
    logger_manager.init().unwrap_or_else(|e| {
        print_error!("Failed to init Log Manager: {}", e);
        process::exit(1);
    });
    info!("Starting gobot-bme280 version {}...", env!("CARGO_PKG_VERSION"));
    debug!("{:#?}", cfg);

    let cancel = CancellationToken::new();

    if cfg.metrics_enabled() {
        start_metrics(&cfg, &cancel).await;
    } else {
        info!("Metrics endpoint disabled");
    }

    let mqtt = start_publisher(&cfg, &cancel);
    let publisher = mqtt
        .as_ref()
        .map(|(publisher, _)| Arc::new(publisher.clone()) as Arc<dyn Publisher>);

    let sensor = IioSensor::new(&cfg.sensor);
    info!("Using sensor at {}", sensor.client_dir().display());

    let executor = Executor::new(Arc::new(sensor), publisher, ExecutorSettings::from(&cfg));
    let sampling = tokio::spawn(executor.run(cancel.clone()));

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }
    info!("Received Ctrl+C, initiating graceful shutdown...");

    if let Some((publisher, driver)) = mqtt {
        publisher.shutdown().await;
        if let Err(e) = driver.await {
            debug!("MQTT driver ended abnormally: {}", e);
        }
    }
    cancel.cancel();
    if let Err(e) = sampling.await {
        debug!("Sampling task ended abnormally: {}", e);
    }

    info!("Shutdown complete");
}
