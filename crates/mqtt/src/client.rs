//! MQTT client builder with TLS support.
//!
//! `ClientBuilder` wraps rumqttc's `MqttOptions` and produces the
//! `AsyncClient` / `EventLoop` pair.
//!
//! ```ignore
//! let (client, event_loop) = ClientBuilder::from_url("gobot_bme280_garage", "ssl://broker:8883", 10)?
//!     .with_tls(TlsConfig::new("/etc/mqtt/ca.crt", "/etc/mqtt/client.crt", "/etc/mqtt/client.key"))
//!     .build()?;
//! ```

use std::{fs, time::Duration};

use rumqttc::{AsyncClient, EventLoop, MqttOptions, TlsConfiguration, Transport};
use tracing::debug;

use super::{
    config::{BrokerUrl, TlsConfig},
    error::TransferError,
};

/// Builder for constructing MQTT clients.
///
/// Consumed by `build()`, which returns the client and its event loop. The
/// event loop must be polled for the client to make progress.
pub struct ClientBuilder {
    /// MQTT protocol options (host, port, keep-alive, ...)
    opts: MqttOptions,

    /// Capacity of the internal request channel.
    cap: usize,

    /// Whether the broker address asked for TLS.
    secure: bool,

    /// Optional TLS configuration (paths to certificates)
    tls_config: Option<TlsConfig>,
}

impl ClientBuilder {
    /// Creates a builder for a plain TCP connection.
    pub fn new(client_id: impl Into<String>, host: impl Into<String>, port: u16, cap: usize) -> Self {
        Self {
            opts: MqttOptions::new(client_id, host, port),
            cap,
            secure: false,
            tls_config: None,
        }
    }

    /// Creates a builder from a broker URL such as `tcp://broker:1883`.
    pub fn from_url(
        client_id: impl Into<String>,
        url: &str,
        cap: usize,
    ) -> Result<Self, TransferError> {
        let broker = BrokerUrl::parse(url)?;
        debug!("Broker address resolved to {}", broker);

        let mut builder = Self::new(client_id, broker.host, broker.port, cap);
        builder.secure = broker.secure;
        Ok(builder)
    }

    /// Sets the keep-alive interval in seconds.
    pub fn keep_alive(mut self, secs: u64) -> Self {
        self.opts.set_keep_alive(Duration::from_secs(secs));
        self
    }

    /// Attaches TLS material.
    ///
    /// TLS is used when the broker URL is secure or when the configuration
    /// carries client certificates.
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls_config = Some(tls);
        self
    }

    /// Whether `build()` will set up a TLS transport.
    pub fn uses_tls(&self) -> bool {
        self.secure
            || self
                .tls_config
                .as_ref()
                .is_some_and(|tls| tls.has_client_auth())
    }

    fn load_file(path: &str) -> Result<Vec<u8>, TransferError> {
        Ok(fs::read(path)?)
    }

    /// Builds the TLS transport by loading certificates from disk.
    fn build_tls_transport(&self) -> Result<Transport, TransferError> {
        let tls_config = self.tls_config.clone().unwrap_or_default();

        tls_config
            .validate_config()
            .map_err(|e| TransferError::ClientSetup(format!("Invalid TLS configuration: {}", e)))?;

        let ca = Self::load_file(tls_config.effective_ca_path())?;

        let client_auth = match (&tls_config.client_cert_path, &tls_config.client_key_path) {
            (Some(cert), Some(key)) => Some((Self::load_file(cert)?, Self::load_file(key)?)),
            _ => None,
        };

        Ok(Transport::Tls(TlsConfiguration::Simple {
            ca,
            client_auth,
            alpn: None,
        }))
    }

    /// Constructs the MQTT client and event loop.
    pub fn build(self) -> Result<(AsyncClient, EventLoop), TransferError> {
        let transport = if self.uses_tls() {
            self.build_tls_transport()?
        } else {
            Transport::Tcp
        };

        let mut opts = self.opts;
        opts.set_transport(transport);

        Ok(AsyncClient::new(opts, self.cap))
    }
}
