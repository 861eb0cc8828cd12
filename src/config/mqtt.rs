//! Broker settings.
//!
//! Keys are flattened into the top-level configuration record, so a file uses
//! `mqtt_host`, `mqtt_topic` and the `ssl_*` paths directly.

use bme280_bot_mqtt::{ClientBuilder, TlsConfig, TransferError};
use serde::{Deserialize, Serialize};
use validator::ValidationError;

/// Default topic. `%s` is replaced by the placement.
pub const DEFAULT_TOPIC: &str = "sensors/bme280/%s";

const KEEP_ALIVE_SECS: u64 = 60;
const REQUEST_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker URL, e.g. `tcp://broker:1883` or `ssl://broker:8883`.
    #[serde(rename = "mqtt_host")]
    pub host: String,

    /// Topic template.
    #[serde(rename = "mqtt_topic")]
    pub topic: String,

    #[serde(rename = "ssl_client_cert_file")]
    pub client_cert_file: String,

    #[serde(rename = "ssl_client_key_file")]
    pub client_key_file: String,

    /// CA bundle used to verify the broker.
    #[serde(rename = "ssl_server_ca_file")]
    pub server_ca_file: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        MqttConfig {
            host: String::new(),
            topic: DEFAULT_TOPIC.to_string(),
            client_cert_file: String::new(),
            client_key_file: String::new(),
            server_ca_file: String::new(),
        }
    }
}

impl MqttConfig {
    /// True when client certificate authentication is configured.
    pub fn uses_ssl_certs(&self) -> bool {
        !self.client_cert_file.is_empty() && !self.client_key_file.is_empty()
    }

    /// Expands the topic template for `placement`.
    pub fn topic_for(&self, placement: &str) -> String {
        self.topic.replace("%s", placement)
    }

    pub fn tls_config(&self) -> TlsConfig {
        TlsConfig::from_paths(
            &self.server_ca_file,
            &self.client_cert_file,
            &self.client_key_file,
        )
    }

    /// Prepares a client for the configured broker.
    ///
    /// Certificates are attached when configured; whether TLS is used is
    /// decided by the broker scheme and the presence of client auth.
    pub fn client_builder(&self, client_id: &str) -> Result<ClientBuilder, TransferError> {
        let builder = ClientBuilder::from_url(client_id, &self.host, REQUEST_CAPACITY)?
            .keep_alive(KEEP_ALIVE_SECS);

        Ok(builder.with_tls(self.tls_config()))
    }

    /// Checks the broker settings. Only called while publishing is enabled.
    pub fn validate_config(&self) -> Result<(), ValidationError> {
        if self.host.is_empty() {
            let mut err = ValidationError::new("empty_mqtt_host");
            err.message = Some("empty mqtt host provided".into());
            return Err(err);
        }

        if self.topic.is_empty() {
            let mut err = ValidationError::new("empty_mqtt_topic");
            err.message = Some("empty mqtt topic provided".into());
            return Err(err);
        }

        if self.client_cert_file.is_empty() != self.client_key_file.is_empty() {
            let missing = if self.client_key_file.is_empty() {
                "ssl_client_key_file"
            } else {
                "ssl_client_cert_file"
            };
            let mut err = ValidationError::new("incomplete_client_auth");
            err.message = Some(
                format!(
                    "client certificate and key must be provided together, {} is missing",
                    missing
                )
                .into(),
            );
            return Err(err);
        }

        if !self.server_ca_file.is_empty() && !self.uses_ssl_certs() {
            let mut err = ValidationError::new("server_ca_without_client_auth");
            err.message = Some(
                "ssl_server_ca_file requires ssl_client_cert_file and ssl_client_key_file".into(),
            );
            return Err(err);
        }

        Ok(())
    }
}
