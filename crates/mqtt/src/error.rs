//! Error type for MQTT transport operations.
//!
//! **Configuration errors** (caught at startup):
//! - `InvalidBrokerUrl`: the broker address cannot be parsed
//! - `ClientSetup`: TLS material missing or inconsistent
//! - `Io`: certificate files could not be read
//!
//! **Runtime errors**:
//! - `Serialization`: payload could not be encoded
//! - `ClientTransfer`: the publish request could not be queued (queue full
//!   while the broker is unreachable, or the event loop is gone)

use thiserror::Error;

/// The unified error type for MQTT transport operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The broker address is malformed (unknown scheme, bad port, empty host).
    #[error("Invalid broker url '{url}': {reason}")]
    InvalidBrokerUrl { url: String, reason: String },

    /// MQTT client initialization failed.
    ///
    /// Typically TLS material that is referenced but unusable. The daemon
    /// refuses to start in that case.
    #[error("Client setup error: {0}")]
    ClientSetup(String),

    /// Payload serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The local client could not queue a request (event loop gone, channel full).
    #[error("Client transfer error: {0}")]
    ClientTransfer(#[from] rumqttc::ClientError),

    /// I/O failure outside the network, e.g. reading a certificate file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
