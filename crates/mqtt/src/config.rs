//! Broker address and TLS settings.
//!
//! The broker is addressed with a URL in the style used by most MQTT tooling:
//!
//! | form                   | transport | default port |
//! |------------------------|-----------|--------------|
//! | `tcp://host:1883`      | plain     | 1883         |
//! | `mqtt://host`          | plain     | 1883         |
//! | `ssl://host:8883`      | TLS       | 8883         |
//! | `tls://`, `tcps://`, `mqtts://` | TLS | 8883       |
//! | `host[:port]`          | plain     | 1883         |

use std::{fmt, path::Path};

use crate::error::TransferError;

/// Default port for unencrypted MQTT.
pub const DEFAULT_PORT: u16 = 1883;

/// Default port for MQTT over TLS.
pub const DEFAULT_TLS_PORT: u16 = 8883;

/// CA bundle used when TLS is requested without an explicit server CA.
pub const SYSTEM_CA_BUNDLE: &str = "/etc/ssl/certs/ca-certificates.crt";

/// A parsed broker address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerUrl {
    pub host: String,
    pub port: u16,
    /// Whether the scheme asks for TLS.
    pub secure: bool,
}

impl BrokerUrl {
    /// Parses a broker address such as `tcp://broker.local:1883`.
    pub fn parse(url: &str) -> Result<Self, TransferError> {
        let invalid = |reason: String| TransferError::InvalidBrokerUrl {
            url: url.to_string(),
            reason,
        };

        let trimmed = url.trim();
        let (secure, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
                "tcp" | "mqtt" => (false, rest),
                "ssl" | "tls" | "tcps" | "mqtts" => (true, rest),
                other => return Err(invalid(format!("unsupported scheme '{other}'"))),
            },
            None => (false, trimmed),
        };

        // Anything after the authority (a path) carries no meaning for MQTT.
        let authority = rest.split('/').next().unwrap_or_default();
        if authority.is_empty() {
            return Err(invalid("missing host".to_string()));
        }

        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unterminated IPv6 address".to_string()))?;
            (host, tail.strip_prefix(':'))
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("missing host".to_string()));
        }

        let port = match port {
            Some(port) => match port.parse::<u16>() {
                Ok(0) | Err(_) => return Err(invalid(format!("invalid port '{port}'"))),
                Ok(port) => port,
            },
            None if secure => DEFAULT_TLS_PORT,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: host.to_string(),
            port,
            secure,
        })
    }
}

impl fmt::Display for BrokerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "ssl" } else { "tcp" };
        if self.host.contains(':') {
            write!(f, "{scheme}://[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{scheme}://{}:{}", self.host, self.port)
        }
    }
}

/// TLS/SSL configuration for secure broker connections.
///
/// Holds paths only. Files are read when [`crate::ClientBuilder::build`] runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the CA certificate used to verify the broker (PEM).
    ///
    /// Falls back to [`SYSTEM_CA_BUNDLE`] when absent.
    pub ca_cert_path: Option<String>,

    /// Path to the client certificate (PEM). Must be paired with `client_key_path`.
    pub client_cert_path: Option<String>,

    /// Path to the unencrypted client private key (PEM).
    pub client_key_path: Option<String>,
}

impl TlsConfig {
    /// Creates a TLS configuration with full mutual authentication.
    pub fn new(
        ca_cert_path: impl Into<String>,
        client_cert_path: impl Into<String>,
        client_key_path: impl Into<String>,
    ) -> Self {
        TlsConfig {
            ca_cert_path: Some(ca_cert_path.into()),
            client_cert_path: Some(client_cert_path.into()),
            client_key_path: Some(client_key_path.into()),
        }
    }

    /// Builds a TLS configuration from possibly-empty path strings.
    ///
    /// Empty strings are treated as unset.
    pub fn from_paths(ca_cert_path: &str, client_cert_path: &str, client_key_path: &str) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        TlsConfig {
            ca_cert_path: non_empty(ca_cert_path),
            client_cert_path: non_empty(client_cert_path),
            client_key_path: non_empty(client_key_path),
        }
    }

    /// Returns true only if both client certificate and key are specified.
    pub fn has_client_auth(&self) -> bool {
        self.client_cert_path.is_some() && self.client_key_path.is_some()
    }

    /// Path of the CA certificate that will be loaded.
    pub fn effective_ca_path(&self) -> &str {
        self.ca_cert_path.as_deref().unwrap_or(SYSTEM_CA_BUNDLE)
    }

    /// Checks that the referenced files exist and that client auth is complete.
    pub fn validate_config(&self) -> Result<(), TransferError> {
        validate_file_path(self.effective_ca_path())?;

        if self.has_client_auth() {
            if let (Some(cert), Some(key)) = (&self.client_cert_path, &self.client_key_path) {
                validate_file_path(cert)?;
                validate_file_path(key)?;
            }
        } else if self.client_cert_path.is_some() || self.client_key_path.is_some() {
            return Err(TransferError::ClientSetup(
                "Both client certificate and key must be provided or neither".into(),
            ));
        }

        Ok(())
    }
}

/// Validates that a path is non-empty and points to an existing regular file.
fn validate_file_path(path: &str) -> Result<(), TransferError> {
    if path.is_empty() {
        return Err(TransferError::ClientSetup(
            "File path cannot be empty".into(),
        ));
    }

    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return Err(TransferError::ClientSetup(format!(
            "File does not exist: {path}"
        )));
    }

    if !path_obj.is_file() {
        return Err(TransferError::ClientSetup(format!(
            "Path is not a file: {path}"
        )));
    }

    Ok(())
}
