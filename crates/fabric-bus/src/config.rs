//! Transport configuration, validated at construction.

use std::env;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Endpoint used when `SF_ENDPOINT` is unset.
pub const DEFAULT_ENDPOINT: &str = "https://localhost:50051";

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Endpoint is empty, has no scheme, or disagrees with the security mode
    #[error("Invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint {
        /// Offending endpoint
        endpoint: String,
        /// What is wrong with it
        reason: String,
    },

    /// Bearer token is empty or contains whitespace
    #[error("Invalid bearer token: {0}")]
    InvalidToken(String),

    /// PEM material is missing or not PEM
    #[error("Invalid TLS material: {0}")]
    InvalidTls(String),

    /// Required setting absent
    #[error("Missing setting: {0}")]
    Missing(&'static str),

    /// A referenced file could not be read
    #[error("Failed to read {path}: {reason}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        reason: String,
    },
}

/// Channel security mode.
#[derive(Clone, PartialEq, Eq)]
pub enum TransportSecurity {
    /// No channel security; only valid with `http://` endpoints
    Plaintext,
    /// Mutual TLS with PEM-encoded material
    MutualTls {
        /// CA bundle used to verify the server
        ca_pem: Vec<u8>,
        /// Client certificate chain
        client_cert_pem: Vec<u8>,
        /// Client private key
        client_key_pem: Vec<u8>,
    },
}

impl TransportSecurity {
    /// Mutual TLS from PEM blocks; each must be non-empty PEM.
    pub fn mutual_tls(
        ca_pem: impl Into<Vec<u8>>,
        client_cert_pem: impl Into<Vec<u8>>,
        client_key_pem: impl Into<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        let security = Self::MutualTls {
            ca_pem: ca_pem.into(),
            client_cert_pem: client_cert_pem.into(),
            client_key_pem: client_key_pem.into(),
        };
        security.validate()?;
        Ok(security)
    }

    /// True for [`MutualTls`](Self::MutualTls).
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::MutualTls { .. })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Self::MutualTls {
            ca_pem,
            client_cert_pem,
            client_key_pem,
        } = self
        {
            check_pem("ca", ca_pem)?;
            check_pem("client_cert", client_cert_pem)?;
            check_pem("client_key", client_key_pem)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TransportSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plaintext => f.write_str("Plaintext"),
            Self::MutualTls {
                ca_pem,
                client_cert_pem,
                ..
            } => f
                .debug_struct("MutualTls")
                .field("ca_pem_len", &ca_pem.len())
                .field("client_cert_pem_len", &client_cert_pem.len())
                .finish_non_exhaustive(),
        }
    }
}

fn check_pem(name: &str, pem: &[u8]) -> Result<(), ConfigError> {
    if pem.iter().all(u8::is_ascii_whitespace) {
        return Err(ConfigError::InvalidTls(format!("{name} is empty")));
    }
    if !pem.windows(11).any(|w| w == b"-----BEGIN ") {
        return Err(ConfigError::InvalidTls(format!("{name} is not PEM encoded")));
    }
    Ok(())
}

/// Connection settings for a SecureFabric transport.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportConfig {
    endpoint: String,
    bearer_token: String,
    security: TransportSecurity,
}

impl TransportConfig {
    /// Validate and build.
    ///
    /// # Errors
    ///
    /// - `InvalidEndpoint` unless the endpoint is `http://host...` with
    ///   `Plaintext` or `https://host...` with `MutualTls`
    /// - `InvalidToken` for an empty token or one containing whitespace
    /// - `InvalidTls` for empty or non-PEM material
    pub fn new(
        endpoint: impl Into<String>,
        bearer_token: impl Into<String>,
        security: TransportSecurity,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        let bearer_token = bearer_token.into();

        let invalid = |reason: &str| ConfigError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: reason.to_string(),
        };
        let (tls, host) = if let Some(host) = endpoint.strip_prefix("https://") {
            (true, host)
        } else if let Some(host) = endpoint.strip_prefix("http://") {
            (false, host)
        } else {
            return Err(invalid("scheme must be http:// or https://"));
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        match (tls, security.is_tls()) {
            (true, false) => return Err(invalid("https endpoint requires TLS material")),
            (false, true) => return Err(invalid("TLS material given for an http endpoint")),
            _ => {}
        }

        if bearer_token.is_empty() {
            return Err(ConfigError::InvalidToken("token is empty".to_string()));
        }
        if bearer_token.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidToken(
                "token contains whitespace".to_string(),
            ));
        }
        security.validate()?;

        Ok(Self {
            endpoint,
            bearer_token,
            security,
        })
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SF_ENDPOINT`: Endpoint (default: https://localhost:50051)
    /// - `SF_TOKEN`: Bearer token (required)
    /// - `SF_CA_CERT`, `SF_CLIENT_CERT`, `SF_CLIENT_KEY`: PEM file paths;
    ///   all three or none
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = lookup("SF_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let token = lookup("SF_TOKEN").ok_or(ConfigError::Missing("SF_TOKEN"))?;

        let paths = (
            lookup("SF_CA_CERT"),
            lookup("SF_CLIENT_CERT"),
            lookup("SF_CLIENT_KEY"),
        );
        let security = match paths {
            (None, None, None) => TransportSecurity::Plaintext,
            (Some(ca), Some(cert), Some(key)) => {
                TransportSecurity::mutual_tls(read_file(&ca)?, read_file(&cert)?, read_file(&key)?)?
            }
            (None, _, _) => return Err(ConfigError::Missing("SF_CA_CERT")),
            (_, None, _) => return Err(ConfigError::Missing("SF_CLIENT_CERT")),
            (_, _, None) => return Err(ConfigError::Missing("SF_CLIENT_KEY")),
        };

        Self::new(endpoint, token, security)
    }

    /// Endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Bearer token.
    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    /// Channel security.
    pub fn security(&self) -> &TransportSecurity {
        &self.security
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("endpoint", &self.endpoint)
            .field("bearer_token", &"<redacted>")
            .field("security", &self.security)
            .finish()
    }
}

fn read_file(path: &str) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(Path::new(path)).map_err(|e| ConfigError::Io {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
