//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from `EASYDONATE_*` environment variables, after
//! loading a `.env` file from the working directory if one exists.

use std::env;
use std::fmt;

use thiserror::Error;
use tracing::warn;

/// Startup configuration problems.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("EASYDONATE_API_KEY is empty; every callback signature would be forgeable")]
    MissingApiKey,
    #[error("HTTPS is enabled but {0} is empty")]
    MissingTlsMaterial(&'static str),
}

/// TLS listener material. Key and certificate hold either a filesystem path or
/// inline PEM.
#[derive(Clone, Default)]
pub struct TlsSettings {
    pub key: String,
    pub cert: String,
    pub passphrase: String,
}

impl fmt::Debug for TlsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsSettings")
            .field("key_set", &!self.key.is_empty())
            .field("cert_set", &!self.cert.is_empty())
            .field("passphrase_set", &!self.passphrase.is_empty())
            .finish()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Shop API key, the HMAC secret
    pub api_key: String,

    /// Host shown in the startup log
    pub host_ip: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Serve HTTPS instead of plain HTTP
    pub use_https: bool,

    pub tls: TlsSettings,
}

impl Config {
    /// Load configuration from the environment, reading `.env` first.
    pub fn load() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "dotenv_load_failed");
            }
        }
        Self::from_env()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            api_key: env::var("EASYDONATE_API_KEY").unwrap_or_default(),

            host_ip: env::var("EASYDONATE_HOST_IP")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "127.0.0.1".to_string()),

            port: env::var("EASYDONATE_HOST_PORT")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .filter(|&p: &u16| p != 0)
                .unwrap_or(80),

            use_https: env::var("EASYDONATE_HOST_USE_HTTPS")
                .map(|v| v == "true")
                .unwrap_or(false),

            tls: TlsSettings {
                key: env::var("EASYDONATE_HOST_KEY").unwrap_or_default(),
                cert: env::var("EASYDONATE_HOST_CERT").unwrap_or_default(),
                passphrase: env::var("EASYDONATE_HOST_PASSPHRASE").unwrap_or_default(),
            },
        }
    }

    /// Fail fast on settings the server cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.use_https {
            if self.tls.key.is_empty() {
                return Err(ConfigError::MissingTlsMaterial("EASYDONATE_HOST_KEY"));
            }
            if self.tls.cert.is_empty() {
                return Err(ConfigError::MissingTlsMaterial("EASYDONATE_HOST_CERT"));
            }
        }
        Ok(())
    }

    /// URL announced once the listener is up.
    pub fn public_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host_ip, self.port)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("host_ip", &self.host_ip)
            .field("port", &self.port)
            .field("use_https", &self.use_https)
            .field("tls", &self.tls)
            .finish()
    }
}
