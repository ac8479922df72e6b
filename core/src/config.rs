//! Client configuration: where the API lives and how long to wait for it.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::transport::DEFAULT_TIMEOUT;

/// Public cartes.io API root.
pub const DEFAULT_BASE_URL: &str = "https://cartes.io/api";

/// Environment variable overriding the API root.
pub const BASE_URL_ENV: &str = "CARTES_BASE_URL";

/// Environment variable overriding the timeout, in seconds.
pub const TIMEOUT_ENV: &str = "CARTES_TIMEOUT";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Configuration for a self-hosted instance at `https://<host>/api`.
    pub fn for_host(host: &str) -> Self {
        Self {
            base_url: format!("https://{}/api", host.trim_end_matches('/')),
            ..Self::default()
        }
    }

    /// Defaults overridden by `CARTES_BASE_URL` and `CARTES_TIMEOUT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(base_url) = env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }
        if let Ok(raw) = env::var(TIMEOUT_ENV) {
            config.timeout = parse_timeout(&raw)?;
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parse a timeout given in (possibly fractional) seconds.
pub fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ConfigError::InvalidTimeout(raw.to_string()))
}
