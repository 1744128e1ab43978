//! Service configuration.
//!
//! Values come from built-in defaults, then an optional YAML file, then
//! environment variables. Each process runs a single role, so `LISTEN`
//! applies to whichever service is started.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_GATEWAY_LISTEN: &str = "0.0.0.0:8080";
pub const DEFAULT_BACKEND_LISTEN: &str = "0.0.0.0:5000";
pub const DEFAULT_BACKEND_URL: &str = "http://backend:5000/";
pub const DEFAULT_PREFIX: &str = "API Gateway: ";
pub const DEFAULT_MESSAGE: &str = "Hello from Backend!";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub backend: ResponderConfig,
}

/// Where the gateway forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    /// Optional name used in logs instead of the URL
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub backend: BackendConfig,
    pub prefix: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_GATEWAY_LISTEN.to_string(),
            backend: BackendConfig::default(),
            prefix: DEFAULT_PREFIX.to_string(),
            connect_timeout_ms: 2_000,
            request_timeout_ms: 10_000,
        }
    }
}

impl GatewayConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    pub listen_addr: String,
    pub message: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_BACKEND_LISTEN.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

impl Config {
    /// Loads the optional YAML file, then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overrides fields from environment variables, looked up through
    /// `lookup` so callers can supply something other than the process env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(listen) = lookup("LISTEN") {
            self.gateway.listen_addr = listen.clone();
            self.backend.listen_addr = listen;
        }
        if let Some(url) = lookup("BACKEND_URL") {
            self.gateway.backend.url = url;
        }
        if let Some(prefix) = lookup("GATEWAY_PREFIX") {
            self.gateway.prefix = prefix;
        }
        if let Some(message) = lookup("BACKEND_MESSAGE") {
            self.backend.message = message;
        }
        if let Some(ms) = lookup("CONNECT_TIMEOUT_MS") {
            self.gateway.connect_timeout_ms = parse_millis("CONNECT_TIMEOUT_MS", ms)?;
        }
        if let Some(ms) = lookup("REQUEST_TIMEOUT_MS") {
            self.gateway.request_timeout_ms = parse_millis("REQUEST_TIMEOUT_MS", ms)?;
        }
        Ok(())
    }
}

fn parse_millis(key: &str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(ms) => Ok(ms),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
            reason: e.to_string(),
        }),
    }
}
