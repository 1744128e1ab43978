//! Error types.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single gateway → backend exchange.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Backend URL could not be used
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// TCP connect did not finish in time
    #[error("connecting to {addr} timed out after {after:?}")]
    ConnectTimeout { addr: String, after: Duration },

    /// TCP connect failed (refused, unresolvable, unreachable)
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Request written but the full response did not arrive in time
    #[error("backend did not respond within {0:?}")]
    ResponseTimeout(Duration),

    /// I/O failure after the connection was established
    #[error("I/O error talking to backend: {0}")]
    Io(#[from] io::Error),

    /// Response could not be parsed
    #[error("malformed response from backend: {0}")]
    Malformed(String),

    /// Backend answered, but not with 2xx
    #[error("backend answered with status {0}")]
    Status(u16),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            UpstreamError::ConnectTimeout { .. } | UpstreamError::ResponseTimeout(_)
        )
    }
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Deployment descriptor errors.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("failed to read stack file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse stack file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("stack defines no services")]
    NoServices,

    #[error("service '{service}' has an empty image reference")]
    EmptyImage { service: String },

    #[error("service '{service}' joins undeclared network '{network}'")]
    UnknownNetwork { service: String, network: String },

    #[error("service '{service}' has invalid port mapping '{spec}'")]
    InvalidPort { service: String, spec: String },

    #[error("published port {port} is used by both '{first}' and '{second}'")]
    DuplicatePort {
        port: u16,
        first: String,
        second: String,
    },

    #[error("service '{service}' depends on unknown service '{dependency}'")]
    UnknownDependency { service: String, dependency: String },
}
