//! The gateway's single upstream.
//!
//! The backend address is static: resolution, health and replica selection
//! belong to the orchestrator's network, so a backend here is just a
//! validated URL.

use url::Url;

use crate::config::BackendConfig;
use crate::error::UpstreamError;

#[derive(Debug, Clone)]
pub struct Backend {
    /// Parsed backend URL (e.g. "http://backend:5000/")
    pub url: Url,

    /// Optional backend name for logging
    pub name: Option<String>,

    host: String,
    port: u16,
}

impl Backend {
    /// Create a backend from configuration. Only plain `http` URLs with a
    /// host are accepted.
    pub fn new(config: BackendConfig) -> Result<Self, UpstreamError> {
        let invalid = |reason: &str| UpstreamError::InvalidUrl {
            url: config.url.clone(),
            reason: reason.to_string(),
        };

        let url = Url::parse(&config.url).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid("only the http scheme is supported"));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);

        Ok(Self {
            url,
            name: config.name,
            host,
            port,
        })
    }

    /// Get a display name for the backend (name or URL)
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.url.as_str())
    }

    /// `host:port` to connect to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value for the outbound `Host` header; the port is only included when
    /// the URL names one explicitly.
    pub fn host_header(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Request target on the backend, including any query string.
    pub fn request_target(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }
}
