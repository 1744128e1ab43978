use std::future::Future;

use crate::config::GatewayConfig;
use crate::error::UpstreamError;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::Handler;
use crate::proxy::backend::Backend;
use crate::proxy::upstream::ProxyHandler;
use crate::service::root_only;

const USER_AGENT: &str = concat!("relay-gateway/", env!("CARGO_PKG_VERSION"));

/// The gateway forwarder.
///
/// Every root request triggers one `GET` to the backend. A 2xx answer is
/// returned as `prefix + body`; anything else becomes 502, or 504 when the
/// backend timed out.
#[derive(Debug, Clone)]
pub struct Gateway {
    proxy: ProxyHandler,
    prefix: String,
}

impl Gateway {
    pub fn new(proxy: ProxyHandler, prefix: impl Into<String>) -> Self {
        Self {
            proxy,
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        let backend = Backend::new(config.backend.clone())?;
        let proxy = ProxyHandler::new(backend, config.connect_timeout(), config.request_timeout());
        Ok(Self::new(proxy, config.prefix.clone()))
    }

    pub fn backend(&self) -> &Backend {
        self.proxy.backend()
    }

    /// Fetches the backend's text. Non-2xx answers are errors.
    pub async fn forward(&self) -> Result<String, UpstreamError> {
        let response = self.proxy.fetch(&self.upstream_request()).await?;
        if !response.is_success() {
            return Err(UpstreamError::Status(response.status));
        }
        Ok(response.text())
    }

    pub async fn respond(&self, request: &Request) -> Response {
        if let Some(rejection) = root_only(request) {
            return rejection;
        }

        match self.forward().await {
            Ok(text) => Response::ok(format!("{}{}", self.prefix, text)),
            Err(e) => {
                tracing::warn!(
                    backend = self.backend().display_name(),
                    method = %request.method,
                    path = %request.path,
                    error = %e,
                    "Backend request failed"
                );
                failure_response(&e)
            }
        }
    }

    fn upstream_request(&self) -> Request {
        Request {
            method: Method::GET,
            path: self.backend().request_target(),
            version: "HTTP/1.1".to_string(),
            headers: [
                ("User-Agent".to_string(), USER_AGENT.to_string()),
                ("Accept".to_string(), "text/plain, */*".to_string()),
            ]
            .into_iter()
            .collect(),
            body: Vec::new(),
        }
    }
}

/// Maps a failed exchange to the response the client sees.
pub fn failure_response(error: &UpstreamError) -> Response {
    if error.is_timeout() {
        Response::gateway_timeout()
    } else {
        Response::bad_gateway()
    }
}

impl Handler for Gateway {
    fn handle(&self, request: &Request) -> impl Future<Output = Response> + Send {
        self.respond(request)
    }
}
