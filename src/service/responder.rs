use std::future::Future;

use crate::config::ResponderConfig;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::Handler;
use crate::service::root_only;

/// The backend responder: answers the root path with a fixed text.
#[derive(Debug, Clone)]
pub struct Responder {
    message: String,
}

impl Responder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn from_config(config: &ResponderConfig) -> Self {
        Self::new(config.message.clone())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn respond(&self, request: &Request) -> Response {
        if let Some(rejection) = root_only(request) {
            return rejection;
        }
        Response::ok(self.message.as_bytes())
    }
}

impl Handler for Responder {
    fn handle(&self, request: &Request) -> impl Future<Output = Response> + Send {
        std::future::ready(self.respond(request))
    }
}
