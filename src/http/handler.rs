use std::future::Future;
use std::sync::Arc;

use crate::http::request::Request;
use crate::http::response::Response;

/// Turns one parsed request into one response.
///
/// Handlers are shared by every connection task, so they must be
/// `Send + Sync` and the returned future must be `Send`. Failures are
/// expressed as error responses, never as `Err`.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request) -> impl Future<Output = Response> + Send;
}

impl<H: Handler> Handler for Arc<H> {
    fn handle(&self, request: &Request) -> impl Future<Output = Response> + Send {
        (**self).handle(request)
    }
}
