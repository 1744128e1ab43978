//! Request handlers for the two services.
//!
//! Both services expose exactly one resource, the root path. [`root_only`]
//! applies that routing rule so the handlers only deal with the happy path.

pub mod responder;

pub use responder::Responder;

use crate::http::request::{Method, Request};
use crate::http::response::Response;

/// Methods served on `/`.
pub const ALLOWED_METHODS: &str = "GET, HEAD";

/// Returns the response to send instead when `request` is not a GET or HEAD
/// of the root path. The query string is ignored.
pub fn root_only(request: &Request) -> Option<Response> {
    if request.route_path() != "/" {
        return Some(Response::not_found());
    }

    match request.method {
        Method::GET | Method::HEAD => None,
        _ => Some(Response::method_not_allowed(ALLOWED_METHODS)),
    }
}
