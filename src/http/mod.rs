//! HTTP/1.1 server side used by both services.
//!
//! - **`connection`**: per-connection request/response state machine
//! - **`handler`**: the [`Handler`] seam each service implements
//! - **`parser`**: request, header and chunked-body parsing
//! - **`request`** / **`response`**: message types and builders
//! - **`writer`**: response serialization
//!
//! ```text
//!   Reading ──request──▶ Processing ──response──▶ Writing
//!      ▲                                            │
//!      └──────────────── keep-alive ────────────────┤
//!                                                   └─ close ─▶ Closed
//! ```
//!
//! A malformed request gets a `400` and the connection is closed.

pub mod connection;
pub mod handler;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use handler::Handler;
