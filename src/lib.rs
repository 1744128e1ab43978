//! Relay - a two-service gateway/backend pair
//!
//! A backend responder that answers `GET /` with a fixed text, and a gateway
//! forwarder that relays each root request to the backend and prefixes the
//! answer.

pub mod config;
pub mod deploy;
pub mod error;
pub mod http;
pub mod proxy;
pub mod server;
pub mod service;
