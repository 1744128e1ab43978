//! TCP accept loop shared by the backend responder and the gateway.

pub mod listener;
pub mod shutdown;

pub use listener::{bind, run, serve, serve_with_shutdown, DRAIN_TIMEOUT};
pub use shutdown::{shutdown_signal, wait_for_shutdown};
