//! Gateway forwarding
//!
//! The gateway relays each root request to one statically configured
//! backend and reshapes the answer.

pub mod backend;
pub mod gateway;
pub mod upstream;

pub use backend::Backend;
pub use gateway::Gateway;
pub use upstream::{ProxyHandler, UpstreamResponse};
