//! Accept-time access gate and duplex message channels for a
//! single-connection protocol listener.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;
pub mod session;

pub use config::GateConfig;
pub use lifecycle::Shutdown;
pub use net::{open_channels, AccessDecision, ConnectionValidator, TransportEndpoint};
pub use server::GateServer;
