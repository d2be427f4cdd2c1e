//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted TCP connection or inherited stdio
//!     → endpoint.rs (descriptors, local/peer address lookup)
//!     → validator.rs (class-C access decision)
//!     → channel.rs (inbound/outbound message streams over transport.rs)
//!     → Hand off to session layer
//!
//! listener.rs bounds concurrent accepts; connection.rs tracks live sessions.
//! ```
//!
//! # Design Decisions
//! - Rejection happens before any stream is built
//! - Stream construction never re-rejects; failed sides are left unset

pub mod channel;
pub mod connection;
pub mod endpoint;
pub mod listener;
pub mod transport;
pub mod validator;

pub use channel::{open_channels, ChannelError, InboundStream, MessageStreams, OutboundStream};
pub use endpoint::{AddressSource, EndpointAddress, ResolveError, TransportEndpoint};
pub use transport::Transport;
pub use validator::{
    evaluate, AcceptBasis, AccessDecision, ConnectionValidator, RejectReason, CLASS_C_NETWORK_MASK,
};
