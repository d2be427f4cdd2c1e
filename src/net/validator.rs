//! Accept-time access control.
//!
//! # Responsibilities
//! - Classify the transport (file/pipe, IPv4 socket, other socket)
//! - Decide accept/reject from the local and peer IPv4 addresses
//! - Emit decision lines when the configured [`LogLevel`] asks for them
//!
//! # Rule
//! ```text
//! local not a socket           → Accept (offline replay, local testing)
//! local lookup fails           → Reject
//! local not IPv4               → Reject
//! peer lookup fails            → Reject
//! peer not IPv4                → Reject
//! local & mask == peer & mask  → Accept, else Reject
//! ```
//!
//! The mask is the classful class-C network portion: only the top 24 bits
//! of each address take part. This is a coarse "same network" heuristic,
//! not a CIDR check.

use std::net::Ipv4Addr;

use thiserror::Error;

use crate::config::LogLevel;
use crate::net::endpoint::{AddressSource, EndpointAddress, ResolveError};

/// Network portion of a class-C IPv4 address (host byte order).
pub const CLASS_C_NETWORK_MASK: u32 = 0xFFFF_FF00;

/// Why a connection was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptBasis {
    /// The transport is a file or pipe, which is always trusted.
    LocalTransport,
    /// Peer and local address share the class-C network.
    SameNetwork,
}

/// Why a connection was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("unable to determine local address")]
    LocalAddressUnavailable,

    #[error("connection is not from the expected network family")]
    UnsupportedFamily,

    #[error("unable to determine peer address")]
    PeerAddressUnavailable,

    #[error("peer network prefix differs from local network prefix")]
    NetworkPrefixMismatch,
}

/// Outcome of [`ConnectionValidator::validate`]. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Accept(AcceptBasis),
    Reject(RejectReason),
}

impl AccessDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AccessDecision::Accept(_))
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            AccessDecision::Accept(_) => None,
            AccessDecision::Reject(reason) => Some(*reason),
        }
    }

    /// Word used in decision lines and metric labels.
    pub fn verdict(&self) -> &'static str {
        if self.is_accepted() {
            "accepted"
        } else {
            "refused"
        }
    }
}

/// True when both addresses fall in the same class-C network.
pub fn same_class_c_network(a: Ipv4Addr, b: Ipv4Addr) -> bool {
    u32::from(a) & CLASS_C_NETWORK_MASK == u32::from(b) & CLASS_C_NETWORK_MASK
}

/// Pure decision over two resolved addresses.
pub fn evaluate(local: EndpointAddress, peer: EndpointAddress) -> AccessDecision {
    let local = match local {
        EndpointAddress::NotNetworked => {
            return AccessDecision::Accept(AcceptBasis::LocalTransport);
        }
        EndpointAddress::OtherFamily => {
            return AccessDecision::Reject(RejectReason::UnsupportedFamily);
        }
        EndpointAddress::Ipv4(addr) => addr,
    };
    let EndpointAddress::Ipv4(peer) = peer else {
        return AccessDecision::Reject(RejectReason::UnsupportedFamily);
    };

    if same_class_c_network(local, peer) {
        AccessDecision::Accept(AcceptBasis::SameNetwork)
    } else {
        AccessDecision::Reject(RejectReason::NetworkPrefixMismatch)
    }
}

/// Decides whether an accepted transport may proceed.
///
/// Holds no state besides the injected log level, so one validator can be
/// shared by every connection task.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionValidator {
    log_level: LogLevel,
}

impl ConnectionValidator {
    pub fn new(log_level: LogLevel) -> Self {
        Self { log_level }
    }

    /// Resolve both sides of `endpoint` and apply the class-C rule.
    ///
    /// The peer is never looked up for non-socket transports.
    pub fn validate<S>(&self, endpoint: &S) -> AccessDecision
    where
        S: AddressSource + ?Sized,
    {
        let local = match endpoint.local_address() {
            Ok(EndpointAddress::NotNetworked) => {
                if self.log_level >= LogLevel::High {
                    tracing::info!("Transport is not a socket, skipping address check");
                }
                return AccessDecision::Accept(AcceptBasis::LocalTransport);
            }
            Ok(EndpointAddress::OtherFamily) => {
                self.report("Connection is not from the network.", None);
                return AccessDecision::Reject(RejectReason::UnsupportedFamily);
            }
            Ok(local) => local,
            Err(err) => {
                self.report("Unable to get our own host address.", Some(err));
                return AccessDecision::Reject(RejectReason::LocalAddressUnavailable);
            }
        };

        let peer = match endpoint.peer_address() {
            Ok(EndpointAddress::Ipv4(peer)) => peer,
            Ok(_) => {
                self.report("Connection is not from the network.", None);
                return AccessDecision::Reject(RejectReason::UnsupportedFamily);
            }
            Err(err) => {
                self.report("Unable to check connection source.", Some(err));
                return AccessDecision::Reject(RejectReason::PeerAddressUnavailable);
            }
        };

        let decision = evaluate(local, EndpointAddress::Ipv4(peer));

        if self.log_level >= LogLevel::Low {
            tracing::info!(
                peer = %peer,
                decision = decision.verdict(),
                "Connection from {} {}.",
                peer,
                decision.verdict()
            );
        }
        if self.log_level >= LogLevel::High {
            tracing::info!(
                local = ?local,
                peer = %peer,
                outcome = ?decision,
                "Access decision detail"
            );
        }

        decision
    }

    fn report(&self, line: &str, err: Option<ResolveError>) {
        if self.log_level < LogLevel::Low {
            return;
        }
        match err {
            Some(err) => tracing::warn!(error = %err, "{}", line),
            None => tracing::warn!("{}", line),
        }
    }
}
