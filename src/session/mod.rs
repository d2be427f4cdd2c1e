//! Per-connection session driver.
//!
//! # Data Flow
//! ```text
//! TransportEndpoint
//!     → ConnectionValidator::validate   (Reject → Refused, no streams)
//!     → open_channels                   (incomplete pair → StreamsUnavailable)
//!     → recv → MessageHandler → send    (until EOF or peer closes)
//! ```

pub mod handler;

pub use handler::{EchoHandler, MessageHandler};

use tokio_util::codec::{Decoder, Encoder};

use crate::net::channel::{open_channels, ChannelError};
use crate::net::connection::ConnectionId;
use crate::net::endpoint::TransportEndpoint;
use crate::net::validator::{AccessDecision, ConnectionValidator, RejectReason};
use crate::observability::metrics;

/// Message counts for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub received: u64,
    pub sent: u64,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The validator turned the connection away before any I/O.
    Refused(RejectReason),
    /// At least one message stream could not be built.
    StreamsUnavailable,
    /// The peer finished sending.
    Completed(SessionStats),
    /// The peer went away while we were still talking.
    PeerClosed(SessionStats),
    Failed {
        stats: SessionStats,
        error: ChannelError,
    },
}

impl SessionOutcome {
    pub fn stats(&self) -> SessionStats {
        match self {
            SessionOutcome::Refused(_) | SessionOutcome::StreamsUnavailable => {
                SessionStats::default()
            }
            SessionOutcome::Completed(stats)
            | SessionOutcome::PeerClosed(stats)
            | SessionOutcome::Failed { stats, .. } => *stats,
        }
    }

    /// Emit the closing log line for a session.
    pub fn report(&self, id: ConnectionId) {
        let stats = self.stats();
        match self {
            SessionOutcome::Refused(reason) => {
                tracing::debug!(connection_id = %id, %reason, "Connection refused")
            }
            SessionOutcome::StreamsUnavailable => {
                tracing::warn!(
                    connection_id = %id,
                    "Message streams unavailable, connection dropped"
                )
            }
            SessionOutcome::Completed(_) => tracing::info!(
                connection_id = %id,
                received = stats.received,
                sent = stats.sent,
                "Session finished"
            ),
            SessionOutcome::PeerClosed(_) => tracing::info!(
                connection_id = %id,
                received = stats.received,
                sent = stats.sent,
                "Peer closed connection"
            ),
            SessionOutcome::Failed { error, .. } => tracing::warn!(
                connection_id = %id,
                error = %error,
                received = stats.received,
                sent = stats.sent,
                "Session failed"
            ),
        }
    }
}

/// Validate `endpoint`, open its streams and pump messages through
/// `handler` until the peer stops.
pub async fn serve_connection<C, H>(
    endpoint: &TransportEndpoint,
    validator: &ConnectionValidator,
    codec: C,
    handler: &mut H,
) -> SessionOutcome
where
    C: Decoder + Encoder<H::Reply> + Clone + Unpin,
    <C as Decoder>::Error: Into<ChannelError>,
    <C as Encoder<H::Reply>>::Error: Into<ChannelError>,
    H: MessageHandler<<C as Decoder>::Item>,
{
    let decision = validator.validate(endpoint);
    metrics::record_decision(&decision);
    if let AccessDecision::Reject(reason) = decision {
        return SessionOutcome::Refused(reason);
    }

    let Some((mut inbound, mut outbound)) = open_channels(endpoint, codec).into_parts() else {
        return SessionOutcome::StreamsUnavailable;
    };

    let mut stats = SessionStats::default();
    while let Some(frame) = inbound.recv().await {
        let message = match frame {
            Ok(message) => message,
            Err(ChannelError::PeerClosed) => return SessionOutcome::PeerClosed(stats),
            Err(error) => return SessionOutcome::Failed { stats, error },
        };
        stats.received += 1;

        let Some(reply) = handler.handle(message) else {
            continue;
        };
        match outbound.send(reply).await {
            Ok(()) => stats.sent += 1,
            Err(ChannelError::PeerClosed) => return SessionOutcome::PeerClosed(stats),
            Err(error) => return SessionOutcome::Failed { stats, error },
        }
    }

    SessionOutcome::Completed(stats)
}
