//! Gate server: accept loop and stdio mode.
//!
//! # Responsibilities
//! - Turn accepted TCP streams into transport endpoints
//! - Run one session task per connection, bounded by the listener
//! - On shutdown, stop accepting and shut down live transports

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio_util::codec::LinesCodec;

use crate::config::GateConfig;
use crate::lifecycle::{Shutdown, ShutdownListener};
use crate::net::connection::{ConnectionId, ConnectionTracker};
use crate::net::endpoint::TransportEndpoint;
use crate::net::listener::{ConnectionPermit, Listener, ListenerError};
use crate::net::validator::ConnectionValidator;
use crate::session::{serve_connection, EchoHandler, SessionOutcome};

/// How long shutdown waits for sessions before giving up.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct GateServer {
    config: GateConfig,
    validator: ConnectionValidator,
    tracker: ConnectionTracker,
}

impl GateServer {
    pub fn new(config: GateConfig) -> Self {
        let validator = ConnectionValidator::new(config.observability.log_level);
        Self {
            config,
            validator,
            tracker: ConnectionTracker::new(),
        }
    }

    fn codec(&self) -> LinesCodec {
        LinesCodec::new_with_max_length(self.config.channel.max_frame_length)
    }

    /// Serve the single connection inherited on stdin/stdout.
    pub async fn serve_stdio(&self) -> io::Result<SessionOutcome> {
        let endpoint = TransportEndpoint::stdio()?;
        let guard = self.tracker.track();

        let outcome =
            serve_connection(&endpoint, &self.validator, self.codec(), &mut EchoHandler).await;
        outcome.report(guard.id());

        if let Err(e) = endpoint.shutdown() {
            tracing::debug!(error = %e, "Transport shutdown failed");
        }
        Ok(outcome)
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(&self, listener: Listener, shutdown: &Shutdown) -> Result<(), ListenerError> {
        let mut stop = shutdown.subscribe();

        loop {
            tokio::select! {
                _ = stop.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        self.spawn_session(stream, peer, permit, shutdown.subscribe());
                    }
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Accept failed");
                    }
                    Err(e) => return Err(e),
                },
            }
        }

        tracing::info!(
            active = self.tracker.active_count(),
            "Stopped accepting, draining sessions"
        );
        if !self.tracker.wait_idle(DRAIN_TIMEOUT).await {
            tracing::warn!(
                active = self.tracker.active_count(),
                "Sessions still running after drain timeout"
            );
        }
        Ok(())
    }

    fn spawn_session(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        permit: ConnectionPermit,
        mut stop: ShutdownListener,
    ) {
        let guard = self.tracker.track();
        let validator = self.validator;
        let codec = self.codec();

        tokio::spawn(async move {
            let _permit = permit;
            let id: ConnectionId = guard.id();

            let endpoint = match stream.into_std().and_then(TransportEndpoint::from_tcp) {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %id,
                        peer_addr = %peer,
                        error = %e,
                        "Unable to prepare transport"
                    );
                    return;
                }
            };

            let mut handler = EchoHandler;
            tokio::select! {
                outcome = serve_connection(&endpoint, &validator, codec, &mut handler) => {
                    outcome.report(id);
                }
                _ = stop.recv() => {
                    tracing::debug!(connection_id = %id, "Session interrupted by shutdown");
                }
            }

            if let Err(e) = endpoint.shutdown() {
                tracing::debug!(connection_id = %id, error = %e, "Transport shutdown failed");
            }
            drop(guard);
        });
    }
}
