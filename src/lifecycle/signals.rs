//! OS signal handling.
//!
//! # Responsibilities
//! - Install the process-wide broken-pipe policy (`SIGPIPE` ignored)
//! - Wait for SIGINT/SIGTERM to trigger graceful shutdown
//!
//! # Design Decisions
//! - The broken-pipe policy is installed at most once per process; later
//!   calls return the first outcome
//! - Termination uses Tokio's signal handling (async-safe)

use std::sync::OnceLock;

use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unable to ignore SIGPIPE: {0}")]
pub struct SignalError(Errno);

static BROKEN_PIPE_POLICY: OnceLock<Result<(), Errno>> = OnceLock::new();

/// Ignore `SIGPIPE` for the rest of the process lifetime.
///
/// Writes to a peer that has closed then fail with `EPIPE`, which the
/// outbound stream reports as `ChannelError::PeerClosed`.
pub fn ignore_broken_pipe() -> Result<(), SignalError> {
    let outcome = BROKEN_PIPE_POLICY.get_or_init(|| {
        // SAFETY: SIG_IGN installs no handler code, so no async-signal-safety
        // requirements apply.
        unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigIgn) }.map(|_| ())
    });

    match outcome {
        Ok(()) => {
            tracing::debug!("Broken-pipe signal ignored");
            Ok(())
        }
        Err(errno) => Err(SignalError(*errno)),
    }
}

/// Resolve once SIGINT or SIGTERM arrives.
pub async fn wait_for_termination() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received"),
        _ = terminate => tracing::info!("SIGTERM received"),
    }
}
