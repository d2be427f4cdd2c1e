//! connection-gate
//!
//! A single-connection protocol listener front end.
//!
//! # Architecture Overview
//!
//! ```text
//!   inetd / stdio ──┐
//!                   ├─▶ TransportEndpoint ─▶ ConnectionValidator ──Reject──▶ close
//!   TCP listener ───┘                              │
//!                                               Accept
//!                                                  ▼
//!                                           open_channels
//!                                     (InboundStream, OutboundStream)
//!                                                  ▼
//!                                        session handler loop
//! ```

use std::path::PathBuf;

use clap::Parser;

use connection_gate::config::{ListenerMode, LogLevel};
use connection_gate::lifecycle::signals::wait_for_termination;
use connection_gate::lifecycle::startup::{self, Overrides};
use connection_gate::net::listener::Listener;
use connection_gate::{GateServer, Shutdown};

#[derive(Parser)]
#[command(name = "connection-gate")]
#[command(about = "Access-controlled single-connection protocol listener", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve the connection attached to stdin/stdout and exit.
    #[arg(long)]
    stdio: bool,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Access-decision verbosity.
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let overrides = Overrides {
        config_path: cli.config,
        stdio: cli.stdio,
        bind_address: cli.bind,
        log_level: cli.log_level,
    };

    let config = startup::prepare(&overrides)?;
    tracing::info!("connection-gate v{} starting", env!("CARGO_PKG_VERSION"));

    let mode = config.listener.mode;
    let listener_config = config.listener.clone();
    let server = GateServer::new(config);

    match mode {
        ListenerMode::Stdio => {
            server.serve_stdio().await?;
        }
        ListenerMode::Tcp => {
            let listener = Listener::bind(&listener_config).await?;
            let shutdown = Shutdown::new();

            let trigger = shutdown.clone();
            tokio::spawn(async move {
                wait_for_termination().await;
                trigger.trigger();
            });

            server.run(listener, &shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
