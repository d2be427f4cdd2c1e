//! Startup orchestration.
//!
//! # Responsibilities
//! - Read configuration, apply CLI overrides, then validate the result
//! - Initialize logging and (optionally) the metrics endpoint
//! - Install the broken-pipe policy before any connection is served
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order, not concurrently

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::validation::validate_config;
use crate::config::{read_config, ConfigError, GateConfig, ListenerMode, LogLevel};
use crate::lifecycle::signals::{ignore_broken_pipe, SignalError};
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub stdio: bool,
    pub bind_address: Option<String>,
    pub log_level: Option<LogLevel>,
}

/// Resolve the effective configuration without touching process state.
pub fn resolve_config(overrides: &Overrides) -> Result<GateConfig, ConfigError> {
    let mut config = match &overrides.config_path {
        Some(path) => read_config(path)?,
        None => GateConfig::default(),
    };

    if overrides.stdio {
        config.listener.mode = ListenerMode::Stdio;
    }
    if let Some(bind_address) = &overrides.bind_address {
        config.listener.bind_address = bind_address.clone();
    }
    if let Some(level) = overrides.log_level {
        config.observability.log_level = level;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Run the startup sequence: config → logging → metrics → signal policy.
pub fn prepare(overrides: &Overrides) -> Result<GateConfig, StartupError> {
    let config = resolve_config(overrides)?;

    logging::init(&config.observability.log_filter);
    tracing::info!(
        mode = ?config.listener.mode,
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        log_level = ?config.observability.log_level,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated above.
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        }
    }

    ignore_broken_pipe()?;
    Ok(config)
}
