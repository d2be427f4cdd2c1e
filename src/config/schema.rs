//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the connection gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (mode, bind address, limits).
    pub listener: ListenerConfig,

    /// Message stream settings.
    pub channel: ChannelConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Where connections come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListenerMode {
    /// Bind a TCP socket and accept connections until shutdown.
    #[default]
    Tcp,
    /// Serve a single connection already attached to stdin/stdout.
    Stdio,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    pub mode: ListenerMode,

    /// Bind address (e.g., "0.0.0.0:4006"). Ignored in stdio mode.
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            mode: ListenerMode::Tcp,
            bind_address: "0.0.0.0:4006".to_string(),
            max_connections: 64,
        }
    }
}

/// Message stream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Longest frame the inbound stream will buffer before failing.
    pub max_frame_length: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_frame_length: 64 * 1024,
        }
    }
}

/// Verbosity of access-decision diagnostics.
///
/// Ordered: `None < Low < High`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    Deserialize,
    Serialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No decision lines at all.
    None,
    /// One line per connection plus resolution failures.
    #[default]
    Low,
    /// Adds local/peer detail for every decision.
    High,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Access-decision verbosity.
    pub log_level: LogLevel,

    /// Tracing filter directive (e.g. "info", "connection_gate=debug").
    pub log_filter: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Low,
            log_filter: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::None < LogLevel::Low);
        assert!(LogLevel::Low < LogLevel::High);
        assert!(LogLevel::High >= LogLevel::Low);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GateConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.mode, ListenerMode::Tcp);
        assert_eq!(config.listener.max_connections, 64);
        assert_eq!(config.observability.log_level, LogLevel::Low);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_sections() {
        let config: GateConfig = toml::from_str(
            r#"
            [listener]
            mode = "stdio"

            [observability]
            log_level = "none"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.mode, ListenerMode::Stdio);
        assert_eq!(config.listener.bind_address, "0.0.0.0:4006");
        assert_eq!(config.observability.log_level, LogLevel::None);
        assert_eq!(config.observability.log_filter, "info");
    }
}
