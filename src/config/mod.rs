//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides applied by lifecycle::startup
//!     → validation.rs (semantic checks, once, on the merged result)
//!     → GateConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::ChannelConfig;
pub use schema::GateConfig;
pub use schema::ListenerConfig;
pub use schema::ListenerMode;
pub use schema::LogLevel;
pub use schema::ObservabilityConfig;
