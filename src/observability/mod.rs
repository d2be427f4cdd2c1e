//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! validator / channel / session produce:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stderr capture, inetd logs)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
