//! Host runtime for the tally election ledger.
//!
//! Wraps one [`tally_election::Election`] in an [`ElectionService`] that
//! serializes every write through a single writer task, and carries the
//! ambient pieces a host needs around it:
//! - TOML configuration ([`NodeConfig`])
//! - structured logging ([`init_logging`])
//! - Prometheus metrics ([`ElectionMetrics`])
//! - snapshot persistence ([`snapshot_store`])
//! - signal-driven shutdown ([`ShutdownController`])

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod service;
pub mod shutdown;
pub mod snapshot_store;
pub mod tracing_spans;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::ElectionMetrics;
pub use service::{Command, ElectionService, Pending};
pub use shutdown::ShutdownController;
