//! awshealth-types: domain types for the AWS Health exporter.
//!
//! Everything that crosses a crate boundary lives here: the transient
//! `HealthEvent` / `AffectedEntity` records reconstructed on every poll,
//! the query that selects them, and the error taxonomy shared by the
//! event source, the poller, and the daemon.
//!
//! Upstream records are modelled with optional fields throughout. The
//! Health API marks most attributes optional and a partially populated
//! entity must still surface as a metric series.

pub mod error;
pub mod types;

pub use error::{ConfigError, TransportError, TransportResult};
pub use types::*;
