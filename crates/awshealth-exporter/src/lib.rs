//! awshealth-exporter: the AWS Health exporter daemon.
//!
//! Assembles the event source, poller, and metrics registry, and serves
//! the registry over HTTP:
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/healthz` | Liveness |
//! | GET | `/api/v1/status` | Poll status as JSON |

pub mod config;
pub mod server;
pub mod tasks;
pub mod telemetry;

pub use config::{Config, LogFormat};
pub use server::{ExporterState, build_router};
