//! awshealth-metrics: published state of the AWS Health exporter.
//!
//! Turns a fetched entity list into a deduplicated set of label tuples,
//! reconciles the long-lived registry against it, and renders the
//! registry in Prometheus text format.
//!
//! # Architecture
//!
//! ```text
//! MetricSnapshot::build(entities)   ← pure, never fails
//!   └── MetricsRegistry
//!         ├── apply_success() → creates new series, removes stale ones
//!         ├── apply_failure() → keeps series, bumps the error signal
//!         └── view()          → Arc<RegistryView> for scrapes
//!
//! Prometheus exposition
//!   └── render_prometheus(view) → text/plain for /metrics endpoint
//! ```

pub mod prometheus;
pub mod registry;
pub mod snapshot;

pub use prometheus::{CONTENT_TYPE, render_prometheus};
pub use registry::{MetricsRegistry, ReconcileReport, RegistryView};
pub use snapshot::{LabelTuple, MetricSnapshot};
