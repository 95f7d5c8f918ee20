//! awshealth-source: fetches affected entities from the AWS Health API.
//!
//! # Architecture
//!
//! ```text
//! EventSource<A: HealthApi>
//!   ├── fetch(query) ← one call per poll cycle, bounded by a timeout
//!   │   ├── describe_events()            → every page, distinct ARNs
//!   │   └── describe_affected_entities() → batches of 10 ARNs, every page
//!   └── A = AwsHealthApi (aws-sdk-health) | FakeHealthApi (tests)
//! ```
//!
//! Events and entities are separate upstream calls: entities are not
//! inline on events, and a query that matches no events never touches
//! the entity API. A fetch either returns every entity the upstream
//! reported or fails; partial results are never handed to the caller.

pub mod api;
pub mod aws;
pub mod source;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use api::{EntityPage, EventPage, HealthApi};
pub use aws::AwsHealthApi;
pub use source::{EventSource, MAX_ARNS_PER_ENTITY_QUERY};

#[cfg(any(test, feature = "testing"))]
pub use fake::FakeHealthApi;
