//! The upstream seam: one page of events or entities per call.

use std::sync::Arc;

use async_trait::async_trait;

use awshealth_types::{AffectedEntity, EventFilter, HealthEvent, TransportResult};

/// One page of `DescribeEvents` results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPage {
    pub events: Vec<HealthEvent>,
    pub next_token: Option<String>,
}

/// One page of `DescribeAffectedEntities` results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPage {
    pub entities: Vec<AffectedEntity>,
    pub next_token: Option<String>,
}

/// Paged access to a health-event query service.
///
/// Implementations perform exactly one upstream request per call and
/// never retry; pagination and batching belong to `EventSource`.
#[async_trait]
pub trait HealthApi: Send + Sync {
    /// Fetch one page of events matching `filter`.
    async fn describe_events(
        &self,
        filter: &EventFilter,
        next_token: Option<String>,
    ) -> TransportResult<EventPage>;

    /// Fetch one page of entities affected by any of `event_arns`.
    async fn describe_affected_entities(
        &self,
        event_arns: &[String],
        next_token: Option<String>,
    ) -> TransportResult<EntityPage>;
}

#[async_trait]
impl<A: HealthApi + ?Sized> HealthApi for Arc<A> {
    async fn describe_events(
        &self,
        filter: &EventFilter,
        next_token: Option<String>,
    ) -> TransportResult<EventPage> {
        (**self).describe_events(filter, next_token).await
    }

    async fn describe_affected_entities(
        &self,
        event_arns: &[String],
        next_token: Option<String>,
    ) -> TransportResult<EntityPage> {
        (**self).describe_affected_entities(event_arns, next_token).await
    }
}
