//! Event source: resolves the configured query into affected entities.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use awshealth_types::*;

use crate::api::HealthApi;

/// Maximum number of event ARNs the Health API accepts per entity query.
pub const MAX_ARNS_PER_ENTITY_QUERY: usize = 10;

/// Two-step fetch of events and their affected entities.
pub struct EventSource<A> {
    api: A,
    timeout: Duration,
}

impl<A: HealthApi> EventSource<A> {
    /// Create a source whose whole fetch is bounded by `timeout`.
    pub fn new(api: A, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch every entity affected by events matching `query`, with the
    /// window's upper bound set to the current wall-clock time.
    ///
    /// Returns an empty list when no event matches. When the timeout
    /// fires, anything fetched so far is discarded.
    pub async fn fetch(&self, query: &EventQuery) -> TransportResult<Vec<AffectedEntity>> {
        match tokio::time::timeout(self.timeout, self.fetch_all(query)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn fetch_all(&self, query: &EventQuery) -> TransportResult<Vec<AffectedEntity>> {
        let filter = query.resolve(Utc::now())?;

        let events = self.describe_all_events(&filter).await?;
        let arns = distinct_arns(&events);
        if arns.is_empty() {
            debug!(events = events.len(), "no resolvable events, skipping entity query");
            return Ok(Vec::new());
        }

        let mut entities = Vec::new();
        for batch in arns.chunks(MAX_ARNS_PER_ENTITY_QUERY) {
            entities.extend(self.describe_all_entities(batch).await?);
        }

        debug!(
            events = events.len(),
            arns = arns.len(),
            entities = entities.len(),
            "fetch complete"
        );
        Ok(entities)
    }

    async fn describe_all_events(&self, filter: &EventFilter) -> TransportResult<Vec<HealthEvent>> {
        let mut events = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self.api.describe_events(filter, token.clone()).await?;
            events.extend(page.events);
            match advance("DescribeEvents", token.as_deref(), page.next_token)? {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(events)
    }

    async fn describe_all_entities(&self, arns: &[String]) -> TransportResult<Vec<AffectedEntity>> {
        let mut entities = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self.api.describe_affected_entities(arns, token.clone()).await?;
            entities.extend(page.entities);
            match advance("DescribeAffectedEntities", token.as_deref(), page.next_token)? {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(entities)
    }
}

/// Decide whether another page must be fetched.
///
/// An empty token ends pagination; a token equal to the one just used
/// would loop forever and is reported as an error.
fn advance(
    operation: &'static str,
    current: Option<&str>,
    next: Option<String>,
) -> TransportResult<Option<String>> {
    match next {
        Some(next) if next.is_empty() => Ok(None),
        Some(next) if current == Some(next.as_str()) => {
            Err(TransportError::Pagination { operation, token: next })
        }
        other => Ok(other),
    }
}

/// Distinct event ARNs in first-seen order.
fn distinct_arns(events: &[HealthEvent]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut arns = Vec::new();
    let mut missing = 0usize;

    for event in events {
        match &event.arn {
            Some(arn) if !arn.is_empty() => {
                if seen.insert(arn.as_str()) {
                    arns.push(arn.clone());
                }
            }
            _ => missing += 1,
        }
    }

    if missing > 0 {
        warn!(missing, "events without an ARN cannot be resolved to entities");
    }
    arns
}
