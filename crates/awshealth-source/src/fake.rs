//! In-memory `HealthApi` for tests.
//!
//! Serves a fixed event and entity table in pages of `page_size`, with
//! tokens of the form `page-{n}`. Failure injection and an artificial
//! delay let tests drive the poller through its recovery and timeout
//! paths.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use awshealth_types::*;

use crate::api::{EntityPage, EventPage, HealthApi};

#[derive(Debug, Default)]
struct Table {
    events: Vec<HealthEvent>,
    entities: Vec<AffectedEntity>,
    failure: Option<TransportError>,
    delay: Option<Duration>,
    entity_batches: Vec<Vec<String>>,
}

/// Scriptable stand-in for the Health API.
#[derive(Debug)]
pub struct FakeHealthApi {
    table: Mutex<Table>,
    page_size: usize,
    event_calls: AtomicUsize,
    entity_calls: AtomicUsize,
}

impl Default for FakeHealthApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHealthApi {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            page_size: page_size.max(1),
            event_calls: AtomicUsize::new(0),
            entity_calls: AtomicUsize::new(0),
        }
    }

    /// Replace the current upstream state. Events are derived from the
    /// distinct `event_arn`s of `entities`.
    pub fn set_entities(&self, entities: Vec<AffectedEntity>) {
        let mut events: Vec<HealthEvent> = Vec::new();
        for arn in entities.iter().filter_map(|e| e.event_arn.clone()) {
            if !events.iter().any(|e| e.arn.as_deref() == Some(arn.as_str())) {
                events.push(HealthEvent {
                    arn: Some(arn),
                    ..HealthEvent::default()
                });
            }
        }
        self.set_table(events, entities);
    }

    /// Replace events and entities independently.
    pub fn set_table(&self, events: Vec<HealthEvent>, entities: Vec<AffectedEntity>) {
        let mut table = self.lock();
        table.events = events;
        table.entities = entities;
    }

    /// Make every subsequent call fail with `err`, or succeed again with `None`.
    pub fn set_failure(&self, err: Option<TransportError>) {
        self.lock().failure = err;
    }

    /// Delay every call by `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    pub fn event_calls(&self) -> usize {
        self.event_calls.load(Ordering::SeqCst)
    }

    pub fn entity_calls(&self) -> usize {
        self.entity_calls.load(Ordering::SeqCst)
    }

    /// ARN batches passed to `describe_affected_entities`, in call order.
    pub fn entity_batches(&self) -> Vec<Vec<String>> {
        self.lock().entity_batches.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn prelude(&self) -> TransportResult<()> {
        let (delay, failure) = {
            let table = self.lock();
            (table.delay, table.failure.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn page<T: Clone>(&self, items: &[T], next_token: Option<&str>) -> (Vec<T>, Option<String>) {
        let page_no = next_token
            .and_then(|t| t.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let start = (page_no * self.page_size).min(items.len());
        let end = (start + self.page_size).min(items.len());
        let next = (end < items.len()).then(|| format!("page-{}", page_no + 1));
        (items[start..end].to_vec(), next)
    }
}

#[async_trait]
impl HealthApi for FakeHealthApi {
    async fn describe_events(
        &self,
        _filter: &EventFilter,
        next_token: Option<String>,
    ) -> TransportResult<EventPage> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        self.prelude().await?;

        let events = self.lock().events.clone();
        let (events, next_token) = self.page(&events, next_token.as_deref());
        Ok(EventPage { events, next_token })
    }

    async fn describe_affected_entities(
        &self,
        event_arns: &[String],
        next_token: Option<String>,
    ) -> TransportResult<EntityPage> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        self.prelude().await?;

        let matching: Vec<AffectedEntity> = {
            let mut table = self.lock();
            if next_token.is_none() {
                table.entity_batches.push(event_arns.to_vec());
            }
            table
                .entities
                .iter()
                .filter(|e| {
                    e.event_arn
                        .as_ref()
                        .is_some_and(|arn| event_arns.contains(arn))
                })
                .cloned()
                .collect()
        };
        let (entities, next_token) = self.page(&matching, next_token.as_deref());
        Ok(EntityPage { entities, next_token })
    }
}
