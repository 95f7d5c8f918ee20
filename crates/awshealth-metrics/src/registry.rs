//! Metrics registry: the long-lived state read by scrapes.
//!
//! State is an immutable `RegistryView` behind an `Arc`. Every apply
//! builds a complete replacement view and swaps it in under the write
//! lock; readers clone the `Arc` under the read lock and render from
//! their own copy, so a scrape never observes a half-applied cycle and
//! never holds the lock while formatting.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use awshealth_types::TransportError;

use crate::snapshot::{LabelTuple, MetricSnapshot};

/// Immutable published state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryView {
    /// Raw entity count of the latest successful fetch.
    pub event_count: u64,
    /// Series currently reported with value 1.
    pub series: BTreeSet<LabelTuple>,
    /// Entities of the latest successful fetch that needed sentinels.
    pub degraded: u64,
    pub fetch_errors_total: u64,
    /// Whether the most recent cycle succeeded.
    pub up: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// What a successful apply changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
    pub retained: usize,
}

/// Shared handle to the published metrics state.
///
/// Cloning is cheap; every clone refers to the same state.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    view: Arc<RwLock<Arc<RegistryView>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current published state.
    pub async fn view(&self) -> Arc<RegistryView> {
        self.view.read().await.clone()
    }

    /// Publish a successful fetch: the series set becomes exactly
    /// `snapshot.series`, and series absent from it are removed rather
    /// than zeroed.
    ///
    /// The poller is the only writer, so the replacement is built from a
    /// read of the current view and the write lock covers only the swap.
    pub async fn apply_success(&self, snapshot: MetricSnapshot) -> ReconcileReport {
        let current = self.view().await;

        let retained = current.series.intersection(&snapshot.series).count();
        let report = ReconcileReport {
            added: snapshot.series.len() - retained,
            removed: current.series.len() - retained,
            retained,
        };

        if snapshot.degraded > 0 {
            warn!(
                degraded = snapshot.degraded,
                "entities with missing identifying fields published with sentinels"
            );
        }

        let next = RegistryView {
            event_count: snapshot.count as u64,
            series: snapshot.series,
            degraded: snapshot.degraded as u64,
            fetch_errors_total: current.fetch_errors_total,
            up: true,
            last_success: Some(Utc::now()),
            last_failure: current.last_failure,
            last_error: current.last_error.clone(),
        };
        *self.view.write().await = Arc::new(next);

        debug!(
            added = report.added,
            removed = report.removed,
            retained = report.retained,
            "registry reconciled"
        );
        report
    }

    /// Record a failed fetch. Series and the event count keep their
    /// last-known-good values.
    pub async fn apply_failure(&self, err: &TransportError) {
        let mut next = RegistryView::clone(&*self.view().await);
        next.fetch_errors_total += 1;
        next.up = false;
        next.last_failure = Some(Utc::now());
        next.last_error = Some(err.to_string());
        *self.view.write().await = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awshealth_types::AffectedEntity;

    fn entity(event: &str, entity: &str, status: &str) -> AffectedEntity {
        AffectedEntity {
            event_arn: Some(event.to_string()),
            entity_arn: Some(entity.to_string()),
            entity_value: Some(format!("{entity}-value")),
            status_code: Some(status.to_string()),
            last_updated_time: DateTime::from_timestamp(1_700_000_000, 0),
            aws_account_id: None,
        }
    }

    fn snapshot(entities: &[AffectedEntity]) -> MetricSnapshot {
        MetricSnapshot::build(entities)
    }

    #[tokio::test]
    async fn starts_empty_and_down() {
        let registry = MetricsRegistry::new();
        let view = registry.view().await;
        assert_eq!(view.event_count, 0);
        assert!(view.series.is_empty());
        assert!(!view.up);
        assert_eq!(view.fetch_errors_total, 0);
    }

    #[tokio::test]
    async fn second_snapshot_replaces_first_exactly() {
        let registry = MetricsRegistry::new();
        let s1 = snapshot(&[
            entity("A", "X", "IMPAIRED"),
            entity("B", "Y", "IMPAIRED"),
        ]);
        let s2 = snapshot(&[entity("B", "Y", "IMPAIRED"), entity("C", "Z", "UNKNOWN")]);

        registry.apply_success(s1).await;
        let report = registry.apply_success(s2.clone()).await;

        let view = registry.view().await;
        assert_eq!(view.series, s2.series);
        assert_eq!(view.event_count, s2.count as u64);
        assert_eq!(
            report,
            ReconcileReport {
                added: 1,
                removed: 1,
                retained: 1
            }
        );
    }

    #[tokio::test]
    async fn applying_same_snapshot_twice_is_idempotent() {
        let registry = MetricsRegistry::new();
        let s = snapshot(&[entity("A", "X", "IMPAIRED"), entity("A", "X", "IMPAIRED")]);

        registry.apply_success(s.clone()).await;
        let first = registry.view().await;
        let report = registry.apply_success(s).await;
        let second = registry.view().await;

        assert_eq!(first.series, second.series);
        assert_eq!(first.event_count, second.event_count);
        assert_eq!(second.event_count, 2);
        assert_eq!(report.added, 0);
        assert_eq!(report.removed, 0);
    }

    #[tokio::test]
    async fn empty_snapshot_clears_every_series() {
        let registry = MetricsRegistry::new();
        registry.apply_success(snapshot(&[entity("A", "X", "IMPAIRED")])).await;
        let report = registry.apply_success(MetricSnapshot::default()).await;

        let view = registry.view().await;
        assert!(view.series.is_empty());
        assert_eq!(view.event_count, 0);
        assert!(view.up);
        assert_eq!(report.removed, 1);
    }

    #[tokio::test]
    async fn failure_keeps_series_and_count() {
        let registry = MetricsRegistry::new();
        registry
            .apply_success(snapshot(&[entity("A", "X", "IMPAIRED")]))
            .await;
        let before = registry.view().await;

        registry
            .apply_failure(&TransportError::api("DescribeEvents", "boom"))
            .await;
        let after = registry.view().await;

        assert_eq!(after.series, before.series);
        assert_eq!(after.event_count, before.event_count);
        assert_eq!(after.last_success, before.last_success);
        assert_eq!(after.fetch_errors_total, 1);
        assert!(!after.up);
        assert!(after.last_failure.is_some());
        assert_eq!(
            after.last_error.as_deref(),
            Some("health api error in DescribeEvents: boom")
        );
    }

    #[tokio::test]
    async fn success_after_failure_restores_up_and_keeps_error_total() {
        let registry = MetricsRegistry::new();
        registry
            .apply_failure(&TransportError::InvalidRequest("bad".to_string()))
            .await;
        registry.apply_success(MetricSnapshot::default()).await;

        let view = registry.view().await;
        assert!(view.up);
        assert_eq!(view.fetch_errors_total, 1);
    }

    #[tokio::test]
    async fn readers_keep_their_view_across_applies() {
        let registry = MetricsRegistry::new();
        registry
            .apply_success(snapshot(&[entity("A", "X", "IMPAIRED")]))
            .await;
        let held = registry.view().await;

        registry.apply_success(MetricSnapshot::default()).await;
        assert_eq!(held.series.len(), 1);
        assert!(registry.view().await.series.is_empty());
    }

    #[tokio::test]
    async fn apply_waits_on_readers_only_for_the_swap() {
        let registry = MetricsRegistry::new();
        let held = registry.view().await;
        let reader = registry.view.read().await;

        let writer = registry.clone();
        let apply = tokio::spawn(async move {
            writer
                .apply_success(MetricSnapshot::build(&[entity("A", "X", "IMPAIRED")]))
                .await
        });
        tokio::task::yield_now().await;
        assert!(!apply.is_finished());
        drop(reader);

        let report = apply.await.unwrap();
        assert_eq!(report.added, 1);
        assert!(held.series.is_empty());
        assert_eq!(registry.view().await.series.len(), 1);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let registry = MetricsRegistry::new();
        let reader = registry.clone();
        registry
            .apply_success(snapshot(&[entity("A", "X", "IMPAIRED")]))
            .await;
        assert_eq!(reader.view().await.event_count, 1);
    }
}
