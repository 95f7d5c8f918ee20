//! Poller: the single sequential worker that keeps the registry fresh.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use awshealth_metrics::{MetricSnapshot, MetricsRegistry, ReconcileReport};
use awshealth_source::{EventSource, HealthApi};
use awshealth_types::{EventQuery, TransportError};

/// Where the poller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Fetching,
    Applying,
    Recovering,
    Sleeping,
}

/// Result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The fetch succeeded and the registry now mirrors it.
    Applied(ReconcileReport),
    /// The fetch failed; the registry kept its previous series.
    Failed(TransportError),
}

pub struct Poller<A> {
    source: EventSource<A>,
    registry: MetricsRegistry,
    query: EventQuery,
    interval: Duration,
    phase: PollPhase,
    cycles: u64,
}

impl<A: HealthApi> Poller<A> {
    pub fn new(
        source: EventSource<A>,
        registry: MetricsRegistry,
        query: EventQuery,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            registry,
            query,
            interval,
            phase: PollPhase::Idle,
            cycles: 0,
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// Run one cycle: fetch, then apply or recover. Leaves the poller in
    /// `Sleeping`.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        self.cycles += 1;
        self.transition(PollPhase::Fetching);

        let outcome = match self.source.fetch(&self.query).await {
            Ok(entities) => {
                self.transition(PollPhase::Applying);
                let snapshot = MetricSnapshot::build(&entities);
                let count = snapshot.count;
                let series = snapshot.series.len();
                let report = self.registry.apply_success(snapshot).await;
                info!(
                    cycle = self.cycles,
                    count,
                    series,
                    added = report.added,
                    removed = report.removed,
                    "health events refreshed"
                );
                CycleOutcome::Applied(report)
            }
            Err(err) => {
                self.transition(PollPhase::Recovering);
                self.registry.apply_failure(&err).await;
                error!(
                    cycle = self.cycles,
                    error = %err,
                    "health event fetch failed, keeping last known metrics"
                );
                CycleOutcome::Failed(err)
            }
        };

        self.transition(PollPhase::Sleeping);
        outcome
    }

    /// Poll immediately, then every `interval`, until `shutdown` flips.
    ///
    /// A shutdown that arrives mid-fetch drops the fetch; nothing partial
    /// reaches the registry.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "poller started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = self.poll_once() => {}
                _ = shutdown.changed() => {
                    info!("shutdown during fetch, abandoning cycle");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }
            self.transition(PollPhase::Idle);
        }

        self.phase = PollPhase::Idle;
        info!(cycles = self.cycles, "poller stopped");
    }

    fn transition(&mut self, next: PollPhase) {
        debug!(from = ?self.phase, to = ?next, "poller transition");
        self.phase = next;
    }
}
