//! Domain types for the AWS Health exporter.
//!
//! These mirror the shape of the Health API's `Event` and `AffectedEntity`
//! records, trimmed to what the exporter publishes. None of them are
//! persisted; they live for the duration of one fetch.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TransportError, TransportResult};

/// Opaque ARN-like identifier of a health event.
pub type EventArn = String;

// ── Events ─────────────────────────────────────────────────────────

/// Category of a health event, as reported by the Health API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventCategory {
    Issue,
    ScheduledChange,
    AccountNotification,
    Investigation,
}

impl EventCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::ScheduledChange => "scheduledChange",
            Self::AccountNotification => "accountNotification",
            Self::Investigation => "investigation",
        }
    }
}

/// Lifecycle status of a health event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventStatus {
    Open,
    Closed,
    Upcoming,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Upcoming => "upcoming",
        }
    }
}

/// A provider-reported incident or scheduled change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
    pub arn: Option<EventArn>,
    pub region: Option<String>,
    pub category: Option<EventCategory>,
    pub status: Option<EventStatus>,
    pub last_updated_time: Option<DateTime<Utc>>,
}

// ── Entities ───────────────────────────────────────────────────────

/// A concrete resource impacted by a health event.
///
/// The unit published as one metric series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffectedEntity {
    pub event_arn: Option<EventArn>,
    pub entity_arn: Option<String>,
    /// Free-form descriptor of the resource (instance id, hostname, ...).
    pub entity_value: Option<String>,
    /// Upstream status code verbatim: `IMPAIRED`, `UNIMPAIRED`, `UNKNOWN`, ...
    pub status_code: Option<String>,
    pub last_updated_time: Option<DateTime<Utc>>,
    pub aws_account_id: Option<String>,
}

// ── Query ──────────────────────────────────────────────────────────

/// Configured event query, independent of the wall clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventQuery {
    /// Region allow-list. `global` selects global-service events.
    pub regions: Vec<String>,
    /// Lower bound on event last-updated time.
    pub since: DateTime<Utc>,
    pub categories: Vec<EventCategory>,
    pub statuses: Vec<EventStatus>,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            regions: vec!["eu-west-1".to_string(), "global".to_string()],
            since: Utc
                .with_ymd_and_hms(2021, 12, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            categories: vec![EventCategory::Issue, EventCategory::ScheduledChange],
            statuses: vec![EventStatus::Open, EventStatus::Closed, EventStatus::Upcoming],
        }
    }
}

impl EventQuery {
    /// Resolve the query into a concrete filter whose window ends at `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> TransportResult<EventFilter> {
        if self.regions.is_empty() {
            return Err(TransportError::InvalidRequest(
                "region allow-list is empty".to_string(),
            ));
        }
        if self.since >= now {
            return Err(TransportError::InvalidRequest(format!(
                "window lower bound {} is not before {}",
                self.since, now
            )));
        }
        Ok(EventFilter {
            regions: self.regions.clone(),
            from: self.since,
            to: now,
            categories: self.categories.clone(),
            statuses: self.statuses.clone(),
        })
    }
}

/// An `EventQuery` pinned to a concrete time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    pub regions: Vec<String>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub categories: Vec<EventCategory>,
    pub statuses: Vec<EventStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_matches_exporter_defaults() {
        let q = EventQuery::default();
        assert_eq!(q.regions, vec!["eu-west-1", "global"]);
        assert_eq!(q.since.to_rfc3339(), "2021-12-01T00:00:00+00:00");
        assert_eq!(
            q.categories,
            vec![EventCategory::Issue, EventCategory::ScheduledChange]
        );
        assert_eq!(q.statuses.len(), 3);
    }

    #[test]
    fn resolve_sets_upper_bound() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let filter = EventQuery::default().resolve(now).unwrap();
        assert_eq!(filter.to, now);
        assert_eq!(filter.from, EventQuery::default().since);
    }

    #[test]
    fn resolve_rejects_inverted_window() {
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let err = EventQuery::default().resolve(now).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[test]
    fn resolve_rejects_empty_regions() {
        let q = EventQuery {
            regions: vec![],
            ..EventQuery::default()
        };
        assert!(q.resolve(Utc::now()).is_err());
    }

    #[test]
    fn category_serializes_camel_case() {
        let json = serde_json::to_string(&EventCategory::ScheduledChange).unwrap();
        assert_eq!(json, "\"scheduledChange\"");
        assert_eq!(EventCategory::ScheduledChange.as_str(), "scheduledChange");
    }
}
