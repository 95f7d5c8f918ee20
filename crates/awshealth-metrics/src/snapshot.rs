//! Metric snapshot: normalized label tuples for one fetch.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use awshealth_types::AffectedEntity;

/// Substituted for a missing identifying field.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Layout of the `last_update_time` label for whole-second timestamps.
pub const LAST_UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Layout used when the timestamp carries a sub-second part.
pub const LAST_UPDATE_FORMAT_FRACTIONAL: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";

/// Identity key of one published `aws_health_event` series.
///
/// Field order is the label order of the exposition and the sort order
/// of the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelTuple {
    pub event_arn: String,
    pub last_update_time: String,
    pub status_code: String,
    pub entity_arn: String,
    pub entity_value: String,
}

impl LabelTuple {
    /// Label names, in the order of `values()`.
    pub const NAMES: [&'static str; 5] = [
        "event_arn",
        "last_update_time",
        "status_code",
        "entity_arn",
        "entity_value",
    ];

    /// Build a tuple from an entity, substituting sentinels for missing
    /// fields. The flag is set when an identifying field was missing.
    pub fn from_entity(entity: &AffectedEntity) -> (Self, bool) {
        let mut degraded = false;
        let mut required = |value: Option<String>| {
            value.filter(|v| !v.is_empty()).unwrap_or_else(|| {
                degraded = true;
                UNKNOWN_LABEL.to_string()
            })
        };

        let tuple = Self {
            event_arn: required(entity.event_arn.clone()),
            last_update_time: required(entity.last_updated_time.map(format_time)),
            status_code: required(entity.status_code.clone()),
            entity_arn: required(entity.entity_arn.clone()),
            entity_value: entity.entity_value.clone().unwrap_or_default(),
        };
        (tuple, degraded)
    }

    pub fn values(&self) -> [&str; 5] {
        [
            self.event_arn.as_str(),
            self.last_update_time.as_str(),
            self.status_code.as_str(),
            self.entity_arn.as_str(),
            self.entity_value.as_str(),
        ]
    }
}

/// Microseconds are kept so entities differing only below the second
/// stay distinct series.
fn format_time(t: DateTime<Utc>) -> String {
    let layout = if t.timestamp_subsec_micros() == 0 {
        LAST_UPDATE_FORMAT
    } else {
        LAST_UPDATE_FORMAT_FRACTIONAL
    };
    t.format(layout).to_string()
}

/// The published form of one successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricSnapshot {
    /// Raw entity count, before deduplication.
    pub count: usize,
    pub series: BTreeSet<LabelTuple>,
    /// Entities that needed at least one sentinel substitution.
    pub degraded: usize,
}

impl MetricSnapshot {
    /// Build a snapshot from a fetched entity list. Total: every entity
    /// contributes a tuple, however incomplete.
    pub fn build(entities: &[AffectedEntity]) -> Self {
        let mut series = BTreeSet::new();
        let mut degraded = 0;

        for entity in entities {
            let (tuple, partial) = LabelTuple::from_entity(entity);
            if partial {
                degraded += 1;
            }
            series.insert(tuple);
        }

        Self {
            count: entities.len(),
            series,
            degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entity(event: &str, entity: &str, status: &str) -> AffectedEntity {
        AffectedEntity {
            event_arn: Some(event.to_string()),
            entity_arn: Some(entity.to_string()),
            entity_value: Some("i-0abc".to_string()),
            status_code: Some(status.to_string()),
            last_updated_time: Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).single(),
            aws_account_id: None,
        }
    }

    #[test]
    fn empty_input_yields_empty_snapshot() {
        let snap = MetricSnapshot::build(&[]);
        assert_eq!(snap.count, 0);
        assert!(snap.series.is_empty());
        assert_eq!(snap, MetricSnapshot::default());
    }

    #[test]
    fn identical_entities_collapse_but_count_raw() {
        let e = entity("arn:event/A", "arn:entity/X", "IMPAIRED");
        let snap = MetricSnapshot::build(&[e.clone(), e]);
        assert_eq!(snap.count, 2);
        assert_eq!(snap.series.len(), 1);
    }

    #[test]
    fn distinct_status_is_a_distinct_series() {
        let snap = MetricSnapshot::build(&[
            entity("arn:event/A", "arn:entity/X", "IMPAIRED"),
            entity("arn:event/A", "arn:entity/X", "RESOLVED"),
        ]);
        assert_eq!(snap.series.len(), 2);
    }

    #[test]
    fn timestamp_uses_offset_layout() {
        let (tuple, degraded) =
            LabelTuple::from_entity(&entity("arn:event/A", "arn:entity/X", "IMPAIRED"));
        assert!(!degraded);
        assert_eq!(tuple.last_update_time, "2024-02-03 04:05:06+00:00");
        assert_eq!(
            tuple.values(),
            ["arn:event/A", "2024-02-03 04:05:06+00:00", "IMPAIRED", "arn:entity/X", "i-0abc"]
        );
    }

    #[test]
    fn sub_second_timestamps_keep_microseconds() {
        let whole = DateTime::from_timestamp(1_638_526_261, 0);
        let fractional = DateTime::from_timestamp(1_638_526_261, 337_000_000);

        let mut a = entity("arn:event/A", "arn:entity/X", "IMPAIRED");
        a.last_updated_time = fractional;
        let mut b = a.clone();
        b.last_updated_time = whole;

        let (tuple, _) = LabelTuple::from_entity(&a);
        assert_eq!(tuple.last_update_time, "2021-12-03 10:11:01.337000+00:00");

        let snap = MetricSnapshot::build(&[a, b]);
        assert_eq!(snap.count, 2);
        assert_eq!(snap.series.len(), 2);
        let labels: Vec<_> = snap.series.iter().map(|t| t.last_update_time.as_str()).collect();
        assert_eq!(
            labels,
            ["2021-12-03 10:11:01+00:00", "2021-12-03 10:11:01.337000+00:00"]
        );
    }

    #[test]
    fn missing_fields_get_sentinels() {
        let partial = AffectedEntity {
            event_arn: Some("arn:event/A".to_string()),
            ..AffectedEntity::default()
        };
        let snap = MetricSnapshot::build(&[partial]);
        assert_eq!(snap.count, 1);
        assert_eq!(snap.degraded, 1);

        let tuple = snap.series.iter().next().unwrap();
        assert_eq!(tuple.event_arn, "arn:event/A");
        assert_eq!(tuple.entity_arn, UNKNOWN_LABEL);
        assert_eq!(tuple.status_code, UNKNOWN_LABEL);
        assert_eq!(tuple.last_update_time, UNKNOWN_LABEL);
        assert_eq!(tuple.entity_value, "");
    }

    #[test]
    fn missing_value_alone_is_not_degraded() {
        let mut e = entity("arn:event/A", "arn:entity/X", "IMPAIRED");
        e.entity_value = None;
        let snap = MetricSnapshot::build(&[e]);
        assert_eq!(snap.degraded, 0);
        assert_eq!(snap.series.len(), 1);
    }
}
