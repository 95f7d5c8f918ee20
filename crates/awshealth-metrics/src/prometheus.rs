//! Prometheus text exposition format.
//!
//! Renders a registry view into the Prometheus text exposition format
//! (version 0.0.4) for scraping by a Prometheus server or compatible agent.

use std::fmt::Write;

use crate::registry::RegistryView;
use crate::snapshot::LabelTuple;

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render a registry view into Prometheus text format.
///
/// `aws_health_event` series are emitted in label-tuple order, so two
/// renders of the same view are byte-identical.
pub fn render_prometheus(view: &RegistryView) -> String {
    let mut out = String::new();

    header(&mut out, "aws_health_number_of_events", "Current number of events", "gauge");
    let _ = writeln!(out, "aws_health_number_of_events {}", view.event_count);

    header(&mut out, "aws_health_event", "Event", "gauge");
    for tuple in &view.series {
        let _ = writeln!(out, "aws_health_event{{{}}} 1", labels(tuple));
    }

    header(
        &mut out,
        "aws_health_degraded_entities",
        "Entities in the latest fetch published with placeholder labels.",
        "gauge",
    );
    let _ = writeln!(out, "aws_health_degraded_entities {}", view.degraded);

    header(
        &mut out,
        "aws_health_fetch_errors_total",
        "Failed health event fetches since start.",
        "counter",
    );
    let _ = writeln!(out, "aws_health_fetch_errors_total {}", view.fetch_errors_total);

    header(
        &mut out,
        "aws_health_up",
        "Whether the most recent health event fetch succeeded.",
        "gauge",
    );
    let _ = writeln!(out, "aws_health_up {}", u8::from(view.up));

    if let Some(t) = view.last_success {
        header(
            &mut out,
            "aws_health_last_success_timestamp_seconds",
            "Unix time of the last successful fetch.",
            "gauge",
        );
        let _ = writeln!(out, "aws_health_last_success_timestamp_seconds {}", t.timestamp());
    }

    if let Some(t) = view.last_failure {
        header(
            &mut out,
            "aws_health_last_failure_timestamp_seconds",
            "Unix time of the last failed fetch.",
            "gauge",
        );
        let _ = writeln!(out, "aws_health_last_failure_timestamp_seconds {}", t.timestamp());
    }

    out
}

fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

fn labels(tuple: &LabelTuple) -> String {
    LabelTuple::NAMES
        .iter()
        .zip(tuple.values())
        .map(|(name, value)| format!("{name}=\"{}\"", escape_label_value(value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Escape a label value: backslash, double quote, and line feed.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}
