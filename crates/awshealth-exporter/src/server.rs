//! Scrape server handlers.
//!
//! Handlers only read the registry: each takes the current view (an
//! `Arc` clone) and renders from it, so a scrape never waits on a fetch.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::Serialize;

use awshealth_metrics::{CONTENT_TYPE, MetricsRegistry, render_prometheus};

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct ExporterState {
    pub registry: MetricsRegistry,
}

/// Build the exporter router.
pub fn build_router(registry: MetricsRegistry) -> Router {
    Router::new()
        .route("/metrics", get(prometheus_metrics))
        .route("/healthz", get(healthz))
        .route("/api/v1/status", get(status))
        .with_state(ExporterState { registry })
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ExporterState>) -> impl IntoResponse {
    let view = state.registry.view().await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        render_prometheus(&view),
    )
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Poll status as reported by `/api/v1/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub up: bool,
    pub event_count: u64,
    pub series: usize,
    pub degraded: u64,
    pub fetch_errors_total: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// GET /api/v1/status
pub async fn status(State(state): State<ExporterState>) -> impl IntoResponse {
    let view = state.registry.view().await;
    Json(StatusResponse {
        up: view.up,
        event_count: view.event_count,
        series: view.series.len(),
        degraded: view.degraded,
        fetch_errors_total: view.fetch_errors_total,
        last_success: view.last_success,
        last_failure: view.last_failure,
        last_error: view.last_error.clone(),
    })
}
