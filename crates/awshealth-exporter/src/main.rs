//! awshealth-exporter: publishes AWS Health events for Prometheus.
//!
//! Polls the AWS Health API on a fixed interval and serves the affected
//! entities of matching events as `aws_health_event` series.
//!
//! # Usage
//!
//! ```text
//! POLLING_INTERVAL_SECONDS=900 EXPORTER_PORT=9876 awshealth-exporter
//! ```

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, error, info};

use awshealth_exporter::{Config, build_router, tasks, telemetry};
use awshealth_metrics::MetricsRegistry;
use awshealth_poller::Poller;
use awshealth_source::{AwsHealthApi, EventSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    telemetry::init(config.log_format);

    if let Err(e) = run(config).await {
        error!(error = %format!("{e:#}"), "exporter failed");
        return Err(e);
    }
    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!("AWS Health exporter starting");
    if !config.app_url.is_empty() {
        debug!(app_url = %config.app_url, "APP_URL is accepted but unused");
    }

    // ── Upstream session ───────────────────────────────────────

    let query = config.query()?;
    let api = AwsHealthApi::connect(&config.health_api_region)
        .await
        .context("cannot establish AWS Health session")?;
    info!(
        regions = ?query.regions,
        since = %query.since,
        timeout_secs = config.fetch_timeout_seconds,
        "event query configured"
    );

    // ── Poller ─────────────────────────────────────────────────

    let registry = MetricsRegistry::new();
    let mut poller = Poller::new(
        EventSource::new(api, config.fetch_timeout()),
        registry.clone(),
        query,
        config.interval(),
    );

    // ── Scrape server ──────────────────────────────────────────

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind metrics listener on {addr}"))?;
    info!(%addr, "metrics server listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = tokio::spawn(async move {
        poller.run(shutdown_rx).await;
    });

    let server = axum::serve(listener, build_router(registry)).with_graceful_shutdown(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;
    if !tasks::join_logged("poller", poller_handle).await {
        anyhow::bail!("poller stopped abnormally");
    }

    info!("AWS Health exporter stopped");
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
