//! CV Inference API — Metrics Host Entry Point
//!
//! Wiring sequence:
//! 1. Load config.toml (or defaults) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Resolve metrics mode once from ENABLE_PROMETHEUS
//! 4. Register instruments (fatal on any definition error)
//! 5. Spawn the database monitor (feeds cv_database_connected + /ready)
//! 6. Build the router and run metrics setup (ACTIVE or DISABLED)
//! 7. Serve until SIGINT, then stop the monitor
//!
//! The binary mounts only the health and metrics routes. Inference
//! handlers live in the host API, which embeds the library and feeds
//! `InferenceService` / `track_inference_time` from its own routes.

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use cv_metrics::adapters::database::TcpDatabaseProbe;
use cv_metrics::adapters::metrics::{HealthState, Instrumentation, MetricRegistry};
use cv_metrics::config::loader::{self, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use cv_metrics::usecases::DatabaseHealthMonitor;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = loader::load_or_default(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.service.log_level)
                }),
        )
        .json()
        .init();

    // ── 3. Metrics mode, decided once ───────────────────────
    let mode = config.metrics_mode();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        metrics = ?mode,
        config = %config_path,
        "Starting CV inference API"
    );

    // ── 4. Registry + instruments ───────────────────────────
    let registry = Arc::new(MetricRegistry::new());
    let instrumentation = Arc::new(
        Instrumentation::new(
            Arc::clone(&registry),
            config.metrics.instrumentation_options(),
        )
        .context("Failed to register metrics")?,
    );

    // ── 5. Database monitor ─────────────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let probe = TcpDatabaseProbe::new(
        config.database.address.clone(),
        Duration::from_millis(config.database.probe_timeout_ms),
    );
    let monitor = DatabaseHealthMonitor::new(
        probe,
        instrumentation.clone(),
        Duration::from_secs(config.database.probe_interval_seconds),
    );
    let health = HealthState::new(monitor.status_flag());
    let monitor_handle = tokio::spawn(monitor.run(shutdown_tx.subscribe()));

    // ── 6. Router + metrics setup ───────────────────────────
    let app = instrumentation
        .setup(health.router(), mode)
        .context("Failed to set up metrics exposition")?;

    // ── 7. Serve ────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.service.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.service.bind_address))?;

    info!(
        address = %config.service.bind_address,
        metrics_state = %instrumentation.state(),
        "HTTP server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("HTTP server failed")?;

    join_monitor(monitor_handle, Duration::from_secs(5)).await;

    info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT, then tell every task to stop.
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for SIGINT, serving until killed");
        std::future::pending::<()>().await;
    }
    info!("SIGINT received, initiating graceful shutdown");
    let _ = shutdown_tx.send(());
}

/// Wait for the database monitor to stop, reporting a hang or a panic.
/// Returns `true` when the monitor exited cleanly within `grace`.
async fn join_monitor(handle: JoinHandle<()>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "Database monitor task failed");
            false
        }
        Err(_) => {
            warn!(
                grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
                "Database monitor did not stop in time"
            );
            false
        }
    }
}
