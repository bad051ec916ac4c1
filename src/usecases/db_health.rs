//! Database Health Monitor - Connectivity Gauge Driver
//!
//! Probes the database on a fixed interval and publishes the outcome
//! to `cv_database_connected` and to the readiness flag. Probe failures
//! are recorded as "disconnected", never propagated.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, warn};

use crate::ports::database::DatabaseProbe;
use crate::ports::telemetry::InferenceTelemetry;

/// Periodic database probe feeding the connectivity gauge.
pub struct DatabaseHealthMonitor<P> {
  /// Connectivity check.
  probe: P,
  /// Metrics sink.
  telemetry: Arc<dyn InferenceTelemetry>,
  /// Last probe outcome, shared with the readiness route.
  connected: Arc<AtomicBool>,
  /// Delay between probes.
  interval: Duration,
}

impl<P: DatabaseProbe> DatabaseHealthMonitor<P> {
  /// Create a monitor. The database counts as disconnected until the
  /// first probe succeeds.
  pub fn new(probe: P, telemetry: Arc<dyn InferenceTelemetry>, interval: Duration) -> Self {
    Self {
      probe,
      telemetry,
      connected: Arc::new(AtomicBool::new(false)),
      interval,
    }
  }

  /// Flag holding the last probe outcome.
  pub fn status_flag(&self) -> Arc<AtomicBool> {
    Arc::clone(&self.connected)
  }

  /// Probe once and record the result.
  pub async fn check_once(&self) -> bool {
    let connected = match self.probe.ping().await {
      Ok(()) => true,
      Err(e) => {
        warn!(target_addr = self.probe.target(), error = %e, "Database probe failed");
        false
      }
    };

    self.telemetry.update_db_status(connected);
    let previous = self.connected.swap(connected, Ordering::Relaxed);
    if previous != connected {
      if connected {
        info!(target_addr = self.probe.target(), "Database reachable");
      } else {
        warn!(target_addr = self.probe.target(), "Database connection lost");
      }
    }
    connected
  }

  /// Probe every `interval` until shutdown is broadcast.
  #[instrument(skip_all)]
  pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
      target_addr = self.probe.target(),
      interval_secs = self.interval.as_secs(),
      "Database monitor started"
    );

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Database monitor received shutdown signal");
          break;
        }
        _ = ticker.tick() => {
          self.check_once().await;
        }
      }
    }
  }
}
