//! Telemetry Port - Instrumentation Calls Made by Application Code
//!
//! Health checks and inference handlers record through this trait so
//! they never depend on the Prometheus client directly. The concrete
//! implementation is `adapters::metrics::Instrumentation`.
//!
//! Contract:
//! - Every method is infallible from the caller's point of view
//! - Invalid measurements are dropped by the implementation, not raised
//! - Safe to call concurrently from any number of request handlers

use crate::domain::measurement::PredictionClass;

/// Metrics sink for the inference API.
pub trait InferenceTelemetry: Send + Sync + 'static {
  /// Record database connectivity (1 = connected, 0 = disconnected).
  fn update_db_status(&self, is_connected: bool);

  /// Record one inference duration, given in **milliseconds**.
  fn track_inference_time(&self, duration_ms: f64);

  /// Count one prediction for the given class.
  fn track_prediction(&self, class: PredictionClass);
}
