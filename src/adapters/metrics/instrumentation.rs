//! Instrumentation Facade - CV Inference Metrics
//!
//! Owns the application instruments and the one-shot setup that mounts
//! the scrape endpoint on the host router:
//! - `cv_database_connected` (gauge): 1 = connected, 0 = disconnected
//! - `cv_inference_time_seconds` (histogram): model inference latency
//! - `cv_predictions_total{result}` (counter): predictions per class
//!
//! Updates are lock-free (Prometheus atomics) and never fail the caller.
//! Measurements that cannot be recorded are logged and dropped.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use once_cell::sync::OnceCell;
use prometheus::{Gauge, Histogram, IntCounterVec};
use tracing::{debug, info, warn};

use super::http::{CollectorOptions, RequestCollector, render_metrics, track_requests};
use super::registry::MetricRegistry;
use crate::domain::lifecycle::{LifecycleState, MetricsMode};
use crate::domain::measurement::{InferenceDuration, PredictionClass};
use crate::domain::DEFAULT_BUCKETS;
use crate::error::MetricsError;
use crate::ports::telemetry::InferenceTelemetry;

pub const DATABASE_CONNECTED: &str = "cv_database_connected";
pub const INFERENCE_TIME_SECONDS: &str = "cv_inference_time_seconds";
pub const PREDICTIONS_TOTAL: &str = "cv_predictions_total";

/// Default scrape route.
pub const DEFAULT_ENDPOINT: &str = "/metrics";

/// Construction options for [`Instrumentation`].
#[derive(Debug, Clone)]
pub struct InstrumentationOptions {
    /// Bucket bounds (seconds) for `cv_inference_time_seconds`.
    pub inference_buckets: Vec<f64>,
    /// Route the snapshot is served on when enabled.
    pub endpoint: String,
    /// Request collector settings.
    pub collector: CollectorOptions,
}

impl Default for InstrumentationOptions {
    fn default() -> Self {
        Self {
            inference_buckets: DEFAULT_BUCKETS.to_vec(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            collector: CollectorOptions::default(),
        }
    }
}

/// Metric facade handed to health checks and inference handlers.
pub struct Instrumentation {
    registry: Arc<MetricRegistry>,
    database_connected: Gauge,
    inference_time: Histogram,
    predictions: IntCounterVec,
    options: InstrumentationOptions,
    state: OnceCell<LifecycleState>,
}

impl Instrumentation {
    /// Define the application instruments in `registry`.
    ///
    /// # Errors
    /// Fatal definition errors (`DuplicateName`, `InvalidBuckets`,
    /// `Registration`). The caller must not start serving on failure.
    pub fn new(
        registry: Arc<MetricRegistry>,
        options: InstrumentationOptions,
    ) -> Result<Self, MetricsError> {
        let database_connected = registry.define_gauge(
            DATABASE_CONNECTED,
            "Database connection status (1=connected, 0=disconnected)",
        )?;
        let inference_time = registry.define_histogram(
            INFERENCE_TIME_SECONDS,
            "Model inference time in seconds",
            &options.inference_buckets,
        )?;
        let predictions = registry.define_counter_vec(
            PREDICTIONS_TOTAL,
            "Total number of predictions by predicted class",
            &["result"],
        )?;

        info!(
            instruments = registry.names().len(),
            buckets = options.inference_buckets.len(),
            "Instrumentation registered"
        );

        Ok(Self {
            registry,
            database_connected,
            inference_time,
            predictions,
            options,
            state: OnceCell::new(),
        })
    }

    /// Set the connectivity gauge to 1.0 or 0.0. Last write wins.
    pub fn update_db_status(&self, is_connected: bool) {
        self.database_connected
            .set(if is_connected { 1.0 } else { 0.0 });
        debug!(connected = is_connected, "Database status updated");
    }

    /// Record one inference duration given in **milliseconds**.
    ///
    /// Stored in seconds. Negative or non-finite input is logged and
    /// dropped; use [`Self::try_track_inference_time`] to observe the
    /// rejection.
    pub fn track_inference_time(&self, duration_ms: f64) {
        if let Err(e) = self.try_track_inference_time(duration_ms) {
            warn!(error = %e, "Dropping inference time measurement");
        }
    }

    /// Like [`Self::track_inference_time`] but returns the rejection.
    ///
    /// # Errors
    /// `InvalidMeasurement` for negative, NaN or infinite input.
    pub fn try_track_inference_time(&self, duration_ms: f64) -> Result<(), MetricsError> {
        let duration = InferenceDuration::from_millis(duration_ms)?;
        self.track_inference(duration);
        Ok(())
    }

    /// Record an already validated duration (e.g. from `Instant::elapsed`).
    pub fn track_inference(&self, duration: impl Into<InferenceDuration>) {
        self.inference_time.observe(duration.into().as_secs_f64());
    }

    /// Count one prediction.
    pub fn track_prediction(&self, class: PredictionClass) {
        self.predictions.with_label_values(&[class.as_label()]).inc();
    }

    /// Attach the request collector and scrape route, or do nothing.
    ///
    /// Runs once per facade. When `mode` is disabled the router comes
    /// back untouched. On error the state stays `Uninitialized`.
    ///
    /// The collector layer only wraps routes already on `router`; routes
    /// added afterwards are not recorded, so call this on the finished
    /// router.
    ///
    /// # Errors
    /// `AlreadySetUp` on a second call; definition errors from the
    /// request collector instruments.
    pub fn setup<S>(&self, router: Router<S>, mode: MetricsMode) -> Result<Router<S>, MetricsError>
    where
        S: Clone + Send + Sync + 'static,
    {
        if let Some(state) = self.state.get() {
            return Err(MetricsError::AlreadySetUp(*state));
        }

        let router = match mode {
            MetricsMode::Enabled => {
                let router = self.expose(router)?;
                info!(endpoint = %self.options.endpoint, "Prometheus metrics enabled");
                router
            }
            MetricsMode::Disabled => {
                info!("Prometheus metrics disabled");
                router
            }
        };

        self.state
            .set(mode.into())
            .map_err(|_| MetricsError::AlreadySetUp(self.state()))?;
        Ok(router)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
            .get()
            .copied()
            .unwrap_or(LifecycleState::Uninitialized)
    }

    /// Registry backing this facade.
    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    /// Current value of `cv_database_connected`.
    pub fn db_status(&self) -> f64 {
        self.database_connected.get()
    }

    /// The inference histogram, for reading count and sum.
    pub fn inference_histogram(&self) -> &Histogram {
        &self.inference_time
    }

    /// Predictions counted for `class` so far.
    pub fn prediction_count(&self, class: PredictionClass) -> u64 {
        self.predictions.with_label_values(&[class.as_label()]).get()
    }

    fn expose<S>(&self, router: Router<S>) -> Result<Router<S>, MetricsError>
    where
        S: Clone + Send + Sync + 'static,
    {
        let collector = Arc::new(RequestCollector::register(
            &self.registry,
            &self.options.collector,
        )?);
        let registry = Arc::clone(&self.registry);

        // Route first so the collector layer also wraps the scrape endpoint.
        Ok(router
            .route(
                &self.options.endpoint,
                get(move || {
                    let registry = Arc::clone(&registry);
                    async move { render_metrics(&registry) }
                }),
            )
            .layer(middleware::from_fn_with_state(collector, track_requests)))
    }
}

impl InferenceTelemetry for Instrumentation {
    fn update_db_status(&self, is_connected: bool) {
        Self::update_db_status(self, is_connected);
    }

    fn track_inference_time(&self, duration_ms: f64) {
        Self::track_inference_time(self, duration_ms);
    }

    fn track_prediction(&self, class: PredictionClass) {
        Self::track_prediction(self, class);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn facade() -> Instrumentation {
        Instrumentation::new(Arc::new(MetricRegistry::new()), InstrumentationOptions::default())
            .unwrap()
    }

    #[test]
    fn test_db_status_last_write_wins() {
        let m = facade();
        m.update_db_status(true);
        m.update_db_status(false);
        assert_eq!(m.db_status(), 0.0);
        m.update_db_status(true);
        m.update_db_status(true);
        assert_eq!(m.db_status(), 1.0);
    }

    #[test]
    fn test_inference_time_stored_in_seconds() {
        let m = facade();
        m.track_inference_time(100.0);
        m.track_inference_time(400.0);
        let h = m.inference_histogram();
        assert_eq!(h.get_sample_count(), 2);
        assert!((h.get_sample_sum() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_negative_inference_time_dropped() {
        let m = facade();
        m.track_inference_time(-5.0);
        m.track_inference_time(f64::NAN);
        assert_eq!(m.inference_histogram().get_sample_count(), 0);
        assert!(matches!(
            m.try_track_inference_time(-5.0),
            Err(MetricsError::InvalidMeasurement { .. })
        ));
    }

    #[test]
    fn test_track_std_duration() {
        let m = facade();
        m.track_inference(Duration::from_millis(20));
        assert!((m.inference_histogram().get_sample_sum() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_prediction_counter_per_class() {
        let m = facade();
        m.track_prediction(PredictionClass::Cat);
        m.track_prediction(PredictionClass::Cat);
        m.track_prediction(PredictionClass::Dog);
        assert_eq!(m.prediction_count(PredictionClass::Cat), 2);
        assert_eq!(m.prediction_count(PredictionClass::Dog), 1);
    }

    #[test]
    fn test_setup_runs_once() {
        let m = facade();
        assert_eq!(m.state(), LifecycleState::Uninitialized);
        let _router: Router = m.setup(Router::new(), MetricsMode::Disabled).unwrap();
        assert_eq!(m.state(), LifecycleState::Disabled);

        let err = m.setup(Router::<()>::new(), MetricsMode::Enabled)
            .err()
            .expect("second setup should fail");
        assert!(matches!(err, MetricsError::AlreadySetUp(LifecycleState::Disabled)));
        assert_eq!(m.state(), LifecycleState::Disabled);
    }

    #[test]
    fn test_disabled_setup_registers_no_request_metrics() {
        let m = facade();
        let _router: Router = m.setup(Router::new(), MetricsMode::Disabled).unwrap();
        let names = m.registry().names();
        assert!(!names.iter().any(|n| n.starts_with("http_")));
    }

    #[test]
    fn test_enabled_setup_registers_request_metrics() {
        let m = facade();
        let _router: Router = m.setup(Router::new(), MetricsMode::Enabled).unwrap();
        assert_eq!(m.state(), LifecycleState::Active);
        let names = m.registry().names();
        assert!(names.contains(&"http_requests_total".to_string()));
        assert!(names.contains(&"http_requests_inprogress".to_string()));
    }

    #[test]
    fn test_failed_setup_stays_uninitialized() {
        let registry = Arc::new(MetricRegistry::new());
        // Squat on a collector name with another type.
        registry.define_gauge("http_requests_total", "taken").unwrap();
        let m = Instrumentation::new(registry, InstrumentationOptions::default()).unwrap();

        let result = m.setup(Router::<()>::new(), MetricsMode::Enabled);
        assert!(matches!(result, Err(MetricsError::DuplicateName { .. })));
        assert_eq!(m.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_new_rejects_bad_buckets() {
        let options = InstrumentationOptions {
            inference_buckets: vec![1.0, 0.1],
            ..InstrumentationOptions::default()
        };
        let result = Instrumentation::new(Arc::new(MetricRegistry::new()), options);
        assert!(matches!(result, Err(MetricsError::InvalidBuckets { .. })));
    }
}
