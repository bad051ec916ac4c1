//! Prometheus Metric Registry - Instrument Definitions and Snapshots
//!
//! Wraps a `prometheus::Registry` with a name index so that every
//! instrument is defined exactly once per registry. Redefining a name
//! with the same shape hands back the existing instrument; any other
//! shape is rejected before the Prometheus registry is touched.
//!
//! The registry is constructed explicitly and shared behind an `Arc`.
//! Nothing here is process-global, so tests build as many isolated
//! registries as they need.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use prometheus::core::Collector;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, IntCounterVec,
    IntGaugeVec, Opts, Registry, TextEncoder,
};
use tracing::debug;

use crate::domain::instrument::{BucketBounds, InstrumentKind, InstrumentShape};
use crate::error::MetricsError;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Type-erased handle stored in the name index.
#[derive(Clone)]
enum Handle {
    Gauge(Gauge),
    Histogram(Histogram),
    CounterVec(IntCounterVec),
    GaugeVec(IntGaugeVec),
    HistogramVec(HistogramVec),
}

impl Handle {
    const fn kind(&self) -> InstrumentKind {
        match self {
            Self::Gauge(_) => InstrumentKind::Gauge,
            Self::Histogram(_) => InstrumentKind::Histogram,
            Self::CounterVec(_) => InstrumentKind::CounterVec,
            Self::GaugeVec(_) => InstrumentKind::GaugeVec,
            Self::HistogramVec(_) => InstrumentKind::HistogramVec,
        }
    }

    fn collector(&self) -> Box<dyn Collector> {
        match self {
            Self::Gauge(m) => Box::new(m.clone()),
            Self::Histogram(m) => Box::new(m.clone()),
            Self::CounterVec(m) => Box::new(m.clone()),
            Self::GaugeVec(m) => Box::new(m.clone()),
            Self::HistogramVec(m) => Box::new(m.clone()),
        }
    }
}

struct Instrument {
    shape: InstrumentShape,
    handle: Handle,
}

/// Process-wide set of named instruments.
pub struct MetricRegistry {
    /// Prometheus registry holding the collectors.
    registry: Registry,
    /// Name index, sorted so `names()` is deterministic.
    instruments: Mutex<BTreeMap<String, Instrument>>,
}

impl MetricRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            instruments: Mutex::new(BTreeMap::new()),
        }
    }

    /// Define an unlabelled gauge.
    ///
    /// # Errors
    /// `DuplicateName` if `name` exists with another shape,
    /// `Registration` if Prometheus rejects the name.
    pub fn define_gauge(&self, name: &str, help: &str) -> Result<Gauge, MetricsError> {
        let handle = self.define(name, InstrumentShape::gauge(help), || {
            Ok(Handle::Gauge(Gauge::with_opts(Opts::new(name, help))?))
        })?;
        match handle {
            Handle::Gauge(g) => Ok(g),
            other => Err(duplicate(name, other.kind())),
        }
    }

    /// Define an unlabelled histogram with fixed bucket bounds.
    ///
    /// # Errors
    /// `InvalidBuckets` if `buckets` is empty, non-finite or not strictly
    /// increasing; otherwise as for [`Self::define_gauge`].
    pub fn define_histogram(
        &self,
        name: &str,
        help: &str,
        buckets: &[f64],
    ) -> Result<Histogram, MetricsError> {
        let bounds = BucketBounds::new(name, buckets)?;
        let opts = HistogramOpts::new(name, help).buckets(bounds.to_vec());
        let handle = self.define(name, InstrumentShape::histogram(help, bounds), || {
            Ok(Handle::Histogram(Histogram::with_opts(opts)?))
        })?;
        match handle {
            Handle::Histogram(h) => Ok(h),
            other => Err(duplicate(name, other.kind())),
        }
    }

    /// Define an integer counter family keyed by `labels`.
    ///
    /// # Errors
    /// As for [`Self::define_gauge`].
    pub fn define_counter_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<IntCounterVec, MetricsError> {
        let shape = InstrumentShape::family(InstrumentKind::CounterVec, help, labels, None);
        let handle = self.define(name, shape, || {
            Ok(Handle::CounterVec(IntCounterVec::new(Opts::new(name, help), labels)?))
        })?;
        match handle {
            Handle::CounterVec(c) => Ok(c),
            other => Err(duplicate(name, other.kind())),
        }
    }

    /// Define an integer gauge family keyed by `labels`.
    ///
    /// # Errors
    /// As for [`Self::define_gauge`].
    pub fn define_gauge_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<IntGaugeVec, MetricsError> {
        let shape = InstrumentShape::family(InstrumentKind::GaugeVec, help, labels, None);
        let handle = self.define(name, shape, || {
            Ok(Handle::GaugeVec(IntGaugeVec::new(Opts::new(name, help), labels)?))
        })?;
        match handle {
            Handle::GaugeVec(g) => Ok(g),
            other => Err(duplicate(name, other.kind())),
        }
    }

    /// Define a histogram family keyed by `labels`.
    ///
    /// # Errors
    /// As for [`Self::define_histogram`].
    pub fn define_histogram_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
        buckets: &[f64],
    ) -> Result<HistogramVec, MetricsError> {
        let bounds = BucketBounds::new(name, buckets)?;
        let opts = HistogramOpts::new(name, help).buckets(bounds.to_vec());
        let shape =
            InstrumentShape::family(InstrumentKind::HistogramVec, help, labels, Some(bounds));
        let handle = self.define(name, shape, || {
            Ok(Handle::HistogramVec(HistogramVec::new(opts, labels)?))
        })?;
        match handle {
            Handle::HistogramVec(h) => Ok(h),
            other => Err(duplicate(name, other.kind())),
        }
    }

    /// Render every instrument in the text exposition format.
    ///
    /// Families come out sorted by name. Families with no observed label
    /// combination yet are omitted by the Prometheus gatherer. Integral
    /// sample values are written without a fractional part (`db_up 0`,
    /// not `db_up 0.0`).
    ///
    /// # Errors
    /// `Encoding` if the encoder fails or emits invalid UTF-8.
    pub fn snapshot(&self) -> Result<String, MetricsError> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    /// Names of all defined instruments, sorted.
    pub fn names(&self) -> Vec<String> {
        self.instruments.lock().keys().cloned().collect()
    }

    /// Shape an instrument was defined with.
    pub fn shape(&self, name: &str) -> Option<InstrumentShape> {
        self.instruments.lock().get(name).map(|i| i.shape.clone())
    }

    /// Look up or create an instrument under the index lock.
    ///
    /// The index is only updated after Prometheus accepted the collector,
    /// so a failed definition leaves both untouched.
    fn define(
        &self,
        name: &str,
        shape: InstrumentShape,
        build: impl FnOnce() -> prometheus::Result<Handle>,
    ) -> Result<Handle, MetricsError> {
        let mut instruments = self.instruments.lock();

        if let Some(existing) = instruments.get(name) {
            if existing.shape == shape {
                debug!(metric = name, "Reusing existing instrument");
                return Ok(existing.handle.clone());
            }
            return Err(duplicate(name, existing.shape.kind));
        }

        let handle = build()?;
        self.registry.register(handle.collector())?;

        debug!(metric = name, kind = %shape.kind, "Instrument registered");
        instruments.insert(
            name.to_string(),
            Instrument {
                shape,
                handle: handle.clone(),
            },
        );
        Ok(handle)
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate(name: &str, existing: InstrumentKind) -> MetricsError {
    MetricsError::DuplicateName {
        name: name.to_string(),
        existing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_round_trip_through_snapshot() {
        let registry = MetricRegistry::new();
        let gauge = registry.define_gauge("db_up", "Database up").unwrap();
        gauge.set(1.0);

        let text = registry.snapshot().unwrap();
        assert!(text.contains("# HELP db_up Database up"));
        assert!(text.contains("# TYPE db_up gauge"));
        assert!(text.lines().any(|l| l == "db_up 1"));
    }

    #[test]
    fn test_same_shape_returns_existing_instrument() {
        let registry = MetricRegistry::new();
        let a = registry.define_gauge("g", "help").unwrap();
        let b = registry.define_gauge("g", "help").unwrap();
        a.set(7.0);
        assert!((b.get() - 7.0).abs() < f64::EPSILON);
        assert_eq!(registry.names(), vec!["g".to_string()]);
    }

    #[test]
    fn test_gauge_then_histogram_is_duplicate() {
        let registry = MetricRegistry::new();
        registry.define_gauge("m", "help").unwrap();
        let err = registry.define_histogram("m", "help", &[1.0])
            .err()
            .expect("definition should fail");
        assert!(matches!(
            err,
            MetricsError::DuplicateName { existing: InstrumentKind::Gauge, .. }
        ));
    }

    #[test]
    fn test_different_help_is_duplicate() {
        let registry = MetricRegistry::new();
        registry.define_gauge("m", "one").unwrap();
        assert!(registry.define_gauge("m", "two").is_err());
    }

    #[test]
    fn test_conflicting_buckets_leave_registry_unchanged() {
        let registry = MetricRegistry::new();
        let h = registry.define_histogram("lat", "latency", &[0.1, 1.0]).unwrap();
        h.observe(0.5);
        let before = registry.snapshot().unwrap();

        let err = registry.define_histogram("lat", "latency", &[0.2, 2.0])
            .err()
            .expect("definition should fail");
        assert!(matches!(err, MetricsError::DuplicateName { .. }));
        assert_eq!(registry.snapshot().unwrap(), before);
        assert_eq!(
            registry.shape("lat").unwrap().buckets.unwrap().as_slice(),
            &[0.1, 1.0]
        );
    }

    #[test]
    fn test_invalid_buckets_register_nothing() {
        let registry = MetricRegistry::new();
        let err = registry.define_histogram("lat", "latency", &[1.0, 0.5])
            .err()
            .expect("definition should fail");
        assert!(matches!(err, MetricsError::InvalidBuckets { .. }));
        assert!(registry.names().is_empty());
        // The name is still free after the failed attempt.
        assert!(registry.define_histogram("lat", "latency", &[0.5, 1.0]).is_ok());
    }

    #[test]
    fn test_invalid_metric_name_rejected_by_prometheus() {
        let registry = MetricRegistry::new();
        let err = registry.define_gauge("not a name", "help")
            .err()
            .expect("definition should fail");
        assert!(matches!(err, MetricsError::Registration(_)));
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_histogram_snapshot_lines() {
        let registry = MetricRegistry::new();
        let h = registry.define_histogram("lat", "latency", &[0.1, 1.0]).unwrap();
        h.observe(0.05);
        h.observe(0.5);

        let text = registry.snapshot().unwrap();
        assert!(text.contains("# TYPE lat histogram"));
        assert!(text.contains("lat_bucket{le=\"0.1\"} 1"));
        assert!(text.contains("lat_bucket{le=\"1\"} 2"));
        assert!(text.contains("lat_bucket{le=\"+Inf\"} 2"));
        assert!(text.contains("lat_count 2"));
    }

    #[test]
    fn test_snapshot_sorted_by_name() {
        let registry = MetricRegistry::new();
        registry.define_gauge("zeta", "z").unwrap();
        registry.define_gauge("alpha", "a").unwrap();
        registry.define_gauge("mid", "m").unwrap();

        let text = registry.snapshot().unwrap();
        let order: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("# TYPE "))
            .map(|l| l.split(' ').next().unwrap_or_default())
            .collect();
        assert_eq!(order, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_labelled_families() {
        let registry = MetricRegistry::new();
        let c = registry.define_counter_vec("reqs_total", "requests", &["status"]).unwrap();
        let g = registry.define_gauge_vec("busy", "busy", &["handler"]).unwrap();
        let h = registry
            .define_histogram_vec("dur", "duration", &["handler"], &[0.1])
            .unwrap();
        c.with_label_values(&["2xx"]).inc();
        g.with_label_values(&["/a"]).inc();
        h.with_label_values(&["/a"]).observe(0.01);

        let text = registry.snapshot().unwrap();
        assert!(text.contains("reqs_total{status=\"2xx\"} 1"));
        assert!(text.contains("busy{handler=\"/a\"} 1"));
        assert!(text.contains("dur_count{handler=\"/a\"} 1"));

        // Same name, different labels.
        assert!(registry.define_counter_vec("reqs_total", "requests", &["code"]).is_err());
    }

    #[test]
    fn test_isolated_registries_do_not_share_names() {
        let a = MetricRegistry::new();
        let b = MetricRegistry::new();
        a.define_gauge("g", "help").unwrap();
        assert!(b.define_histogram("g", "help", &[1.0]).is_ok());
    }

    /// Collector emitting a family the text encoder refuses.
    struct NamelessFamily {
        desc: prometheus::core::Desc,
    }

    impl Collector for NamelessFamily {
        fn desc(&self) -> Vec<&prometheus::core::Desc> {
            vec![&self.desc]
        }

        fn collect(&self) -> Vec<prometheus::proto::MetricFamily> {
            let mut family = prometheus::proto::MetricFamily::default();
            family.mut_metric().push(prometheus::proto::Metric::default());
            vec![family]
        }
    }

    #[test]
    fn test_encoding_failure_surfaces_as_error_and_500() {
        let registry = MetricRegistry::new();
        registry.define_gauge("db_up", "Database up").unwrap();
        let desc = prometheus::core::Desc::new(
            "broken".to_string(),
            "broken".to_string(),
            Vec::new(),
            std::collections::HashMap::new(),
        )
        .unwrap();
        registry
            .registry
            .register(Box::new(NamelessFamily { desc }))
            .unwrap();

        assert!(matches!(registry.snapshot(), Err(MetricsError::Encoding(_))));

        let response = super::super::http::render_metrics(&registry);
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
