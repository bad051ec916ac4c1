//! Instrument Model - Kinds, Shapes and Bucket Bounds
//!
//! Describes what a registered metric *is*, independent of the
//! Prometheus client that stores its values. Two definitions with the
//! same name refer to the same instrument only if their shapes match.

use std::fmt;

use crate::error::MetricsError;

/// Default histogram buckets (seconds), identical to the Prometheus
/// client defaults so dashboards built on them keep working.
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Kind of a registered instrument, as written on the `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// Single float gauge.
    Gauge,
    /// Single histogram.
    Histogram,
    /// Integer counter family keyed by labels.
    CounterVec,
    /// Integer gauge family keyed by labels.
    GaugeVec,
    /// Histogram family keyed by labels.
    HistogramVec,
}

impl InstrumentKind {
    /// Exposition type name (`gauge`, `histogram`, `counter`).
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Gauge | Self::GaugeVec => "gauge",
            Self::Histogram | Self::HistogramVec => "histogram",
            Self::CounterVec => "counter",
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labelled = matches!(self, Self::CounterVec | Self::GaugeVec | Self::HistogramVec);
        if labelled {
            write!(f, "labelled {}", self.type_name())
        } else {
            f.write_str(self.type_name())
        }
    }
}

/// Validated histogram upper bounds.
///
/// Non-empty, finite and strictly increasing. The `+Inf` bucket is
/// implicit and never stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketBounds(Vec<f64>);

impl BucketBounds {
    /// Validate `bounds` for the histogram called `name`.
    ///
    /// # Errors
    /// `MetricsError::InvalidBuckets` if the list is empty, contains a
    /// NaN or infinite bound, or is not strictly increasing.
    pub fn new(name: &str, bounds: &[f64]) -> Result<Self, MetricsError> {
        let invalid = |reason: String| MetricsError::InvalidBuckets {
            name: name.to_string(),
            reason,
        };

        if bounds.is_empty() {
            return Err(invalid("at least one bucket bound is required".into()));
        }

        if let Some(bad) = bounds.iter().find(|b| !b.is_finite()) {
            return Err(invalid(format!("bound {bad} is not finite")));
        }

        if let Some(pair) = bounds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(invalid(format!(
                "bounds must be strictly increasing, found {} followed by {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self(bounds.to_vec()))
    }

    /// Prometheus client defaults.
    pub fn default_seconds() -> Self {
        Self(DEFAULT_BUCKETS.to_vec())
    }

    /// Upper bounds in ascending order.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Owned copy for handing to the Prometheus client.
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.clone()
    }
}

/// Everything that identifies an instrument besides its name.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentShape {
    /// Instrument kind.
    pub kind: InstrumentKind,
    /// Help text emitted on the `# HELP` line.
    pub help: String,
    /// Ordered label names (empty for plain gauges/histograms).
    pub labels: Vec<String>,
    /// Bucket bounds, histograms only.
    pub buckets: Option<BucketBounds>,
}

impl InstrumentShape {
    /// Shape of an unlabelled gauge.
    pub fn gauge(help: &str) -> Self {
        Self {
            kind: InstrumentKind::Gauge,
            help: help.to_string(),
            labels: Vec::new(),
            buckets: None,
        }
    }

    /// Shape of an unlabelled histogram.
    pub fn histogram(help: &str, buckets: BucketBounds) -> Self {
        Self {
            kind: InstrumentKind::Histogram,
            help: help.to_string(),
            labels: Vec::new(),
            buckets: Some(buckets),
        }
    }

    /// Shape of a labelled family; `buckets` only for histogram families.
    pub fn family(
        kind: InstrumentKind,
        help: &str,
        labels: &[&str],
        buckets: Option<BucketBounds>,
    ) -> Self {
        Self {
            kind,
            help: help.to_string(),
            labels: labels.iter().map(ToString::to_string).collect(),
            buckets,
        }
    }
}
