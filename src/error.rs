//! Error types for the metrics registry and instrumentation facade.

use crate::domain::instrument::InstrumentKind;
use crate::domain::lifecycle::LifecycleState;

/// Failures raised while defining, updating or exposing metrics.
///
/// Definition errors happen at startup and are fatal. `InvalidMeasurement`
/// is the only variant the facade can produce at request time, and it is
/// logged and dropped instead of reaching the caller.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Name already registered with a different type or shape.
    #[error("metric `{name}` is already registered as a {existing} with a different shape")]
    DuplicateName {
        name: String,
        existing: InstrumentKind,
    },

    /// Histogram bucket list rejected.
    #[error("invalid buckets for histogram `{name}`: {reason}")]
    InvalidBuckets { name: String, reason: String },

    /// Measurement cannot be recorded.
    #[error("invalid measurement {value}: {reason}")]
    InvalidMeasurement { value: f64, reason: &'static str },

    /// `setup` was already called for this facade.
    #[error("metrics setup already ran (state: {0})")]
    AlreadySetUp(LifecycleState),

    /// Rejected by the Prometheus client (bad metric or label name, ...).
    #[error("prometheus registration failed: {0}")]
    Registration(#[from] prometheus::Error),

    /// Snapshot could not be rendered as text.
    #[error("failed to encode metrics snapshot: {0}")]
    Encoding(String),
}
