//! Domain layer - Metric model and measurement types.
//!
//! Pure value types shared by the registry, the facade and the use
//! cases. Nothing here touches the Prometheus client or the network.

pub mod instrument;
pub mod lifecycle;
pub mod measurement;

// Re-export core types for convenience
pub use instrument::{BucketBounds, DEFAULT_BUCKETS, InstrumentKind, InstrumentShape};
pub use lifecycle::{ENABLE_PROMETHEUS_ENV, LifecycleState, MetricsMode};
pub use measurement::{InferenceDuration, Prediction, PredictionClass};
