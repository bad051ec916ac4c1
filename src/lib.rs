//! CV Metrics — Library Root
//!
//! Prometheus instrumentation for the cats/dogs inference API: a metric
//! registry, the instrumentation facade used by health checks and
//! inference handlers, and the one-shot `/metrics` setup.
//!
//! Re-exports all modules for integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;

pub use adapters::metrics::{Instrumentation, InstrumentationOptions, MetricRegistry};
pub use domain::{LifecycleState, MetricsMode};
pub use error::MetricsError;
