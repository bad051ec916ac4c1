//! Metrics and Monitoring Adapters
//!
//! Prometheus-backed metric registry, the instrumentation facade used by
//! application code, the HTTP request collector and the health probes.

pub mod health;
pub mod http;
pub mod instrumentation;
pub mod registry;

pub use health::HealthState;
pub use http::{CollectorOptions, RequestCollector};
pub use instrumentation::{Instrumentation, InstrumentationOptions};
pub use registry::MetricRegistry;
