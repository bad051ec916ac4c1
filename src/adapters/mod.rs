//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (Prometheus client, axum, TCP sockets).
//!
//! Adapter categories:
//! - `metrics`: Metric registry, instrumentation facade, /metrics and health routes
//! - `database`: Database connectivity probes

pub mod database;
pub mod metrics;
