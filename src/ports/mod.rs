//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use cases require from the
//! outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `InferenceTelemetry`: Metric updates from application code
//! - `DatabaseProbe`: Database connectivity checks
//! - `Classifier`: Model inference

pub mod classifier;
pub mod database;
pub mod telemetry;

pub use classifier::Classifier;
pub use database::DatabaseProbe;
pub use telemetry::InferenceTelemetry;
