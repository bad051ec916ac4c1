//! Use Cases Layer - Application Workflows
//!
//! Orchestrates ports to implement the service's instrumented
//! workflows.
//!
//! Use cases:
//! - `DatabaseHealthMonitor`: Periodic DB probe feeding `cv_database_connected`
//! - `InferenceService`: Classifier calls feeding inference time and prediction counts

pub mod db_health;
pub mod inference;

pub use db_health::DatabaseHealthMonitor;
pub use inference::InferenceService;
