//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. Every field
//! has a default, so the service also starts without a config file.
//! `ENABLE_PROMETHEUS` overrides `metrics.enabled` when set.

pub mod loader;

use serde::Deserialize;

use crate::adapters::metrics::{CollectorOptions, InstrumentationOptions};
use crate::domain::{DEFAULT_BUCKETS, MetricsMode};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Service identity and HTTP binding.
  pub service: ServiceConfig,
  /// Prometheus exposition settings.
  pub metrics: MetricsConfig,
  /// Database probe settings.
  pub database: DatabaseConfig,
}

impl AppConfig {
  /// Decide the metrics mode once, from the environment and this config.
  pub fn metrics_mode(&self) -> MetricsMode {
    MetricsMode::from_env(self.metrics.enabled)
  }
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  pub log_level: String,
  /// HTTP bind address.
  pub bind_address: String,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      name: "cv-inference-api".to_string(),
      log_level: default_log_level(),
      bind_address: "0.0.0.0:8000".to_string(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
  /// Enable Prometheus exposition when `ENABLE_PROMETHEUS` is unset.
  pub enabled: bool,
  /// Scrape route.
  pub endpoint: String,
  /// Buckets (seconds) for `cv_inference_time_seconds`.
  pub inference_buckets: Vec<f64>,
  /// Buckets (seconds) for `http_request_duration_seconds`.
  pub request_buckets: Vec<f64>,
  /// Route templates the request collector ignores.
  pub excluded_handlers: Vec<String>,
  /// Report status classes (`2xx`) instead of exact codes.
  pub group_status_codes: bool,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      endpoint: "/metrics".to_string(),
      inference_buckets: DEFAULT_BUCKETS.to_vec(),
      request_buckets: DEFAULT_BUCKETS.to_vec(),
      excluded_handlers: Vec::new(),
      group_status_codes: true,
    }
  }
}

impl MetricsConfig {
  /// Facade options derived from this section.
  pub fn instrumentation_options(&self) -> InstrumentationOptions {
    InstrumentationOptions {
      inference_buckets: self.inference_buckets.clone(),
      endpoint: self.endpoint.clone(),
      collector: CollectorOptions {
        buckets: self.request_buckets.clone(),
        excluded_handlers: self.excluded_handlers.clone(),
        group_status_codes: self.group_status_codes,
      },
    }
  }
}

/// Database probe configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
  /// `host:port` of the PostgreSQL server.
  pub address: String,
  /// Delay between probes (seconds).
  pub probe_interval_seconds: u64,
  /// Connect timeout per probe (milliseconds).
  pub probe_timeout_ms: u64,
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self {
      address: "127.0.0.1:5432".to_string(),
      probe_interval_seconds: 15,
      probe_timeout_ms: 2_000,
    }
  }
}

fn default_log_level() -> String {
  "info".to_string()
}
