//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;
use crate::domain::BucketBounds;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "CV_METRICS_CONFIG";

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    path = %path.display(),
    metrics_enabled = config.metrics.enabled,
    endpoint = %config.metrics.endpoint,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Load `path` if it exists, otherwise fall back to validated defaults.
///
/// # Errors
/// Same as [`load_config`] for an existing file.
pub fn load_or_default(path: &str) -> Result<AppConfig> {
  if Path::new(path).exists() {
    load_config(path)
  } else {
    let config = AppConfig::default();
    validate_config(&config)?;
    Ok(config)
  }
}

/// Parse and validate TOML text.
///
/// # Errors
/// Parse or validation failures.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - A scrape endpoint that is a valid route path
/// - Histogram bucket lists that are non-empty and strictly increasing
/// - Non-empty addresses
/// - Positive probe interval and timeout
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.bind_address.is_empty(),
    "service.bind_address must not be empty"
  );

  // Metrics validation
  anyhow::ensure!(
    config.metrics.endpoint.starts_with('/') && config.metrics.endpoint.len() > 1,
    "metrics.endpoint must be a path like \"/metrics\", got {:?}",
    config.metrics.endpoint
  );
  BucketBounds::new("metrics.inference_buckets", &config.metrics.inference_buckets)?;
  BucketBounds::new("metrics.request_buckets", &config.metrics.request_buckets)?;

  // Database validation
  anyhow::ensure!(
    !config.database.address.is_empty(),
    "database.address must not be empty"
  );
  anyhow::ensure!(
    config.database.probe_interval_seconds > 0,
    "database.probe_interval_seconds must be positive"
  );
  anyhow::ensure!(
    config.database.probe_timeout_ms > 0,
    "database.probe_timeout_ms must be positive"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_missing_file_falls_back_to_defaults() {
    let config = load_or_default("nonexistent.toml").unwrap();
    assert_eq!(config.metrics.endpoint, "/metrics");
    assert!(!config.metrics.enabled);
    assert_eq!(config.database.probe_interval_seconds, 15);
  }

  #[test]
  fn test_empty_document_uses_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.service.bind_address, "0.0.0.0:8000");
    assert_eq!(config.metrics.inference_buckets.len(), 11);
  }

  #[test]
  fn test_partial_sections() {
    let config = parse_config(
      r#"
      [metrics]
      enabled = true
      inference_buckets = [0.05, 0.1, 0.5]
      excluded_handlers = ["/live"]

      [database]
      address = "db:5432"
      "#,
    )
    .unwrap();
    assert!(config.metrics.enabled);
    assert_eq!(config.metrics.inference_buckets, vec![0.05, 0.1, 0.5]);
    assert_eq!(config.database.address, "db:5432");
    assert_eq!(config.database.probe_timeout_ms, 2_000);

    let options = config.metrics.instrumentation_options();
    assert_eq!(options.collector.excluded_handlers, vec!["/live".to_string()]);
  }

  #[test]
  fn test_rejects_unsorted_buckets() {
    let result = parse_config("[metrics]\ninference_buckets = [1.0, 0.5]\n");
    assert!(result.is_err());
  }

  #[test]
  fn test_rejects_relative_endpoint() {
    assert!(parse_config("[metrics]\nendpoint = \"metrics\"\n").is_err());
    assert!(parse_config("[metrics]\nendpoint = \"/\"\n").is_err());
  }

  #[test]
  fn test_rejects_zero_probe_interval() {
    assert!(parse_config("[database]\nprobe_interval_seconds = 0\n").is_err());
  }
}
