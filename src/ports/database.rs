//! Database Probe Port - Connectivity Check Interface
//!
//! Abstracts "is the database reachable right now" so the health
//! monitor can be tested without a running PostgreSQL.

use async_trait::async_trait;

/// Cheap connectivity check against the backing database.
#[async_trait]
pub trait DatabaseProbe: Send + Sync + 'static {
  /// Returns `Ok(())` when the database answered within the probe's
  /// own timeout.
  async fn ping(&self) -> anyhow::Result<()>;

  /// Human-readable target, used in log fields.
  fn target(&self) -> &str;
}
