//! TCP Database Probe - Reachability Check
//!
//! Opens a TCP connection to the database address and closes it again.
//! That is enough to tell "PostgreSQL is down or unreachable" apart from
//! "up", without pulling a database driver into the metrics service.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::ports::database::DatabaseProbe;

/// Probe connecting to `address` with a bounded timeout.
#[derive(Debug, Clone)]
pub struct TcpDatabaseProbe {
    address: String,
    timeout: Duration,
}

impl TcpDatabaseProbe {
    /// Create a probe for `host:port`.
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DatabaseProbe for TcpDatabaseProbe {
    async fn ping(&self) -> Result<()> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.address))
            .await
            .with_context(|| {
                format!("Timed out after {:?} connecting to {}", self.timeout, self.address)
            })?
            .with_context(|| format!("Failed to connect to {}", self.address))?;
        drop(stream);
        Ok(())
    }

    fn target(&self) -> &str {
        &self.address
    }
}
