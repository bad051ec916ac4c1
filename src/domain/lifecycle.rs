//! Metrics Lifecycle - Mode Selection and Setup State
//!
//! The mode is read once from `ENABLE_PROMETHEUS` (or the config file)
//! and injected into setup. The lifecycle state moves exactly once from
//! `Uninitialized` to `Active` or `Disabled`.

use std::fmt;

/// Environment variable gating the scrape endpoint and request collector.
pub const ENABLE_PROMETHEUS_ENV: &str = "ENABLE_PROMETHEUS";

/// Whether metrics exposition is switched on for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsMode {
    Enabled,
    Disabled,
}

impl MetricsMode {
    /// Interpret a raw flag value: case-insensitive `"true"` enables,
    /// anything else disables.
    pub fn from_flag(value: &str) -> Self {
        if value.eq_ignore_ascii_case("true") {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    /// Resolve the mode from an optional environment value, falling back
    /// to the configured default when the variable is unset.
    pub fn resolve(env_value: Option<&str>, configured: bool) -> Self {
        match env_value {
            Some(v) => Self::from_flag(v),
            None if configured => Self::Enabled,
            None => Self::Disabled,
        }
    }

    /// Read `ENABLE_PROMETHEUS` from the process environment.
    pub fn from_env(configured: bool) -> Self {
        let value = std::env::var(ENABLE_PROMETHEUS_ENV).ok();
        Self::resolve(value.as_deref(), configured)
    }

    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Setup state of the instrumentation facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Instruments exist, nothing is exposed yet.
    Uninitialized,
    /// Collector attached and `/metrics` mounted.
    Active,
    /// Setup ran with metrics disabled; never exposed.
    Disabled,
}

impl From<MetricsMode> for LifecycleState {
    fn from(mode: MetricsMode) -> Self {
        match mode {
            MetricsMode::Enabled => Self::Active,
            MetricsMode::Disabled => Self::Disabled,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Disabled => "disabled",
        })
    }
}
