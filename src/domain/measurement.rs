//! Measurements - Inference Durations and Prediction Classes
//!
//! Callers report inference time in milliseconds; the histogram stores
//! seconds. The conversion lives here so no caller does it by hand.

use std::fmt;
use std::time::Duration;

use crate::error::MetricsError;

/// A validated, non-negative inference duration.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct InferenceDuration {
    seconds: f64,
}

impl InferenceDuration {
    /// Build from a duration in milliseconds.
    ///
    /// # Errors
    /// `MetricsError::InvalidMeasurement` for negative, NaN or infinite input.
    pub fn from_millis(millis: f64) -> Result<Self, MetricsError> {
        if !millis.is_finite() {
            return Err(MetricsError::InvalidMeasurement {
                value: millis,
                reason: "duration is not finite",
            });
        }
        if millis < 0.0 {
            return Err(MetricsError::InvalidMeasurement {
                value: millis,
                reason: "duration is negative",
            });
        }
        Ok(Self {
            seconds: millis / 1000.0,
        })
    }

    /// Value as stored in the histogram.
    pub const fn as_secs_f64(self) -> f64 {
        self.seconds
    }
}

impl From<Duration> for InferenceDuration {
    fn from(d: Duration) -> Self {
        Self {
            seconds: d.as_secs_f64(),
        }
    }
}

/// Output class of the cats/dogs model.
///
/// Closed set so the `result` label cannot explode in cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionClass {
    Cat,
    Dog,
}

impl PredictionClass {
    /// Label value used in `cv_predictions_total{result=...}`.
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Cat => "cat",
            Self::Dog => "dog",
        }
    }
}

impl fmt::Display for PredictionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// A single classifier output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class.
    pub class: PredictionClass,
    /// Model confidence in [0, 1].
    pub confidence: f64,
}
