//! Inference Service - Timed, Counted Classification
//!
//! Wraps a `Classifier` so every call records its latency (successful
//! or not) and every successful call counts its predicted class.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, warn};

use crate::domain::measurement::Prediction;
use crate::ports::classifier::Classifier;
use crate::ports::telemetry::InferenceTelemetry;

/// Classifier front end used by the prediction handler.
pub struct InferenceService<C> {
  classifier: C,
  telemetry: Arc<dyn InferenceTelemetry>,
}

impl<C: Classifier> InferenceService<C> {
  pub fn new(classifier: C, telemetry: Arc<dyn InferenceTelemetry>) -> Self {
    Self {
      classifier,
      telemetry,
    }
  }

  /// Classify `image`, recording inference time and prediction class.
  ///
  /// The classifier's result is returned unchanged; metrics recording
  /// cannot turn a success into a failure.
  pub async fn predict(&self, image: &[u8]) -> Result<Prediction> {
    let start = Instant::now();
    let result = self.classifier.classify(image).await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    self.telemetry.track_inference_time(elapsed_ms);

    match &result {
      Ok(prediction) => {
        self.telemetry.track_prediction(prediction.class);
        debug!(
          class = %prediction.class,
          confidence = prediction.confidence,
          elapsed_ms,
          "Prediction served"
        );
      }
      Err(e) => warn!(error = %e, elapsed_ms, "Inference failed"),
    }

    result
  }
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;

  use super::*;
  use crate::adapters::metrics::{Instrumentation, InstrumentationOptions, MetricRegistry};
  use crate::domain::measurement::PredictionClass;

  struct AlwaysDog;

  #[async_trait]
  impl Classifier for AlwaysDog {
    async fn classify(&self, _image: &[u8]) -> Result<Prediction> {
      Ok(Prediction {
        class: PredictionClass::Dog,
        confidence: 0.9,
      })
    }
  }

  #[tokio::test]
  async fn test_predict_records_time_and_class() {
    let metrics = Arc::new(
      Instrumentation::new(Arc::new(MetricRegistry::new()), InstrumentationOptions::default())
        .unwrap(),
    );
    let service = InferenceService::new(AlwaysDog, metrics.clone());

    let prediction = service.predict(b"jpeg").await.unwrap();
    assert_eq!(prediction.class, PredictionClass::Dog);
    assert_eq!(metrics.inference_histogram().get_sample_count(), 1);
    assert_eq!(metrics.prediction_count(PredictionClass::Dog), 1);
    assert_eq!(metrics.prediction_count(PredictionClass::Cat), 0);
  }
}
