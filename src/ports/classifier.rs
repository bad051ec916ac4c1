//! Classifier Port - Image Classification Interface
//!
//! The model runtime sits behind this trait. The inference use case
//! wraps it with timing and prediction counting.

use async_trait::async_trait;

use crate::domain::measurement::Prediction;

/// Cats/dogs image classifier.
#[async_trait]
pub trait Classifier: Send + Sync + 'static {
  /// Classify one encoded image.
  async fn classify(&self, image: &[u8]) -> anyhow::Result<Prediction>;
}
