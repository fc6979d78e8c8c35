//! Classifier port: Trait for a pre-trained binary classifier.
//!
//! This trait hides how the trained model is represented and loaded from the
//! prediction service.

/// Errors raised by a classifier implementation at prediction time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Sample {index} has {actual} features, classifier expects {expected}")]
    SampleWidth {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Classifier returned {actual} labels for {expected} samples")]
    LabelCount { expected: usize, actual: usize },

    #[error("Classifier failed: {0}")]
    Inference(String),
}

/// A trained classifier, loaded once and then only read.
///
/// Implementations must be safe to call concurrently from several threads:
/// `predict_batch` takes `&self` and must not mutate shared state.
pub trait Classifier: Send + Sync {
    /// Number of features each sample must have.
    fn n_features(&self) -> usize;

    /// Feature names in the order the classifier was trained on, if the
    /// artifact records them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Predict one class label per sample.
    ///
    /// Follows the usual batch calling convention: the input is a collection
    /// of samples even when only one prediction is wanted.
    ///
    /// # Errors
    /// Returns `ClassifierError::SampleWidth` if a sample has the wrong
    /// length, or another `ClassifierError` if inference fails.
    fn predict_batch(&self, samples: &[&[f64]]) -> Result<Vec<i64>, ClassifierError>;
}

