//! Prediction service: encoded vector in, verdict out.
//!
//! This service coordinates:
//! - Schema checks against the classifier at construction
//! - Single-sample batching for the classifier call
//! - Label to verdict translation under a `LabelPolicy`
//! - The request boundary (`assess`), where raw input is encoded first

use std::sync::Arc;

use crate::adapters::model::JsonClassifier;
use crate::config::Settings;
use crate::domain::{
    EncodedFeatureVector, FeatureEncoder, LabelPolicy, PatientAttributes, PredictionResult,
    Verdict, FEATURE_COUNT, FEATURE_NAMES,
};
use crate::ports::{Classifier, ClassifierError};
use crate::CardioError;

/// Errors raised while running a prediction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("Feature vector has {actual} values, classifier expects {expected}")]
    VectorLengthMismatch { expected: usize, actual: usize },

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Classifier was trained on features {found:?}, encoder produces {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Classifier returned unexpected label {0}")]
    UnexpectedLabel(i64),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Service for running cardiovascular disease predictions.
///
/// Holds the only reference the pipeline needs to the classifier. The
/// classifier is never reloaded; build a new service to change it.
pub struct PredictionService<C>
where
    C: Classifier,
{
    classifier: Arc<C>,
    encoder: FeatureEncoder,
    label_policy: LabelPolicy,
}

impl<C> PredictionService<C>
where
    C: Classifier,
{
    /// Create a service with the strict label policy.
    ///
    /// # Errors
    /// See [`PredictionService::with_policy`].
    pub fn new(classifier: Arc<C>) -> Result<Self, PredictionError> {
        Self::with_policy(classifier, LabelPolicy::default())
    }

    /// Create a service after checking the classifier matches the encoder.
    ///
    /// # Errors
    /// Returns `VectorLengthMismatch` if the classifier does not take
    /// `FEATURE_COUNT` features, or `SchemaMismatch` if it declares feature
    /// names that differ from the encoder's order.
    pub fn with_policy(classifier: Arc<C>, label_policy: LabelPolicy) -> Result<Self, PredictionError> {
        let expected = classifier.n_features();
        if expected != FEATURE_COUNT {
            tracing::error!(
                "Classifier expects {} features, encoder produces {}",
                expected,
                FEATURE_COUNT
            );
            return Err(PredictionError::VectorLengthMismatch {
                expected,
                actual: FEATURE_COUNT,
            });
        }

        if let Some(names) = classifier.feature_names() {
            if !names.iter().map(String::as_str).eq(FEATURE_NAMES.iter().copied()) {
                tracing::error!("Classifier feature order differs from the encoder schema");
                return Err(PredictionError::SchemaMismatch {
                    expected: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
                    found: names.to_vec(),
                });
            }
        }

        tracing::info!(policy = ?label_policy, "Prediction service ready");
        Ok(Self {
            classifier,
            encoder: FeatureEncoder::new(),
            label_policy,
        })
    }

    #[must_use]
    pub fn label_policy(&self) -> LabelPolicy {
        self.label_policy
    }

    /// Classify one encoded vector.
    ///
    /// # Errors
    /// - `VectorLengthMismatch` if the vector width differs from the
    ///   classifier's
    /// - `UnexpectedLabel` for a label other than 0 or 1 under the strict
    ///   policy
    /// - `Classifier` if the classifier call fails or does not return exactly
    ///   one label
    pub fn predict(&self, vector: EncodedFeatureVector) -> Result<PredictionResult, PredictionError> {
        let expected = self.classifier.n_features();
        if vector.len() != expected {
            tracing::error!(
                "Feature vector has {} values, classifier expects {}",
                vector.len(),
                expected
            );
            return Err(PredictionError::VectorLengthMismatch {
                expected,
                actual: vector.len(),
            });
        }

        // The classifier takes a batch; this service only ever sends one sample.
        let batch = [vector.as_slice()];
        let labels = self.classifier.predict_batch(&batch)?;
        let label = match labels.as_slice() {
            [label] => *label,
            other => {
                return Err(ClassifierError::LabelCount {
                    expected: 1,
                    actual: other.len(),
                }
                .into());
            }
        };

        let verdict = self.verdict_for(label)?;
        tracing::info!(label, verdict = %verdict, "Prediction complete");
        Ok(PredictionResult::new(label, verdict))
    }

    /// Encode a raw patient record and classify it.
    ///
    /// This is the request boundary: failures are returned as `CardioError`,
    /// whose `user_message()` is safe to show to the caller.
    ///
    /// # Errors
    /// Returns `CardioError::Encoding` for invalid input, or
    /// `CardioError::Prediction` if prediction fails.
    pub fn assess(&self, attributes: &PatientAttributes) -> Result<PredictionResult, CardioError> {
        let vector = self.encoder.encode(attributes).map_err(|e| {
            tracing::warn!(field = %e.field(), "Rejected patient record");
            e
        })?;
        Ok(self.predict(vector)?)
    }

    fn verdict_for(&self, label: i64) -> Result<Verdict, PredictionError> {
        match (label, self.label_policy) {
            (1, _) => Ok(Verdict::Positive),
            (0, _) => Ok(Verdict::Negative),
            (other, LabelPolicy::Lenient) => {
                tracing::warn!(label = other, "Unexpected classifier label treated as negative");
                Ok(Verdict::Negative)
            }
            (other, LabelPolicy::Strict) => {
                tracing::error!(label = other, "Unexpected classifier label");
                Err(PredictionError::UnexpectedLabel(other))
            }
        }
    }
}

impl PredictionService<JsonClassifier> {
    /// Load the configured classifier artifact and build the service.
    ///
    /// Called once at startup; a failure here means the process cannot serve
    /// predictions.
    ///
    /// # Errors
    /// Returns `ClassifierUnavailable` if the artifact cannot be loaded or
    /// verified, or any error from [`PredictionService::with_policy`].
    pub fn from_settings(settings: &Settings) -> Result<Self, PredictionError> {
        let classifier = JsonClassifier::load(&settings.model_path, &settings.load_options())
            .map_err(|e| {
                tracing::error!("Failed to load classifier from {:?}: {}", settings.model_path, e);
                PredictionError::ClassifierUnavailable(e.to_string())
            })?;
        Self::with_policy(Arc::new(classifier), settings.label_policy)
    }
}
