//! JSON classifier adapter: Implementation of `Classifier` from an exported
//! artifact.
//!
//! The offline training step exports the fitted estimator as JSON. This
//! adapter loads it once, validates every parameter, and then serves
//! read-only predictions.
//!
//! # Security
//!
//! - If `manifest.json` and `model.sig` sit next to the artifact, the
//!   Ed25519 signature and the SHA-256 of every bound file are verified, and
//!   the artifact itself must be bound by the manifest
//! - Unsigned artifacts are refused unless `LoadOptions::allow_unsigned` is
//!   set (the configuration layer only allows that in debug builds)
//!
//! # Thread Safety
//!
//! `JsonClassifier` is immutable after `load` and is `Send + Sync`; share it
//! behind an `Arc`.

mod estimators;
pub mod manifest;

use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

pub use estimators::{DecisionTree, Estimator, LogisticRegression, TreeEnsemble, TreeNode};

use crate::ports::{Classifier, ClassifierError};

/// Artifact file names looked up when the model path is a directory.
pub const ARTIFACT_CANDIDATES: [&str; 2] = ["heart_disease_model.json", "model.json"];

/// Upper bound on the feature count of an artifact.
const MAX_FEATURES: usize = 256;

/// Errors raised while loading a classifier artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    NotFound(String),

    #[error("Failed to read model artifact: {0}")]
    Io(String),

    #[error("Invalid model artifact: {0}")]
    Format(String),

    #[error("Model signature check failed: {0}")]
    Signature(String),

    #[error("Model manifest check failed: {0}")]
    Manifest(String),
}

/// How strictly to verify the artifact.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Accept artifacts without a signed manifest.
    pub allow_unsigned: bool,

    /// Key the manifest must be signed with.
    pub verifying_key: Option<VerifyingKey>,
}

impl LoadOptions {
    #[must_use]
    pub fn signed(key: VerifyingKey) -> Self {
        Self {
            allow_unsigned: false,
            verifying_key: Some(key),
        }
    }

    #[must_use]
    pub fn unsigned() -> Self {
        Self {
            allow_unsigned: true,
            verifying_key: None,
        }
    }
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

/// The exported classifier document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub format_version: u32,
    #[serde(default)]
    pub description: Option<String>,
    pub feature_names: Vec<String>,
    /// `[negative, positive]` labels
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    pub estimator: Estimator,
}

impl ClassifierArtifact {
    /// Check internal consistency of the artifact.
    ///
    /// # Errors
    /// Returns `ModelError::Format` describing the first inconsistency.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != 1 {
            return Err(ModelError::Format(format!(
                "Unsupported format_version: {}",
                self.format_version
            )));
        }
        let n = self.feature_names.len();
        if n == 0 || n > MAX_FEATURES {
            return Err(ModelError::Format(format!(
                "Invalid feature count in model: got {n}, max {MAX_FEATURES}"
            )));
        }
        if self.classes.len() != 2 || self.classes[0] == self.classes[1] {
            return Err(ModelError::Format(
                "classes must list exactly two distinct labels".into(),
            ));
        }
        self.estimator
            .validate(n, &self.classes)
            .map_err(ModelError::Format)
    }
}

/// A classifier backed by a loaded [`ClassifierArtifact`].
#[derive(Debug)]
pub struct JsonClassifier {
    artifact: ClassifierArtifact,
    source: PathBuf,
}

impl JsonClassifier {
    /// Load and verify an artifact from a file or a directory.
    ///
    /// # Errors
    /// Returns `ModelError` if the artifact is missing, unreadable, malformed,
    /// inconsistent, or fails signature verification.
    pub fn load(model_path: &Path, options: &LoadOptions) -> Result<Self, ModelError> {
        let (base_dir, explicit_file) = if model_path.is_dir() {
            (model_path.to_path_buf(), None)
        } else if model_path.is_file() {
            let parent = model_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (parent, model_path.file_name().map(|n| n.to_string_lossy().into_owned()))
        } else {
            return Err(ModelError::NotFound(format!("{model_path:?}")));
        };

        let manifest = Self::verify_signature(&base_dir, options)?;

        let file_name = match (explicit_file, &manifest) {
            (Some(name), Some(m)) if !m.binds(&name) => {
                return Err(ModelError::Manifest(format!(
                    "{name} is not bound by the signed manifest"
                )));
            }
            (Some(name), _) => name,
            // Only pick a file the signed manifest binds.
            (None, Some(m)) => ARTIFACT_CANDIDATES
                .iter()
                .find(|c| m.binds(c))
                .map(|c| (*c).to_string())
                .ok_or_else(|| {
                    ModelError::Manifest(format!(
                        "manifest.json must include one of {ARTIFACT_CANDIDATES:?}"
                    ))
                })?,
            (None, None) => ARTIFACT_CANDIDATES
                .iter()
                .find(|c| base_dir.join(c).is_file())
                .map(|c| (*c).to_string())
                .ok_or_else(|| {
                    ModelError::NotFound(format!(
                        "no model JSON in {base_dir:?} (expected one of {ARTIFACT_CANDIDATES:?})"
                    ))
                })?,
        };

        let source = base_dir.join(&file_name);
        let bytes =
            std::fs::read(&source).map_err(|e| ModelError::Io(format!("{source:?}: {e}")))?;
        // Parse exactly the bytes that were hashed, not a second read.
        if let Some(m) = &manifest {
            m.check_bytes(&file_name, &bytes)?;
        }
        let content = String::from_utf8(bytes)
            .map_err(|e| ModelError::Format(format!("{source:?} is not UTF-8: {e}")))?;
        let classifier = Self::from_json(&content, source)?;

        tracing::info!(
            kind = classifier.artifact.estimator.kind(),
            n_features = classifier.n_features(),
            signed = manifest.is_some(),
            "Loaded classifier from {:?}",
            classifier.source
        );
        Ok(classifier)
    }

    /// Build a classifier from artifact JSON without touching the filesystem.
    ///
    /// # Errors
    /// Returns `ModelError::Format` if the JSON is malformed or inconsistent.
    pub fn from_json(json: &str, source: impl Into<PathBuf>) -> Result<Self, ModelError> {
        let artifact: ClassifierArtifact =
            serde_json::from_str(json).map_err(|e| ModelError::Format(e.to_string()))?;
        Self::from_artifact(artifact, source)
    }

    /// Wrap an in-memory artifact after validating it.
    ///
    /// # Errors
    /// Returns `ModelError::Format` if the artifact is inconsistent.
    pub fn from_artifact(
        artifact: ClassifierArtifact,
        source: impl Into<PathBuf>,
    ) -> Result<Self, ModelError> {
        artifact.validate()?;
        Ok(Self {
            artifact,
            source: source.into(),
        })
    }

    fn verify_signature(
        base_dir: &Path,
        options: &LoadOptions,
    ) -> Result<Option<manifest::SignedModelManifest>, ModelError> {
        if manifest::is_signed(base_dir) {
            let key = options.verifying_key.as_ref().ok_or_else(|| {
                ModelError::Signature(
                    "signed model found but no verifying key is configured".into(),
                )
            })?;
            return manifest::verify(base_dir, key).map(Some);
        }

        if options.allow_unsigned {
            tracing::warn!("Loading UNSIGNED model from {:?}", base_dir);
            Ok(None)
        } else {
            tracing::error!(
                "Model signature not found in {:?}; refusing unsigned model",
                base_dir
            );
            Err(ModelError::Signature(format!(
                "{} and {} required next to the model",
                manifest::MANIFEST_FILE,
                manifest::SIGNATURE_FILE
            )))
        }
    }

    #[must_use]
    pub fn artifact(&self) -> &ClassifierArtifact {
        &self.artifact
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl Classifier for JsonClassifier {
    fn n_features(&self) -> usize {
        self.artifact.feature_names.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.artifact.feature_names)
    }

    fn predict_batch(&self, samples: &[&[f64]]) -> Result<Vec<i64>, ClassifierError> {
        let expected = self.n_features();
        samples
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                if sample.len() != expected {
                    return Err(ClassifierError::SampleWidth {
                        index,
                        expected,
                        actual: sample.len(),
                    });
                }
                self.artifact
                    .estimator
                    .predict_one(sample, &self.artifact.classes)
                    .map_err(ClassifierError::Inference)
            })
            .collect()
    }
}
