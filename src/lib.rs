//! # cardiocheck
//!
//! Cardiovascular disease classification pipeline.
//!
//! This crate provides:
//! - A feature encoder turning raw patient attributes into the fixed
//!   13-value vector a trained classifier expects
//! - A prediction service translating the classifier's label into a verdict
//! - A loader for signed, JSON-exported classifier artifacts
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (schema, categories, patient record, encoder, verdict)
//! - `ports`: Trait definitions for external capabilities (the classifier)
//! - `adapters`: Concrete implementations (JSON artifacts, log sanitizing)
//! - `application`: The prediction use case
//! - `config` / `telemetry`: Process setup for the host binary

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod host;
pub mod ports;
pub mod telemetry;

pub use application::{PredictionError, PredictionService};
pub use domain::{EncodingError, FeatureEncoder, PatientAttributes, PredictionResult, Verdict};

/// Result type for cardiocheck operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Main error type for cardiocheck
#[derive(Debug, thiserror::Error)]
pub enum CardioError {
    #[error("Invalid patient data: {0}")]
    Encoding(#[from] domain::EncodingError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] application::PredictionError),

    #[error("Model error: {0}")]
    Model(#[from] adapters::ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Malformed request: {0}")]
    Request(#[from] serde_json::Error),

    #[error("Request line too long (limit {limit} bytes)")]
    LineTooLong { limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CardioError {
    /// Message safe to return to the caller.
    ///
    /// Encoding errors name the offending field and value, since the caller
    /// sent them. Internal failures are reported generically; details go to
    /// the log.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Encoding(e) => format!("{}: {e}", e.field().prompt()),
            Self::Request(e) => format!("Malformed request: {e}"),
            Self::LineTooLong { .. } => self.to_string(),
            Self::Prediction(PredictionError::ClassifierUnavailable(_)) | Self::Model(_) => {
                "Classifier unavailable".to_string()
            }
            Self::Prediction(_) => "Prediction failed".to_string(),
            Self::Config(_) | Self::Io(_) => "Internal error".to_string(),
        }
    }

    /// Whether the process cannot keep serving after this error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Encoding(_) | Self::Request(_) | Self::LineTooLong { .. } => false,
            Self::Prediction(e) => !matches!(
                e,
                PredictionError::UnexpectedLabel(_) | PredictionError::Classifier(_)
            ),
            Self::Model(_) | Self::Config(_) | Self::Io(_) => true,
        }
    }
}
