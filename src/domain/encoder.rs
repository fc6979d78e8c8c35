//! Feature encoder: patient attributes to the classifier's input vector.
//!
//! The mapping mirrors the encoding used when the classifier was trained.
//! A wrong code does not crash anything, it silently yields a plausible but
//! wrong prediction, so every field is validated and unknown input is
//! rejected instead of defaulted.

use serde::Serialize;

use super::category::{
    Category, ChestPainType, ExerciseAngina, FastingBloodSugar, RestingEcg, Sex, StSlope,
    ThalResult,
};
use super::patient::PatientAttributes;
use super::schema::{Field, FEATURE_COUNT};

/// Longest offending value echoed back in an error.
const MAX_ECHOED_VALUE_CHARS: usize = 64;

/// Errors raised while encoding caller input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodingError {
    #[error("Unknown category for {field}: {value:?}")]
    UnknownCategory { field: Field, value: String },

    #[error("Value out of range for {field}: {value}")]
    InvalidRange { field: Field, value: f64 },

    #[error("Cannot parse {field} as an integer: {value:?}")]
    ParseFailure { field: Field, value: String },
}

impl EncodingError {
    pub(crate) fn unknown_category(field: Field, value: &str) -> Self {
        Self::UnknownCategory {
            field,
            value: excerpt(value),
        }
    }

    fn parse_failure(field: Field, value: &str) -> Self {
        Self::ParseFailure {
            field,
            value: excerpt(value),
        }
    }

    /// The field that failed validation.
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            Self::UnknownCategory { field, .. }
            | Self::InvalidRange { field, .. }
            | Self::ParseFailure { field, .. } => *field,
        }
    }
}

// Hostile input can be arbitrarily long; keep errors (and logs) bounded.
fn excerpt(value: &str) -> String {
    match value.char_indices().nth(MAX_ECHOED_VALUE_CHARS) {
        Some((end, _)) => format!("{}...", &value[..end]),
        None => value.to_string(),
    }
}

/// The classifier input: 13 finite values in training order.
///
/// Only [`FeatureEncoder`] constructs this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedFeatureVector([f64; FEATURE_COUNT]);

impl EncodedFeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value encoded for `field`.
    #[must_use]
    pub fn get(&self, field: Field) -> f64 {
        self.0[field.index()]
    }
}

/// Maps [`PatientAttributes`] to an [`EncodedFeatureVector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Encode a patient record.
    ///
    /// Fields are validated in training order and the first failure is
    /// returned.
    ///
    /// # Errors
    /// - `UnknownCategory` if a categorical label is not in its option list
    /// - `InvalidRange` if a number is non-finite or outside its domain
    /// - `ParseFailure` if the vessel count is not an integer
    pub fn encode(&self, attrs: &PatientAttributes) -> Result<EncodedFeatureVector, EncodingError> {
        let mut out = [0.0_f64; FEATURE_COUNT];

        for field in Field::ALL {
            out[field.index()] = match field {
                Field::Age => numeric(field, attrs.age)?,
                Field::Sex => categorical::<Sex>(&attrs.sex)?,
                Field::ChestPainType => categorical::<ChestPainType>(&attrs.chest_pain_type)?,
                Field::RestingBloodPressure => numeric(field, attrs.resting_blood_pressure)?,
                Field::SerumCholesterol => numeric(field, attrs.serum_cholesterol)?,
                Field::FastingBloodSugarHigh => {
                    categorical::<FastingBloodSugar>(&attrs.fasting_blood_sugar_high)?
                }
                Field::RestingEcg => categorical::<RestingEcg>(&attrs.resting_ecg)?,
                Field::MaxHeartRate => numeric(field, attrs.max_heart_rate)?,
                Field::ExerciseInducedAngina => {
                    categorical::<ExerciseAngina>(&attrs.exercise_induced_angina)?
                }
                Field::StDepression => numeric(field, attrs.st_depression)?,
                Field::StSlope => categorical::<StSlope>(&attrs.st_slope)?,
                Field::VesselsColoredCount => vessel_count(&attrs.vessels_colored_count)?,
                Field::ThalResult => categorical::<ThalResult>(&attrs.thal_result)?,
            };
        }

        tracing::trace!("Encoded {} features", out.len());
        Ok(EncodedFeatureVector(out))
    }
}

fn categorical<C: Category>(label: &str) -> Result<f64, EncodingError> {
    C::parse(label).map(|c| f64::from(c.code()))
}

fn numeric(field: Field, value: f64) -> Result<f64, EncodingError> {
    match field.numeric_domain() {
        Some(domain) if domain.contains(value) => Ok(value),
        _ => Err(EncodingError::InvalidRange { field, value }),
    }
}

fn vessel_count(label: &str) -> Result<f64, EncodingError> {
    let field = Field::VesselsColoredCount;
    // `i64::from_str` accepts a leading '+'; a count label is digits only.
    if label.starts_with('+') {
        return Err(EncodingError::parse_failure(field, label));
    }
    let count: i64 = label
        .parse()
        .map_err(|_| EncodingError::parse_failure(field, label))?;
    numeric(field, count as f64)
}
