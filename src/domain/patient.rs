//! Patient attributes as submitted by the data-entry surface.
//!
//! Categorical answers arrive as the human-readable option labels and numeric
//! answers as plain numbers. Nothing here is trusted: the record is validated
//! field by field when it is encoded.

use serde::{Deserialize, Serialize};

/// Raw clinical attributes for a single patient.
///
/// Field order matches the classifier's training order (see
/// [`super::schema::Field::ALL`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientAttributes {
    /// Age in years
    pub age: f64,

    /// `"Male"` or `"Female"`
    pub sex: String,

    /// One of the four chest pain option labels
    pub chest_pain_type: String,

    /// Resting blood pressure in mmHg
    pub resting_blood_pressure: f64,

    /// Serum cholesterol in mg/dl
    pub serum_cholesterol: f64,

    /// Fasting blood sugar > 120 mg/dl, `"True"` or `"False"`
    pub fasting_blood_sugar_high: String,

    /// Resting electrocardiographic result label
    pub resting_ecg: String,

    /// Maximum heart rate achieved
    pub max_heart_rate: f64,

    /// `"Yes"` or `"No"`
    pub exercise_induced_angina: String,

    /// ST depression induced by exercise relative to rest
    pub st_depression: f64,

    /// Slope of the peak exercise ST segment label
    pub st_slope: String,

    /// Number of major vessels colored by fluoroscopy, `"0"` to `"3"`
    pub vessels_colored_count: String,

    /// Thallium stress test result label
    pub thal_result: String,
}

impl PatientAttributes {
    /// Parse a record from a JSON object.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed, a field is missing or has the
    /// wrong JSON type, or an unknown field is present.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a record from raw bytes, as read off a stream.
    ///
    /// # Errors
    /// As [`PatientAttributes::from_json`], plus invalid UTF-8.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
