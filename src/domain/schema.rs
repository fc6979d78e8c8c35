//! Feature schema for the cardiovascular classifier.
//!
//! The order of [`Field::ALL`] is the training-time column order of the
//! classifier. It is the single source of truth for the encoded vector layout;
//! [`FEATURE_NAMES`] and [`Field::index`] are derived from it.

use serde::{Deserialize, Serialize};

/// Number of features the classifier was trained on.
pub const FEATURE_COUNT: usize = 13;

/// Feature names in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "sex",
    "chest_pain_type",
    "resting_blood_pressure",
    "serum_cholesterol",
    "fasting_blood_sugar_high",
    "resting_ecg",
    "max_heart_rate",
    "exercise_induced_angina",
    "st_depression",
    "st_slope",
    "vessels_colored_count",
    "thal_result",
];

/// One input field of the patient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Age,
    Sex,
    ChestPainType,
    RestingBloodPressure,
    SerumCholesterol,
    FastingBloodSugarHigh,
    RestingEcg,
    MaxHeartRate,
    ExerciseInducedAngina,
    StDepression,
    StSlope,
    VesselsColoredCount,
    ThalResult,
}

/// Inclusive bounds for a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericDomain {
    pub min: f64,
    pub max: f64,
}

impl NumericDomain {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` is finite and inside the bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && (self.min..=self.max).contains(&value)
    }
}

impl Field {
    /// All fields in training order.
    pub const ALL: [Field; FEATURE_COUNT] = [
        Field::Age,
        Field::Sex,
        Field::ChestPainType,
        Field::RestingBloodPressure,
        Field::SerumCholesterol,
        Field::FastingBloodSugarHigh,
        Field::RestingEcg,
        Field::MaxHeartRate,
        Field::ExerciseInducedAngina,
        Field::StDepression,
        Field::StSlope,
        Field::VesselsColoredCount,
        Field::ThalResult,
    ];

    /// Position of this field in the encoded vector.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Age => 0,
            Self::Sex => 1,
            Self::ChestPainType => 2,
            Self::RestingBloodPressure => 3,
            Self::SerumCholesterol => 4,
            Self::FastingBloodSugarHigh => 5,
            Self::RestingEcg => 6,
            Self::MaxHeartRate => 7,
            Self::ExerciseInducedAngina => 8,
            Self::StDepression => 9,
            Self::StSlope => 10,
            Self::VesselsColoredCount => 11,
            Self::ThalResult => 12,
        }
    }

    /// Machine name, also the JSON key of the input record.
    #[must_use]
    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    /// Prompt shown next to the input on a data-entry form.
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Sex => "Sex",
            Self::ChestPainType => "Chest Pain Types",
            Self::RestingBloodPressure => "Resting Blood Pressure (mm Hg)",
            Self::SerumCholesterol => "Serum Cholesterol (mg/dl)",
            Self::FastingBloodSugarHigh => "Fasting Blood Sugar > 120 mg/dl",
            Self::RestingEcg => "Resting Electrocardiographic Results",
            Self::MaxHeartRate => "Maximum Heart Rate Achieved",
            Self::ExerciseInducedAngina => "Exercise Induced Angina",
            Self::StDepression => "ST Depression Induced by Exercise",
            Self::StSlope => "Slope of the Peak Exercise ST Segment",
            Self::VesselsColoredCount => "Number of Major Vessels Colored by Fluoroscopy",
            Self::ThalResult => "Thal",
        }
    }

    /// Bounds for fields entered as numbers; `None` for closed-set fields.
    ///
    /// `vessels_colored_count` arrives as a label but is a count, so it has
    /// both a label set and a numeric domain.
    #[must_use]
    pub fn numeric_domain(self) -> Option<NumericDomain> {
        match self {
            Self::Age => Some(NumericDomain::new(0.0, 120.0)),
            Self::RestingBloodPressure => Some(NumericDomain::new(0.0, 250.0)),
            Self::SerumCholesterol => Some(NumericDomain::new(0.0, 700.0)),
            Self::MaxHeartRate => Some(NumericDomain::new(0.0, 250.0)),
            Self::StDepression => Some(NumericDomain::new(0.0, 10.0)),
            Self::VesselsColoredCount => Some(NumericDomain::new(0.0, 3.0)),
            Self::Sex
            | Self::ChestPainType
            | Self::FastingBloodSugarHigh
            | Self::RestingEcg
            | Self::ExerciseInducedAngina
            | Self::StSlope
            | Self::ThalResult => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_matches_names() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(field.name(), FEATURE_NAMES[i]);
        }
    }

    #[test]
    fn test_prompts() {
        assert_eq!(Field::Age.prompt(), "Age");
        assert_eq!(Field::ChestPainType.prompt(), "Chest Pain Types");
        for field in Field::ALL {
            assert!(!field.prompt().is_empty());
        }
    }

    #[test]
    fn test_serde_name_matches_feature_name() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).expect("serialize field");
            assert_eq!(json, format!("\"{}\"", field.name()));
        }
    }

    #[test]
    fn test_numeric_domain_includes_zero() {
        for field in Field::ALL {
            if let Some(domain) = field.numeric_domain() {
                assert!(domain.contains(0.0), "{field} should accept 0");
                assert!(!domain.contains(-0.5), "{field} should reject negatives");
            }
        }
    }

    #[test]
    fn test_numeric_domain_rejects_non_finite() {
        let domain = Field::Age.numeric_domain().expect("age is numeric");
        assert!(!domain.contains(f64::NAN));
        assert!(!domain.contains(f64::INFINITY));
        assert!(domain.contains(120.0));
        assert!(!domain.contains(120.5));
    }
}
