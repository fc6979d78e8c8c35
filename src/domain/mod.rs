//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. The encoder and the verdict mapping live here so
//! they can be tested without a classifier.

mod category;
mod diagnosis;
mod encoder;
mod patient;
mod schema;

pub use category::{
    Category, ChestPainType, ExerciseAngina, FastingBloodSugar, RestingEcg, Sex, StSlope,
    ThalResult, VESSEL_COUNT_OPTIONS,
};
pub use diagnosis::{LabelPolicy, PredictionResult, Verdict};
pub use encoder::{EncodedFeatureVector, EncodingError, FeatureEncoder};
pub use patient::PatientAttributes;
pub use schema::{Field, NumericDomain, FEATURE_COUNT, FEATURE_NAMES};
