//! Application layer: Use cases and services.
//!
//! This module orchestrates the domain encoder with the classifier port to
//! implement the single use case of the crate: one patient record in, one
//! verdict out.

mod prediction;

pub use prediction::{PredictionError, PredictionService};
