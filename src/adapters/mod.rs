//! Adapters layer: Concrete implementations of ports.
//!
//! - `model`: JSON classifier artifacts with signed manifests
//! - `sanitize`: patient data filtering for logs

pub mod model;
pub mod sanitize;

// Re-export model error for lib.rs
pub use model::ModelError;
