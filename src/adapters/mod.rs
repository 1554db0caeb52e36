//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: JSON scaler/classifier artifacts and their signed manifest
//! - `sanitize`: patient-data filtering for logs

pub mod artifacts;
pub mod sanitize;

pub use artifacts::ArtifactError;
