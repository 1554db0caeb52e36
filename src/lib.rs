//! # healthrisk
//!
//! Diabetes and cardiovascular risk scoring from a single patient intake record.
//!
//! The pipeline derives two fixed-order feature vectors from the intake,
//! scales their numeric subsets, runs each through a pre-trained binary
//! classifier and folds the two probabilities into one report.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Intake record, feature vectors, risk report, recommendations
//! - `ports`: `Scaler` / `Classifier` capability traits
//! - `adapters`: JSON model artifacts, signed manifest, log sanitization
//! - `application`: The assessment pipeline and its request boundary
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{PatientRecord, RiskAssessment, RiskLevel};

/// Result type for healthrisk operations
pub type Result<T> = std::result::Result<T, HealthRiskError>;

/// Main error type for healthrisk
#[derive(Debug, thiserror::Error)]
pub enum HealthRiskError {
    #[error("Invalid input: {0}")]
    Parse(#[from] domain::ParseError),

    #[error("Invalid patient data: {0}")]
    Validation(String),

    #[error("Model configuration error: {0}")]
    Configuration(String),

    #[error("Model inference failed: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Model artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HealthRiskError {
    /// Whether the caller's input caused the failure (as opposed to the
    /// deployment or the models).
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Validation(_))
    }
}
