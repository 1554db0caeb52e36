//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O: the intake record, the two engineered
//! feature vectors, the risk report and its follow-up recommendations.

mod assessment;
pub mod features;
mod patient;
mod recommendations;

pub use assessment::{
    round_score, RiskAssessment, RiskLevel, RiskScore, HIGH_THRESHOLD, MEDIUM_THRESHOLD,
};
pub use features::{CardiacFeatures, DiabetesFeatures, FeatureRow, FeatureVector};
pub use patient::{BloodPressure, Diet, ParseError, PatientRecord};
pub use recommendations::{recommendations, Priority, Recommendation, SCREENING_SCORE};

#[cfg(test)]
pub(crate) use patient::fixtures;
