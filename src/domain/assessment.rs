//! Risk assessment result types.
//!
//! Turns the two model probabilities into the scored, labelled report
//! returned to the client.

use serde::{Deserialize, Serialize};

/// Probability at or above which risk is `Medium`.
pub const MEDIUM_THRESHOLD: f64 = 0.3;

/// Probability at or above which risk is `High`.
pub const HIGH_THRESHOLD: f64 = 0.6;

/// Three-tier risk classification, shared by every score in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Probability below 0.3
    Low,
    /// Probability in [0.3, 0.6)
    Medium,
    /// Probability of 0.6 or more
    High,
}

impl RiskLevel {
    /// Classify a probability in [0, 1].
    #[must_use]
    pub fn classify(probability: f64) -> Self {
        if probability < MEDIUM_THRESHOLD {
            Self::Low
        } else if probability < HIGH_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// A percentage score with its risk level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Probability x 100, rounded half-to-even to 2 decimals
    pub score: f64,
    pub level: RiskLevel,
}

impl RiskScore {
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        Self {
            score: round_score(probability * 100.0),
            level: RiskLevel::classify(probability),
        }
    }
}

/// Round a percentage to 2 decimal places, ties to even.
#[must_use]
pub fn round_score(percent: f64) -> f64 {
    (percent * 100.0).round_ties_even() / 100.0
}

/// Combined diabetes / cardiovascular report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub diabetes: RiskScore,

    #[serde(rename = "cvd")]
    pub cardiovascular: RiskScore,

    /// Driven by the larger of the two probabilities; not a separate model
    pub overall: RiskScore,
}

impl RiskAssessment {
    /// Build the report from the two positive-class probabilities.
    #[must_use]
    pub fn aggregate(diabetes_probability: f64, cardiac_probability: f64) -> Self {
        Self {
            diabetes: RiskScore::from_probability(diabetes_probability),
            cardiovascular: RiskScore::from_probability(cardiac_probability),
            overall: RiskScore::from_probability(diabetes_probability.max(cardiac_probability)),
        }
    }
}
