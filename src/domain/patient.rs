//! Patient intake record for diabetes and cardiovascular risk scoring.
//!
//! The record mirrors the intake form one-to-one. Lifestyle answers arrive as
//! free-form strings and are compared case-insensitively against known tokens.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors raised while reading a patient record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("blood pressure must look like \"systolic/diastolic\", got {0:?}")]
    BloodPressureFormat(String),

    #[error("blood pressure component {0:?} is not a finite number")]
    BloodPressureValue(String),

    #[error("malformed patient record: {0}")]
    Record(String),
}

/// Raw patient intake record, as submitted by the client.
///
/// Field names on the wire are case-sensitive and match the intake form
/// (`bloodPressure` and `heartRate` are camelCase, everything else snake_case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    #[serde(deserialize_with = "integral")]
    pub age: i32,

    /// "male" (any case) or anything else
    pub gender: String,

    /// Height in centimetres
    pub height: f64,

    /// Weight in kilograms
    pub weight: f64,

    /// "systolic/diastolic", e.g. "120/80"
    #[serde(rename = "bloodPressure")]
    pub blood_pressure: String,

    /// Resting heart rate in bpm
    #[serde(rename = "heartRate", deserialize_with = "integral")]
    pub heart_rate: i32,

    pub polydipsia: String,
    pub polyuria: String,
    pub fatigue: String,

    /// "yes", "former" or "no"
    pub smoking: String,

    /// "never" or any other frequency
    pub alcohol: String,

    /// "healthy", "average", "unhealthy" or "fast-food"
    pub diet: String,

    /// Exercise days per week
    #[serde(deserialize_with = "integral")]
    pub exercise_days: i32,

    /// Sedentary hours per day
    #[serde(deserialize_with = "integral")]
    pub sedentary_hours: i32,

    /// Sleep hours per day
    pub sleep: f64,

    /// Self-reported stress, 0-10
    #[serde(deserialize_with = "integral")]
    pub stress: i32,

    pub family_history: String,
    pub previous_heart_problems: String,
}

/// Integer fields also accept integral floats such as `45.0`.
fn integral<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    let in_range = (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&value);
    if !value.is_finite() || value.fract() != 0.0 || !in_range {
        return Err(D::Error::custom(format!("expected an integer, got {value}")));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(value as i32)
}

/// Reported diet category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diet {
    Healthy,
    Average,
    /// "unhealthy" or "fast-food"
    Unhealthy,
    /// Anything else; sets none of the one-hot diet fields
    Unknown,
}

impl Diet {
    fn from_token(value: &str) -> Self {
        if is_token(value, "healthy") {
            Self::Healthy
        } else if is_token(value, "average") {
            Self::Average
        } else if is_token(value, "unhealthy") || is_token(value, "fast-food") {
            Self::Unhealthy
        } else {
            Self::Unknown
        }
    }
}

/// Parsed blood pressure reading in mmHg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

impl BloodPressure {
    /// Parse a "systolic/diastolic" string.
    ///
    /// Exactly one `/` is required and both sides must parse as finite numbers
    /// (surrounding whitespace is tolerated).
    ///
    /// # Errors
    /// Returns `ParseError` for any other shape.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut parts = raw.split('/');
        let (Some(systolic), Some(diastolic), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError::BloodPressureFormat(raw.to_string()));
        };

        Ok(Self {
            systolic: parse_component(systolic)?,
            diastolic: parse_component(diastolic)?,
        })
    }

    /// Mean of systolic and diastolic.
    #[must_use]
    pub fn mean(&self) -> f64 {
        (self.systolic + self.diastolic) / 2.0
    }

    /// Systolic above 140 or diastolic above 90.
    #[must_use]
    pub fn is_high(&self) -> bool {
        self.systolic > 140.0 || self.diastolic > 90.0
    }
}

fn parse_component(raw: &str) -> Result<f64, ParseError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::BloodPressureValue(raw.to_string()))
}

fn is_token(value: &str, token: &str) -> bool {
    value.eq_ignore_ascii_case(token)
}

impl PatientRecord {
    /// Deserialize a record from a JSON request body.
    ///
    /// # Errors
    /// Returns `ParseError::Record` for malformed JSON, missing fields or
    /// wrongly typed fields.
    pub fn from_json(body: &str) -> Result<Self, ParseError> {
        serde_json::from_str(body).map_err(|e| ParseError::Record(e.to_string()))
    }

    /// Check that the body measurements can produce a meaningful BMI.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(self.height.is_finite() && self.height > 0.0) {
            errors.push(format!("Height {} must be a positive number of cm", self.height));
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            errors.push(format!("Weight {} must be a positive number of kg", self.weight));
        }
        if !self.sleep.is_finite() {
            errors.push(format!("Sleep {} must be a finite number of hours", self.sleep));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Body mass index: weight_kg / (height_cm / 100)^2.
    #[must_use]
    pub fn bmi(&self) -> f64 {
        let height_m = self.height / 100.0;
        self.weight / (height_m * height_m)
    }

    /// Parse the blood pressure field.
    ///
    /// # Errors
    /// See [`BloodPressure::parse`].
    pub fn blood_pressure(&self) -> Result<BloodPressure, ParseError> {
        BloodPressure::parse(&self.blood_pressure)
    }

    #[must_use]
    pub fn is_male(&self) -> bool {
        is_token(&self.gender, "male")
    }

    #[must_use]
    pub fn has_polyuria(&self) -> bool {
        is_token(&self.polyuria, "yes")
    }

    #[must_use]
    pub fn has_polydipsia(&self) -> bool {
        is_token(&self.polydipsia, "yes")
    }

    #[must_use]
    pub fn reports_fatigue(&self) -> bool {
        is_token(&self.fatigue, "yes")
    }

    /// Current or former smoker.
    #[must_use]
    pub fn smokes(&self) -> bool {
        is_token(&self.smoking, "yes") || is_token(&self.smoking, "former")
    }

    /// Any alcohol answer other than "never".
    #[must_use]
    pub fn drinks_alcohol(&self) -> bool {
        !is_token(&self.alcohol, "never")
    }

    #[must_use]
    pub fn diet(&self) -> Diet {
        Diet::from_token(&self.diet)
    }

    /// Diet answer is exactly "fast-food" (not merely "unhealthy").
    #[must_use]
    pub fn eats_fast_food(&self) -> bool {
        is_token(&self.diet, "fast-food")
    }

    #[must_use]
    pub fn has_family_history(&self) -> bool {
        is_token(&self.family_history, "yes")
    }

    #[must_use]
    pub fn has_previous_heart_problems(&self) -> bool {
        is_token(&self.previous_heart_problems, "yes")
    }

    /// Stress level strictly above 7.
    #[must_use]
    pub fn is_irritable(&self) -> bool {
        self.stress > 7
    }
}
