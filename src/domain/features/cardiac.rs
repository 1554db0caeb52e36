//! Cardiovascular feature vector (30 fields).

use super::{indicator, FeatureVector, OBESITY_BMI};
use crate::domain::patient::{Diet, ParseError};
use crate::domain::PatientRecord;

// Population-average placeholders for model inputs the intake form does not
// collect. Every patient receives the same value; the cardiac model is
// therefore blind to these dimensions.

/// Serum cholesterol placeholder (mg/dL).
pub const CHOLESTEROL_PROXY: f64 = 262.91;
/// Triglycerides placeholder (mg/dL).
pub const TRIGLYCERIDES_PROXY: f64 = 442.60;
/// Annual income placeholder.
pub const INCOME_PROXY: f64 = 100_000.0;
/// Medication use placeholder (not on medication).
pub const MEDICATION_USE_PROXY: f64 = 0.0;

/// Exercise days are converted to weekly hours at this rate.
const EXERCISE_HOURS_PER_DAY: f64 = 2.0;

/// Cardiovascular model input.
#[derive(Debug, Clone, PartialEq)]
pub struct CardiacFeatures {
    pub age: f64,
    pub sex: f64,
    pub cholesterol: f64,
    pub heart_rate: f64,
    pub smoking: f64,
    pub obesity: f64,
    pub alcohol_consumption: f64,
    pub exercise_hours_per_week: f64,
    pub diet_healthy: f64,
    pub diet_average: f64,
    pub diet_unhealthy: f64,
    pub systolic: f64,
    pub diastolic: f64,
    /// polyuria or polydipsia reported
    pub diabetes: f64,
    pub family_history: f64,
    pub previous_heart_problems: f64,
    pub medication_use: f64,
    pub stress_level: f64,
    pub sedentary_hours_per_day: f64,
    pub income: f64,
    pub bmi: f64,
    pub triglycerides: f64,
    pub physical_activity_days_per_week: f64,
    pub sleep_hours_per_day: f64,
    pub bp_mean: f64,
    pub high_bp: f64,
    pub cholesterol_ratio: f64,
    pub age_bmi_interaction: f64,
    pub stress_sedentary_interaction: f64,
    pub bp_cholesterol_interaction: f64,
}

impl CardiacFeatures {
    /// Build the vector from an intake record and its precomputed BMI.
    ///
    /// # Errors
    /// Returns `ParseError` when the blood pressure field is malformed.
    pub fn encode(record: &PatientRecord, bmi: f64) -> Result<Self, ParseError> {
        let bp = record.blood_pressure()?;
        let diet = record.diet();

        let age = f64::from(record.age);
        let stress = f64::from(record.stress);
        let sedentary = f64::from(record.sedentary_hours);
        let exercise_days = f64::from(record.exercise_days);
        let bp_mean = bp.mean();

        Ok(Self {
            age,
            sex: indicator(record.is_male()),
            cholesterol: CHOLESTEROL_PROXY,
            heart_rate: f64::from(record.heart_rate),
            smoking: indicator(record.smokes()),
            obesity: indicator(bmi > OBESITY_BMI),
            alcohol_consumption: indicator(record.drinks_alcohol()),
            exercise_hours_per_week: exercise_days * EXERCISE_HOURS_PER_DAY,
            diet_healthy: indicator(diet == Diet::Healthy),
            diet_average: indicator(diet == Diet::Average),
            diet_unhealthy: indicator(diet == Diet::Unhealthy),
            systolic: bp.systolic,
            diastolic: bp.diastolic,
            diabetes: indicator(record.has_polyuria() || record.has_polydipsia()),
            family_history: indicator(record.has_family_history()),
            previous_heart_problems: indicator(record.has_previous_heart_problems()),
            medication_use: MEDICATION_USE_PROXY,
            stress_level: stress,
            sedentary_hours_per_day: sedentary,
            income: INCOME_PROXY,
            bmi,
            triglycerides: TRIGLYCERIDES_PROXY,
            physical_activity_days_per_week: exercise_days,
            sleep_hours_per_day: record.sleep,
            bp_mean,
            high_bp: indicator(bp.is_high()),
            cholesterol_ratio: CHOLESTEROL_PROXY / TRIGLYCERIDES_PROXY,
            age_bmi_interaction: age * bmi,
            stress_sedentary_interaction: stress * sedentary,
            bp_cholesterol_interaction: bp_mean * CHOLESTEROL_PROXY,
        })
    }
}

impl FeatureVector for CardiacFeatures {
    const NAMES: &'static [&'static str] = &[
        "Age",
        "Sex",
        "Cholesterol",
        "Heart Rate",
        "Smoking",
        "Obesity",
        "Alcohol Consumption",
        "Exercise Hours Per Week",
        "Diet_Healthy",
        "Diet_Average",
        "Diet_Unhealthy",
        "systolic",
        "diastolic",
        "Diabetes",
        "Family History",
        "Previous Heart Problems",
        "Medication Use",
        "Stress Level",
        "Sedentary Hours Per Day",
        "Income",
        "BMI",
        "Triglycerides",
        "Physical Activity Days Per Week",
        "Sleep Hours Per Day",
        "bp_mean",
        "high_bp",
        "cholesterol_ratio",
        "age_bmi_interaction",
        "stress_sedentary_interaction",
        "bp_cholesterol_interaction",
    ];

    const NUMERIC: &'static [&'static str] = &[
        "Age",
        "Cholesterol",
        "Heart Rate",
        "systolic",
        "diastolic",
        "Stress Level",
        "Sedentary Hours Per Day",
        "Income",
        "BMI",
        "Triglycerides",
        "Physical Activity Days Per Week",
        "Sleep Hours Per Day",
        "bp_mean",
        "cholesterol_ratio",
        "age_bmi_interaction",
        "stress_sedentary_interaction",
        "bp_cholesterol_interaction",
    ];

    fn to_vec(&self) -> Vec<f64> {
        vec![
            self.age,
            self.sex,
            self.cholesterol,
            self.heart_rate,
            self.smoking,
            self.obesity,
            self.alcohol_consumption,
            self.exercise_hours_per_week,
            self.diet_healthy,
            self.diet_average,
            self.diet_unhealthy,
            self.systolic,
            self.diastolic,
            self.diabetes,
            self.family_history,
            self.previous_heart_problems,
            self.medication_use,
            self.stress_level,
            self.sedentary_hours_per_day,
            self.income,
            self.bmi,
            self.triglycerides,
            self.physical_activity_days_per_week,
            self.sleep_hours_per_day,
            self.bp_mean,
            self.high_bp,
            self.cholesterol_ratio,
            self.age_bmi_interaction,
            self.stress_sedentary_interaction,
            self.bp_cholesterol_interaction,
        ]
    }
}
