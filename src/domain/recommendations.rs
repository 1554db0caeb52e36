//! Follow-up recommendations attached to a risk report.
//!
//! Rules fire on the report itself (overall level, per-disease scores) and on
//! lifestyle answers from the intake. Two general entries are always present.

use serde::Serialize;

use super::{PatientRecord, RiskAssessment, RiskLevel};

/// Scores strictly above this percentage trigger a disease-specific check.
pub const SCREENING_SCORE: f64 = 50.0;

/// Fewer exercise days per week than this trigger an activity recommendation.
const MIN_EXERCISE_DAYS: i32 = 3;

/// Fewer hours of sleep than this trigger a sleep recommendation.
const MIN_SLEEP_HOURS: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One recommendation shown with the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub description: &'static str,
    pub priority: Priority,
}

const fn entry(
    title: &'static str,
    description: &'static str,
    priority: Priority,
) -> Recommendation {
    Recommendation {
        title,
        description,
        priority,
    }
}

const CONSULT: Recommendation = entry(
    "Urgent: Consult a Healthcare Professional",
    "Your risk assessment indicates high risk. Please schedule an appointment with your doctor \
     immediately for comprehensive evaluation.",
    Priority::High,
);
const DIABETES_PROGRAM: Recommendation = entry(
    "Diabetes Prevention Program",
    "Consider joining a diabetes prevention program and monitor your blood sugar levels regularly.",
    Priority::High,
);
const CARDIO_CHECK: Recommendation = entry(
    "Cardiovascular Health Check",
    "Schedule a cardiovascular screening including ECG and lipid profile tests.",
    Priority::High,
);
const ACTIVITY: Recommendation = entry(
    "Increase Physical Activity",
    "Aim for at least 150 minutes of moderate exercise per week. Start with walking 30 minutes \
     daily.",
    Priority::Medium,
);
const QUIT_SMOKING: Recommendation = entry(
    "Quit Smoking Program",
    "Contact the National Authority on Tobacco and Alcohol (NATA) helpline: 1948 for smoking \
     cessation support.",
    Priority::High,
);
const SLEEP: Recommendation = entry(
    "Improve Sleep Quality",
    "Establish a regular sleep schedule and aim for 7-9 hours of quality sleep each night.",
    Priority::Medium,
);
const DIET: Recommendation = entry(
    "Adopt a Healthier Diet",
    "Reduce consumption of fast food and processed foods. Focus on balanced meals with vegetables, \
     lean proteins, and whole grains.",
    Priority::Medium,
);
const MONITORING: Recommendation = entry(
    "Regular Health Monitoring",
    "Monitor your blood pressure, weight, and blood sugar levels regularly. Keep a health diary.",
    Priority::Low,
);
const LOCAL_DIET: Recommendation = entry(
    "Healthy Sri Lankan Diet",
    "Focus on traditional healthy foods like green leafy vegetables, fish, and limit processed \
     foods and excessive rice consumption.",
    Priority::Medium,
);

/// Recommendations for one assessed record, in display order.
#[must_use]
pub fn recommendations(
    record: &PatientRecord,
    assessment: &RiskAssessment,
) -> Vec<Recommendation> {
    let rules = [
        (assessment.overall.level == RiskLevel::High, CONSULT),
        (assessment.diabetes.score > SCREENING_SCORE, DIABETES_PROGRAM),
        (assessment.cardiovascular.score > SCREENING_SCORE, CARDIO_CHECK),
        (record.exercise_days < MIN_EXERCISE_DAYS, ACTIVITY),
        (record.smokes(), QUIT_SMOKING),
        (record.sleep < MIN_SLEEP_HOURS, SLEEP),
        (record.eats_fast_food(), DIET),
        (true, MONITORING),
        (true, LOCAL_DIET),
    ];

    rules
        .into_iter()
        .filter_map(|(fires, recommendation)| fires.then_some(recommendation))
        .collect()
}
