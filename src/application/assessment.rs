//! Assessment service: Orchestrates one risk assessment.
//!
//! For each record the service
//! - validates the intake and computes BMI once,
//! - encodes both feature vectors,
//! - scales each numeric subset,
//! - runs both classifiers,
//! - aggregates the two probabilities into one report.
//!
//! Both vectors are encoded before any scaler or model is touched, so a
//! malformed blood pressure fails without a single port call.

use std::sync::Arc;

use super::pipeline::{predict_positive, scale_numeric};
use crate::adapters::artifacts::{LogisticClassifier, ModelBundle, StandardScaler};
use crate::domain::{
    CardiacFeatures, DiabetesFeatures, FeatureVector, PatientRecord, RiskAssessment,
};
use crate::ports::{Classifier, Scaler};
use crate::HealthRiskError;

/// Service for scoring patient records.
///
/// Holds the two scaler/model pairs as shared, read-only resources. One
/// instance can serve assessments from many threads at once.
pub struct AssessmentService<C, S>
where
    C: Classifier + ?Sized,
    S: Scaler + ?Sized,
{
    diabetes_scaler: Arc<S>,
    diabetes_model: Arc<C>,
    heart_scaler: Arc<S>,
    heart_model: Arc<C>,
}

impl<C, S> Clone for AssessmentService<C, S>
where
    C: Classifier + ?Sized,
    S: Scaler + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            diabetes_scaler: Arc::clone(&self.diabetes_scaler),
            diabetes_model: Arc::clone(&self.diabetes_model),
            heart_scaler: Arc::clone(&self.heart_scaler),
            heart_model: Arc::clone(&self.heart_model),
        }
    }
}

impl AssessmentService<LogisticClassifier, StandardScaler> {
    /// Bind a loaded artifact bundle.
    #[must_use]
    pub fn from_bundle(bundle: ModelBundle) -> Self {
        Self::new(
            Arc::new(bundle.diabetes_scaler),
            Arc::new(bundle.diabetes_model),
            Arc::new(bundle.heart_scaler),
            Arc::new(bundle.heart_model),
        )
    }
}

impl<C, S> AssessmentService<C, S>
where
    C: Classifier + ?Sized,
    S: Scaler + ?Sized,
{
    /// Create a new assessment service.
    pub fn new(
        diabetes_scaler: Arc<S>,
        diabetes_model: Arc<C>,
        heart_scaler: Arc<S>,
        heart_model: Arc<C>,
    ) -> Self {
        Self {
            diabetes_scaler,
            diabetes_model,
            heart_scaler,
            heart_model,
        }
    }

    /// Score one patient record.
    ///
    /// # Errors
    /// - `Validation` for non-positive height/weight or non-finite sleep
    /// - `Parse` for a malformed blood pressure
    /// - `Configuration` for a scaler that does not fit its subset
    /// - `Model` for any classifier failure
    ///
    /// No partial report is returned on failure.
    pub fn assess(&self, record: &PatientRecord) -> Result<RiskAssessment, HealthRiskError> {
        tracing::info!("Starting risk assessment");

        record
            .validate()
            .map_err(|errors| HealthRiskError::Validation(errors.join("; ")))?;
        let bmi = record.bmi();

        let mut diabetes = DiabetesFeatures::encode(record, bmi).to_row();
        let mut cardiac = CardiacFeatures::encode(record, bmi)?.to_row();
        tracing::debug!(
            "Encoded feature vectors ({} diabetes, {} cardiac fields)",
            diabetes.len(),
            cardiac.len()
        );

        scale_numeric(&mut diabetes, DiabetesFeatures::NUMERIC, self.diabetes_scaler.as_ref())?;
        scale_numeric(&mut cardiac, CardiacFeatures::NUMERIC, self.heart_scaler.as_ref())?;
        tracing::debug!("Scaled numeric subsets");

        let diabetes_p = predict_positive(&diabetes, self.diabetes_model.as_ref())?;
        let cardiac_p = predict_positive(&cardiac, self.heart_model.as_ref())?;
        tracing::debug!("Model inference complete");

        let assessment = RiskAssessment::aggregate(diabetes_p, cardiac_p);
        tracing::info!(
            "Risk assessment complete: diabetes={}, cvd={}, overall={}",
            assessment.diabetes.level,
            assessment.cardiovascular.level,
            assessment.overall.level
        );
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::adapters::artifacts::testing::{constant_model, identity_scaler};
    use crate::domain::fixtures::{high_risk_record, low_risk_record};
    use crate::domain::RiskLevel;
    use crate::ports::ModelError;

    /// Identity scaler that counts calls and can return a fixed width.
    #[derive(Default)]
    struct CountingScaler {
        calls: AtomicUsize,
        width: Option<usize>,
    }

    impl Scaler for CountingScaler {
        fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(rows
                .iter()
                .map(|r| match self.width {
                    Some(w) => vec![0.0; w],
                    None => r.clone(),
                })
                .collect())
        }
    }

    /// Returns a fixed output for every row and counts calls.
    struct CountingModel {
        calls: AtomicUsize,
        output: Vec<f64>,
    }

    impl CountingModel {
        fn returning(output: Vec<f64>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                output,
            }
        }
    }

    impl Classifier for CountingModel {
        fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(rows.iter().map(|_| self.output.clone()).collect())
        }
    }

    struct Mocks {
        scaler: Arc<CountingScaler>,
        model: Arc<CountingModel>,
    }

    impl Mocks {
        fn new(scaler: CountingScaler, model: CountingModel) -> Self {
            Self {
                scaler: Arc::new(scaler),
                model: Arc::new(model),
            }
        }

        fn service(&self) -> AssessmentService<CountingModel, CountingScaler> {
            AssessmentService::new(
                Arc::clone(&self.scaler),
                Arc::clone(&self.model),
                Arc::clone(&self.scaler),
                Arc::clone(&self.model),
            )
        }

        fn calls(&self) -> (usize, usize) {
            (
                self.scaler.calls.load(Ordering::SeqCst),
                self.model.calls.load(Ordering::SeqCst),
            )
        }
    }

    #[test]
    fn test_high_risk_scenario() {
        let mocks = Mocks::new(CountingScaler::default(), CountingModel::returning(vec![0.5, 0.5]));

        let report = mocks.service().assess(&high_risk_record()).expect("Should assess");

        assert!(report.diabetes.level >= RiskLevel::Medium);
        assert!(report.cardiovascular.level >= RiskLevel::Medium);
        assert_eq!(report.overall.score, 50.0);
        assert_eq!(mocks.calls(), (2, 2));
    }

    #[test]
    fn test_malformed_blood_pressure_skips_models() {
        for bp in ["12080", "abc/80", "120/80/60"] {
            let mocks = Mocks::new(
                CountingScaler::default(),
                CountingModel::returning(vec![0.5, 0.5]),
            );
            let mut record = high_risk_record();
            record.blood_pressure = bp.into();

            let err = mocks.service().assess(&record).expect_err("must fail");

            assert!(matches!(err, HealthRiskError::Parse(_)), "{bp}: {err}");
            assert!(err.is_input_error());
            assert_eq!(mocks.calls(), (0, 0), "{bp}");
        }
    }

    #[test]
    fn test_invalid_measurements_skip_models() {
        let mocks = Mocks::new(CountingScaler::default(), CountingModel::returning(vec![0.5, 0.5]));
        let mut record = low_risk_record();
        record.height = 0.0;

        let err = mocks.service().assess(&record).expect_err("must fail");

        assert!(matches!(err, HealthRiskError::Validation(_)));
        assert_eq!(mocks.calls(), (0, 0));
    }

    #[test]
    fn test_scaler_shape_mismatch() {
        let scaler = CountingScaler {
            width: Some(3),
            ..CountingScaler::default()
        };
        let mocks = Mocks::new(scaler, CountingModel::returning(vec![0.5, 0.5]));

        let err = mocks.service().assess(&low_risk_record()).expect_err("must fail");

        assert!(matches!(err, HealthRiskError::Configuration(_)));
        assert!(!err.is_input_error());
        assert_eq!(mocks.calls().1, 0);
    }

    #[test]
    fn test_bad_classifier_output() {
        for output in [vec![0.2], vec![-0.5, 1.5]] {
            let mocks = Mocks::new(CountingScaler::default(), CountingModel::returning(output));
            let err = mocks.service().assess(&low_risk_record()).expect_err("must fail");
            assert!(matches!(err, HealthRiskError::Model(_)));
        }
    }

    #[test]
    fn test_overall_tracks_higher_risk() {
        let diabetes_model = Arc::new(CountingModel::returning(vec![0.8, 0.2]));
        let heart_model = Arc::new(CountingModel::returning(vec![0.3, 0.7]));
        let scaler = Arc::new(CountingScaler::default());
        let service = AssessmentService::new(
            Arc::clone(&scaler),
            diabetes_model,
            Arc::clone(&scaler),
            heart_model,
        );

        let report = service.assess(&low_risk_record()).expect("Should assess");

        assert_eq!(report.diabetes.level, RiskLevel::Low);
        assert_eq!(report.cardiovascular.level, RiskLevel::High);
        assert_eq!(report.overall, report.cardiovascular);
    }

    #[test]
    fn test_from_bundle() {
        let bundle = ModelBundle {
            diabetes_scaler: identity_scaler(DiabetesFeatures::NUMERIC),
            diabetes_model: constant_model(DiabetesFeatures::NAMES, 0.0),
            heart_scaler: identity_scaler(CardiacFeatures::NUMERIC),
            heart_model: constant_model(CardiacFeatures::NAMES, 2.0),
        };
        let service = AssessmentService::from_bundle(bundle);

        let report = service.assess(&high_risk_record()).expect("Should assess");

        assert_eq!(report.diabetes.score, 50.0);
        assert_eq!(report.diabetes.level, RiskLevel::Medium);
        assert_eq!(report.cardiovascular.level, RiskLevel::High);
    }

    #[test]
    fn test_concurrent_assessments() {
        let mocks = Mocks::new(CountingScaler::default(), CountingModel::returning(vec![0.5, 0.5]));
        let service = mocks.service();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let service = service.clone();
                scope.spawn(move || {
                    let report = service.assess(&high_risk_record()).expect("Should assess");
                    assert_eq!(report.overall.level, RiskLevel::Medium);
                });
            }
        });

        assert_eq!(mocks.calls(), (8, 8));
    }
}
