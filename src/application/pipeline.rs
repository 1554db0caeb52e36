//! Scaler and classifier adapters: run one feature row through a port.

use crate::domain::FeatureRow;
use crate::ports::{Classifier, ModelError, Scaler};
use crate::HealthRiskError;

/// Scale the `subset` fields of `row` in place.
///
/// The subset values are sent as a single-row batch and the returned row is
/// written back into the same positions. Every other field is left as is.
///
/// # Errors
/// Returns `HealthRiskError::Configuration` if a subset name is not part of
/// the row layout or the scaler output does not have the input's shape, and
/// `HealthRiskError::Model` if the scaler itself fails.
pub fn scale_numeric<S>(
    row: &mut FeatureRow,
    subset: &[&str],
    scaler: &S,
) -> Result<(), HealthRiskError>
where
    S: Scaler + ?Sized,
{
    let positions = subset
        .iter()
        .map(|name| {
            row.position(name).ok_or_else(|| {
                HealthRiskError::Configuration(format!(
                    "scaler field {name:?} is not in the feature layout"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let input: Vec<f64> = positions.iter().map(|&i| row.values()[i]).collect();
    let mut output = scaler.transform(&[input])?;

    if output.len() != 1 {
        return Err(HealthRiskError::Configuration(format!(
            "scaler returned {} rows for a single-row batch",
            output.len()
        )));
    }
    let scaled = output.remove(0);
    if scaled.len() != positions.len() {
        return Err(HealthRiskError::Configuration(format!(
            "scaler returned {} values for {} fields",
            scaled.len(),
            positions.len()
        )));
    }

    row.write_back(&positions, &scaled);
    Ok(())
}

/// Positive-class probability of `row` under `model`.
///
/// # Errors
/// Returns `HealthRiskError::Model` if inference fails, the output is not
/// exactly one row of two columns, or the probability is not in [0, 1].
pub fn predict_positive<C>(row: &FeatureRow, model: &C) -> Result<f64, HealthRiskError>
where
    C: Classifier + ?Sized,
{
    let output = model.predict_proba(&[row.values().to_vec()])?;

    let [probabilities] = output.as_slice() else {
        return Err(ModelError::OutputShape {
            what: "rows",
            expected: 1,
            got: output.len(),
        }
        .into());
    };
    let [_, positive] = probabilities.as_slice() else {
        return Err(ModelError::OutputShape {
            what: "columns",
            expected: 2,
            got: probabilities.len(),
        }
        .into());
    };

    if !positive.is_finite() || !(0.0..=1.0).contains(positive) {
        return Err(ModelError::InvalidProbability(*positive).into());
    }
    Ok(*positive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::high_risk_record;
    use crate::domain::{CardiacFeatures, DiabetesFeatures, FeatureVector};

    /// Replaces every value with its negation.
    struct Negate;

    impl Scaler for Negate {
        fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
            Ok(rows.iter().map(|r| r.iter().map(|v| -v).collect()).collect())
        }
    }

    /// Drops the last column.
    struct Narrow;

    impl Scaler for Narrow {
        fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
            Ok(rows.iter().map(|r| r[..r.len() - 1].to_vec()).collect())
        }
    }

    struct Fixed(Vec<Vec<f64>>);

    impl Classifier for Fixed {
        fn predict_proba(&self, _rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
            Ok(self.0.clone())
        }
    }

    fn cardiac_row() -> FeatureRow {
        let record = high_risk_record();
        CardiacFeatures::encode(&record, record.bmi())
            .expect("Should encode")
            .to_row()
    }

    #[test]
    fn test_scale_touches_only_subset() {
        let mut row = cardiac_row();
        let before = row.clone();

        scale_numeric(&mut row, CardiacFeatures::NUMERIC, &Negate).expect("Should scale");

        for (i, name) in row.names().iter().enumerate() {
            let expected = if CardiacFeatures::NUMERIC.contains(name) {
                -before.values()[i]
            } else {
                before.values()[i]
            };
            assert_eq!(row.values()[i], expected, "field {name}");
        }
        assert_eq!(row.get("Diabetes"), Some(1.0));
        assert_eq!(row.get("high_bp"), Some(1.0));
    }

    #[test]
    fn test_scale_shape_mismatch_is_configuration_error() {
        let mut row = cardiac_row();
        let err =
            scale_numeric(&mut row, CardiacFeatures::NUMERIC, &Narrow).expect_err("must fail");
        assert!(matches!(err, HealthRiskError::Configuration(_)));
    }

    #[test]
    fn test_scale_unknown_field_is_configuration_error() {
        let record = high_risk_record();
        let mut row = DiabetesFeatures::encode(&record, record.bmi()).to_row();
        let err = scale_numeric(&mut row, &["Age", "Cholesterol"], &Negate).expect_err("must fail");
        assert!(matches!(err, HealthRiskError::Configuration(_)));
    }

    #[test]
    fn test_predict_returns_positive_column() {
        let p = predict_positive(&cardiac_row(), &Fixed(vec![vec![0.25, 0.75]]))
            .expect("Should predict");
        assert!((p - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_predict_rejects_bad_output() {
        let row = cardiac_row();
        for output in [
            vec![vec![0.4]],
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![],
            vec![vec![-0.5, 1.5]],
            vec![vec![0.5, f64::NAN]],
        ] {
            let err = predict_positive(&row, &Fixed(output)).expect_err("must fail");
            assert!(matches!(err, HealthRiskError::Model(_)), "{err}");
        }
    }
}
