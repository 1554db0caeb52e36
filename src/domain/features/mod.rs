//! Engineered feature vectors consumed by the risk models.
//!
//! Each variant is a named-field struct whose canonical order is fixed by
//! [`FeatureVector::NAMES`]. The models and scalers were fit against that exact
//! order, so vectors are only ever handed out through [`FeatureVector::to_row`].

mod cardiac;
mod diabetes;

pub use cardiac::{
    CardiacFeatures, CHOLESTEROL_PROXY, INCOME_PROXY, MEDICATION_USE_PROXY, TRIGLYCERIDES_PROXY,
};
pub use diabetes::{DiabetesFeatures, ProxySource, DIABETES_SYMPTOM_PROXIES};

/// BMI strictly above this value counts as obese.
pub const OBESITY_BMI: f64 = 30.0;

/// A model input vector with a canonical field order.
pub trait FeatureVector {
    /// Field names in the order the model was trained on.
    const NAMES: &'static [&'static str];

    /// Subset of `NAMES` that goes through the fitted scaler.
    const NUMERIC: &'static [&'static str];

    /// Field values in `NAMES` order.
    fn to_vec(&self) -> Vec<f64>;

    /// Ordered row ready for scaling and inference.
    fn to_row(&self) -> FeatureRow {
        FeatureRow {
            names: Self::NAMES,
            values: self.to_vec(),
        }
    }
}

/// An ordered, named row of feature values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    names: &'static [&'static str],
    values: Vec<f64>,
}

impl FeatureRow {
    #[must_use]
    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of a named field.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| *n == name)
    }

    /// Value of a named field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.values[i])
    }

    /// Overwrite the values at `positions` with `values`, pairwise.
    ///
    /// Callers guarantee both slices have the same length and every position
    /// is in range.
    pub(crate) fn write_back(&mut self, positions: &[usize], values: &[f64]) {
        debug_assert_eq!(positions.len(), values.len());
        for (&i, &v) in positions.iter().zip(values) {
            self.values[i] = v;
        }
    }
}

/// 1.0 for true, 0.0 for false.
pub(crate) fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::fixtures::high_risk_record;

    fn assert_layout<V: FeatureVector>(expected_len: usize, expected_numeric: usize) {
        assert_eq!(V::NAMES.len(), expected_len);
        assert_eq!(V::NUMERIC.len(), expected_numeric);

        let unique: HashSet<_> = V::NAMES.iter().collect();
        assert_eq!(unique.len(), V::NAMES.len(), "field names must be unique");

        for name in V::NUMERIC {
            assert!(V::NAMES.contains(name), "{name} missing from layout");
        }
    }

    #[test]
    fn test_layouts() {
        assert_layout::<DiabetesFeatures>(20, 4);
        assert_layout::<CardiacFeatures>(30, 17);
    }

    #[test]
    fn test_rows_match_layout() {
        let record = high_risk_record();
        let bmi = record.bmi();

        let diabetes = DiabetesFeatures::encode(&record, bmi).to_row();
        assert_eq!(diabetes.len(), DiabetesFeatures::NAMES.len());
        assert_eq!(diabetes.names(), DiabetesFeatures::NAMES);

        let cardiac = CardiacFeatures::encode(&record, bmi)
            .expect("Should encode")
            .to_row();
        assert_eq!(cardiac.len(), CardiacFeatures::NAMES.len());
    }

    #[test]
    fn test_write_back_preserves_other_positions() {
        let record = high_risk_record();
        let mut row = DiabetesFeatures::encode(&record, record.bmi()).to_row();
        let before = row.clone();

        row.write_back(&[0, 16], &[-1.0, -2.0]);

        assert_eq!(row.get("Age"), Some(-1.0));
        assert_eq!(row.get("symptom_count"), Some(-2.0));
        for i in (1..row.len()).filter(|&i| i != 16) {
            assert_eq!(row.values()[i], before.values()[i]);
        }
    }
}
