//! JSON model artifacts: Implementation of `Scaler` and `Classifier`.
//!
//! The training pipeline exports four files per deployment:
//! `diabetes_scaler.json`, `diabetes_model.json`, `heart_scaler.json` and
//! `heart_model.json`. Scalers are standard scalers; models are logistic
//! classifiers over the full engineered vector.
//!
//! # Integration checks
//!
//! Artifacts are fit against a fixed field order. On load, each artifact's
//! `feature_names` must equal the layout this build encodes, and every model
//! must declare its classes as `[0, 1]` so that output column 1 is the
//! positive (at-risk) class. A mismatch refuses the deployment instead of
//! silently corrupting or inverting scores.

pub mod manifest;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, Settings};
use crate::domain::{CardiacFeatures, DiabetesFeatures, FeatureVector};
use crate::ports::{Classifier, ModelError, Scaler};

pub use manifest::{ManifestPolicy, SignedManifest, VerifiedArtifacts};

pub const DIABETES_SCALER_FILE: &str = "diabetes_scaler.json";
pub const DIABETES_MODEL_FILE: &str = "diabetes_model.json";
pub const HEART_SCALER_FILE: &str = "heart_scaler.json";
pub const HEART_MODEL_FILE: &str = "heart_model.json";

/// Every file an artifact directory must provide.
pub const ARTIFACT_FILES: [&str; 4] = [
    DIABETES_SCALER_FILE,
    DIABETES_MODEL_FILE,
    HEART_SCALER_FILE,
    HEART_MODEL_FILE,
];

/// Class labels every model must declare, in output-column order.
const EXPECTED_CLASSES: [i64; 2] = [0, 1];

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {name}: {reason}")]
    Read { name: String, reason: String },

    #[error("Invalid artifact {name}: {reason}")]
    Format { name: String, reason: String },

    #[error("Artifact {name} is incompatible with this build: {reason}")]
    Incompatible { name: String, reason: String },

    #[error("Manifest verification failed: {0}")]
    Manifest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Fitted standard scaler: `(x - mean) / scale`, column-wise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn check(&self, name: &str, layout: &[&str]) -> Result<(), ArtifactError> {
        check_feature_names(name, &self.feature_names, layout)?;
        if self.mean.len() != layout.len() || self.scale.len() != layout.len() {
            return Err(format_error(
                name,
                "mean/scale lengths do not match feature_names",
            ));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(format_error(name, "mean contains non-finite values"));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(format_error(name, "scale must be finite and non-zero"));
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        rows.iter()
            .map(|row| {
                if row.len() != self.mean.len() {
                    return Err(ModelError::InputWidth {
                        expected: self.mean.len(),
                        got: row.len(),
                    });
                }
                Ok(row
                    .iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(x, (mean, scale))| (x - mean) / scale)
                    .collect())
            })
            .collect()
    }
}

/// Logistic regression over the full feature vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Class label of each output column
    pub classes: Vec<i64>,
}

impl LogisticClassifier {
    fn check(&self, name: &str, layout: &[&str]) -> Result<(), ArtifactError> {
        check_feature_names(name, &self.feature_names, layout)?;
        if self.classes != EXPECTED_CLASSES {
            return Err(ArtifactError::Incompatible {
                name: name.to_string(),
                reason: format!(
                    "classes must be {EXPECTED_CLASSES:?} (negative, positive), got {:?}",
                    self.classes
                ),
            });
        }
        if self.coefficients.len() != layout.len() {
            return Err(format_error(
                name,
                "coefficients length does not match feature_names",
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(format_error(name, "parameters must be finite"));
        }
        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticClassifier {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        rows.iter()
            .map(|row| {
                if row.len() != self.coefficients.len() {
                    return Err(ModelError::InputWidth {
                        expected: self.coefficients.len(),
                        got: row.len(),
                    });
                }
                let z = self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(x, w)| x * w)
                        .sum::<f64>();
                let p = sigmoid(z);
                Ok(vec![1.0 - p, p])
            })
            .collect()
    }
}

fn format_error(name: &str, reason: &str) -> ArtifactError {
    ArtifactError::Format {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn check_feature_names(
    name: &str,
    actual: &[String],
    layout: &[&str],
) -> Result<(), ArtifactError> {
    if actual.len() != layout.len() || actual.iter().zip(layout).any(|(a, b)| a != b) {
        return Err(ArtifactError::Incompatible {
            name: name.to_string(),
            reason: format!("feature_names must be {layout:?}, got {actual:?}"),
        });
    }
    Ok(())
}

fn parse_json<T: DeserializeOwned>(
    verified: &VerifiedArtifacts,
    name: &str,
) -> Result<T, ArtifactError> {
    serde_json::from_slice(verified.bytes(name)?).map_err(|e| format_error(name, &e.to_string()))
}

/// The four artifacts of one deployment, verified and checked.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub diabetes_scaler: StandardScaler,
    pub diabetes_model: LogisticClassifier,
    pub heart_scaler: StandardScaler,
    pub heart_model: LogisticClassifier,
}

impl ModelBundle {
    /// Load the artifact directory named by `settings`.
    ///
    /// # Errors
    /// Returns `ArtifactError` if verification or any integration check fails.
    pub fn from_settings(settings: &Settings) -> Result<Self, ArtifactError> {
        let policy = ManifestPolicy::from_settings(settings)?;
        Self::load(&settings.model_dir, &policy)
    }

    /// Verify the manifest in `dir`, then load and check all four artifacts.
    ///
    /// # Errors
    /// Returns `ArtifactError` if verification or any integration check fails.
    pub fn load(dir: &Path, policy: &ManifestPolicy) -> Result<Self, ArtifactError> {
        let verified = manifest::verify(dir, policy)?;
        let bundle = Self::from_verified(&verified)?;
        tracing::info!(
            "Loaded model artifacts from {:?} (diabetes: {} features, heart: {} features)",
            dir,
            bundle.diabetes_model.coefficients.len(),
            bundle.heart_model.coefficients.len()
        );
        Ok(bundle)
    }

    /// Parse and check the four artifacts from the bytes `verify` hashed.
    ///
    /// # Errors
    /// Returns `ArtifactError` if an artifact is missing, malformed or
    /// incompatible with this build's layouts.
    pub fn from_verified(verified: &VerifiedArtifacts) -> Result<Self, ArtifactError> {
        let diabetes_scaler: StandardScaler = parse_json(verified, DIABETES_SCALER_FILE)?;
        diabetes_scaler.check(DIABETES_SCALER_FILE, DiabetesFeatures::NUMERIC)?;

        let diabetes_model: LogisticClassifier = parse_json(verified, DIABETES_MODEL_FILE)?;
        diabetes_model.check(DIABETES_MODEL_FILE, DiabetesFeatures::NAMES)?;

        let heart_scaler: StandardScaler = parse_json(verified, HEART_SCALER_FILE)?;
        heart_scaler.check(HEART_SCALER_FILE, CardiacFeatures::NUMERIC)?;

        let heart_model: LogisticClassifier = parse_json(verified, HEART_MODEL_FILE)?;
        heart_model.check(HEART_MODEL_FILE, CardiacFeatures::NAMES)?;

        Ok(Self {
            diabetes_scaler,
            diabetes_model,
            heart_scaler,
            heart_model,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::manifest::testing::{sign_dir, signing_key};
    use super::testing::*;
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn signed_bundle_dir() -> (tempfile::TempDir, ManifestPolicy) {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_bundle(temp.path());
        sign_dir(temp.path(), &key, &ARTIFACT_FILES, chrono::Utc::now().timestamp());
        let policy = ManifestPolicy {
            verifying_key: Some(key.verifying_key()),
            ..ManifestPolicy::default()
        };
        (temp, policy)
    }

    fn resign(dir: &Path, policy: &mut ManifestPolicy) {
        let key = signing_key();
        sign_dir(dir, &key, &ARTIFACT_FILES, chrono::Utc::now().timestamp());
        policy.verifying_key = Some(key.verifying_key());
    }

    #[test]
    fn test_load_signed_bundle() {
        let (temp, policy) = signed_bundle_dir();
        let bundle = ModelBundle::load(temp.path(), &policy).expect("Should load");
        assert_eq!(bundle.diabetes_model.coefficients.len(), 20);
        assert_eq!(bundle.heart_scaler.mean.len(), 17);
    }

    #[test]
    fn test_rejects_reordered_scaler() {
        let (temp, mut policy) = signed_bundle_dir();
        let mut scaler = identity_scaler(DiabetesFeatures::NUMERIC);
        scaler.feature_names.swap(0, 1);
        write_json(temp.path(), DIABETES_SCALER_FILE, &scaler);
        resign(temp.path(), &mut policy);

        let err = ModelBundle::load(temp.path(), &policy).expect_err("must fail");
        assert!(matches!(err, ArtifactError::Incompatible { .. }));
    }

    #[test]
    fn test_rejects_inverted_classes() {
        let (temp, mut policy) = signed_bundle_dir();
        let mut model = constant_model(CardiacFeatures::NAMES, 0.0);
        model.classes = vec![1, 0];
        write_json(temp.path(), HEART_MODEL_FILE, &model);
        resign(temp.path(), &mut policy);

        let err = ModelBundle::load(temp.path(), &policy).expect_err("must fail");
        assert!(err.to_string().contains("classes"));
    }

    #[test]
    fn test_rejects_zero_scale() {
        let (temp, mut policy) = signed_bundle_dir();
        let mut scaler = identity_scaler(CardiacFeatures::NUMERIC);
        scaler.scale[3] = 0.0;
        write_json(temp.path(), HEART_SCALER_FILE, &scaler);
        resign(temp.path(), &mut policy);

        let err = ModelBundle::load(temp.path(), &policy).expect_err("must fail");
        assert!(matches!(err, ArtifactError::Format { .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let (temp, mut policy) = signed_bundle_dir();
        fs::write(temp.path().join(DIABETES_MODEL_FILE), "{not json").expect("write");
        resign(temp.path(), &mut policy);

        let err = ModelBundle::load(temp.path(), &policy).expect_err("must fail");
        assert!(matches!(err, ArtifactError::Format { .. }));
    }

    #[test]
    fn test_parses_the_bytes_that_were_hashed() {
        let (temp, policy) = signed_bundle_dir();
        let verified = manifest::verify(temp.path(), &policy).expect("Should verify");

        // Swapping a file after verification must not reach the parser.
        fs::write(temp.path().join(HEART_MODEL_FILE), "{not json").expect("write");
        let mut model = constant_model(DiabetesFeatures::NAMES, 3.0);
        model.feature_names.reverse();
        write_json(temp.path(), DIABETES_MODEL_FILE, &model);

        let bundle = ModelBundle::from_verified(&verified).expect("Should load verified bytes");
        assert_eq!(bundle.diabetes_model.intercept, 0.0);
        assert_eq!(bundle.heart_model.feature_names.len(), 30);
    }

    #[test]
    fn test_standard_scaler() {
        let scaler = StandardScaler {
            feature_names: vec!["a".into(), "b".into()],
            mean: vec![10.0, -1.0],
            scale: vec![2.0, 0.5],
        };
        let out = scaler.transform(&[vec![14.0, 0.0]]).expect("Should scale");
        assert_eq!(out, vec![vec![2.0, 2.0]]);

        let err = scaler.transform(&[vec![1.0]]).expect_err("must fail");
        assert_eq!(err, ModelError::InputWidth { expected: 2, got: 1 });
    }

    #[test]
    fn test_logistic_classifier() {
        let model = LogisticClassifier {
            feature_names: vec!["a".into(), "b".into()],
            coefficients: vec![1.0, -1.0],
            intercept: 0.0,
            classes: vec![0, 1],
        };
        let out = model
            .predict_proba(&[vec![0.0, 0.0], vec![50.0, 0.0], vec![0.0, 800.0]])
            .expect("Should predict");
        assert_eq!(out.len(), 3);
        assert!((out[0][1] - 0.5).abs() < f64::EPSILON);
        assert!(out[1][1] > 0.999);
        assert!(out[2][1] >= 0.0 && out[2][1] < 1e-6);
        for row in &out {
            assert!((row[0] + row[1] - 1.0).abs() < 1e-12);
        }
    }
}
