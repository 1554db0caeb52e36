//! Model ports: capability traits for the fitted scalers and classifiers.
//!
//! The pipeline only knows these two operations. The trained artifacts behind
//! them are loaded once at startup and shared read-only across requests.

/// Errors raised by a scaler or classifier implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Expected {expected} input columns, got {got}")]
    InputWidth { expected: usize, got: usize },

    #[error("Expected {expected} output {what}, got {got}")]
    OutputShape {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Positive-class probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// A fitted numeric transform (e.g. standardization).
///
/// Implementations return one output row per input row, each the same width
/// as its input.
pub trait Scaler: Send + Sync {
    /// Transform a batch of rows.
    ///
    /// # Errors
    /// Returns `ModelError` if the rows do not fit the scaler.
    fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError>;
}

/// A trained binary classifier.
///
/// The class order of each output row is `[negative, positive]`.
pub trait Classifier: Send + Sync {
    /// Class probabilities for a batch of rows.
    ///
    /// # Errors
    /// Returns `ModelError` if inference fails.
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError>;
}
