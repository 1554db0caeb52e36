//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary between
//! the risk pipeline and the externally trained model artifacts.

mod model;

pub use model::{Classifier, ModelError, Scaler};
