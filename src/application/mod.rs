//! Application layer: Use cases and services.
//!
//! This module wires the domain encoders to the model ports to implement the
//! single use case of the crate: scoring one patient intake.

mod assessment;
pub mod endpoint;
pub mod pipeline;

pub use assessment::AssessmentService;
pub use endpoint::{handle, AssessmentResponse, ErrorReport, Response};
