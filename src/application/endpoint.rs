//! Request boundary: one JSON intake in, one JSON report (or error) out.

use serde::{Deserialize, Serialize};

use super::AssessmentService;
use crate::domain::{recommendations, PatientRecord, Recommendation, RiskAssessment};
use crate::ports::{Classifier, Scaler};
use crate::HealthRiskError;

pub const STATUS_OK: u16 = 200;
pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Error body returned for any non-200 status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    pub details: String,
}

/// Body returned with status 200: the risk report plus its follow-ups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentResponse {
    #[serde(flatten)]
    pub assessment: RiskAssessment,
    pub recommendations: Vec<Recommendation>,
}

/// A status code and its JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    fn error(err: &HealthRiskError) -> Self {
        let (status, message) = if err.is_input_error() {
            (STATUS_UNPROCESSABLE, "Invalid patient data")
        } else {
            (STATUS_INTERNAL_ERROR, "Risk assessment failed")
        };
        let report = ErrorReport {
            message: message.to_string(),
            details: err.to_string(),
        };
        Self {
            status,
            body: serde_json::to_string(&report)
                .unwrap_or_else(|_| format!("{{\"message\":\"{message}\"}}")),
        }
    }
}

/// Handle one request body.
///
/// Input failures (bad JSON, missing or mistyped fields, malformed blood
/// pressure, invalid measurements) map to 422; everything else to 500.
pub fn handle<C, S>(service: &AssessmentService<C, S>, body: &str) -> Response
where
    C: Classifier + ?Sized,
    S: Scaler + ?Sized,
{
    let result = PatientRecord::from_json(body)
        .map_err(HealthRiskError::from)
        .and_then(|record| {
            let assessment = service.assess(&record)?;
            Ok(AssessmentResponse {
                recommendations: recommendations(&record, &assessment),
                assessment,
            })
        })
        .and_then(|response| serde_json::to_string(&response).map_err(HealthRiskError::from));

    match result {
        Ok(body) => Response { status: STATUS_OK, body },
        Err(err) => {
            if err.is_input_error() {
                tracing::warn!("Rejected request: {}", err);
            } else {
                tracing::error!("Assessment failed: {}", err);
            }
            Response::error(&err)
        }
    }
}
