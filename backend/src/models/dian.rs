use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::types::{DianSubmissionId, OrganizationId, PayrollId};

text_enum! {
    pub enum DianSubmissionStatus {
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

/// One attempt at sending a payroll document to DIAN.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DianSubmission {
    pub id: DianSubmissionId,
    pub organization_id: OrganizationId,
    pub payroll_id: PayrollId,
    pub document_number: String,
    pub cune: String,
    pub status: DianSubmissionStatus,
    pub response_code: String,
    pub response_message: String,
    pub tracking_id: Option<String>,
    #[serde(skip_serializing)]
    pub xml_document: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DianValidationResponse {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl DianValidationResponse {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DianSubmitResponse {
    pub submission: DianSubmission,
    pub payroll_status: crate::models::payroll::PayrollStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DianSubmissionQuery {
    pub payroll_id: Option<String>,
}
