use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    types::{EmployeeId, ObservationId, OrganizationId, UserId},
    validation::rules::validate_not_blank,
};

text_enum! {
    pub enum ObservationCategory {
        General => "general",
        Positive => "positive",
        Improvement => "improvement",
        Incident => "incident",
    }
}

/// Free-form note written about an employee by a member of the organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Observation {
    pub id: ObservationId,
    pub organization_id: OrganizationId,
    pub employee_id: EmployeeId,
    pub author_id: UserId,
    pub category: ObservationCategory,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(
        organization_id: OrganizationId,
        employee_id: EmployeeId,
        author_id: UserId,
        payload: CreateObservation,
    ) -> Self {
        Self {
            id: ObservationId::new(),
            organization_id,
            employee_id,
            author_id,
            category: payload.category,
            content: payload.content.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateObservation {
    pub category: ObservationCategory,
    #[validate(length(min = 1, max = 5000), custom(function = "validate_not_blank"))]
    pub content: String,
}
