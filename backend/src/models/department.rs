use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    models::organization::trim_optional,
    types::{DepartmentId, EmployeeId, OrganizationId},
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: DepartmentId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub manager_employee_id: Option<EmployeeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Department {
    pub fn new(organization_id: OrganizationId, payload: DepartmentPayload) -> Self {
        let now = Utc::now();
        Self {
            id: DepartmentId::new(),
            organization_id,
            name: payload.name.trim().to_string(),
            description: trim_optional(payload.description),
            manager_employee_id: payload.manager_employee_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, payload: DepartmentPayload) {
        self.name = payload.name.trim().to_string();
        self.description = trim_optional(payload.description);
        self.manager_employee_id = payload.manager_employee_id;
        self.updated_at = Utc::now();
    }
}

/// Create and full-replace payload for departments.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DepartmentPayload {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub manager_employee_id: Option<EmployeeId>,
}

/// Department with its head count, used by list endpoints.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DepartmentSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub department: Department,
    pub employee_count: i64,
}
