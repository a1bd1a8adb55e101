use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    models::organization::trim_optional,
    types::{DepartmentId, OrganizationId, PositionId},
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Position {
    pub id: PositionId,
    pub organization_id: OrganizationId,
    pub department_id: Option<DepartmentId>,
    pub title: String,
    pub description: Option<String>,
    /// Reference monthly salary for the position, in COP.
    pub base_salary: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    pub fn new(organization_id: OrganizationId, payload: PositionPayload) -> Self {
        let now = Utc::now();
        Self {
            id: PositionId::new(),
            organization_id,
            department_id: payload.department_id,
            title: payload.title.trim().to_string(),
            description: trim_optional(payload.description),
            base_salary: payload.base_salary,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, payload: PositionPayload) {
        self.department_id = payload.department_id;
        self.title = payload.title.trim().to_string();
        self.description = trim_optional(payload.description);
        self.base_salary = payload.base_salary;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PositionPayload {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub base_salary: f64,
}
