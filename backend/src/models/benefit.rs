use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    models::organization::trim_optional,
    types::{BenefitId, EmployeeBenefitId, EmployeeId, OrganizationId},
};

text_enum! {
    pub enum BenefitType {
        Health => "health",
        Financial => "financial",
        Education => "education",
        Wellness => "wellness",
        Other => "other",
    }
}

text_enum! {
    pub enum EnrollmentStatus {
        Active => "active",
        Ended => "ended",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Benefit {
    pub id: BenefitId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub benefit_type: BenefitType,
    pub monthly_amount: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Benefit {
    pub fn new(organization_id: OrganizationId, payload: BenefitPayload) -> Self {
        let now = Utc::now();
        Self {
            id: BenefitId::new(),
            organization_id,
            name: payload.name.trim().to_string(),
            description: trim_optional(payload.description),
            benefit_type: payload.benefit_type,
            monthly_amount: payload.monthly_amount,
            is_active: payload.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, payload: BenefitPayload) {
        self.name = payload.name.trim().to_string();
        self.description = trim_optional(payload.description);
        self.benefit_type = payload.benefit_type;
        self.monthly_amount = payload.monthly_amount;
        if let Some(active) = payload.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BenefitPayload {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub benefit_type: BenefitType,
    #[validate(range(min = 0.0))]
    pub monthly_amount: f64,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EmployeeBenefit {
    pub id: EmployeeBenefitId,
    pub organization_id: OrganizationId,
    pub employee_id: EmployeeId,
    pub benefit_id: BenefitId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

impl EmployeeBenefit {
    pub fn new(organization_id: OrganizationId, benefit_id: BenefitId, payload: EnrollRequest) -> Self {
        Self {
            id: EmployeeBenefitId::new(),
            organization_id,
            employee_id: payload.employee_id,
            benefit_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            status: EnrollmentStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn end(&mut self, today: NaiveDate) {
        self.status = EnrollmentStatus::Ended;
        self.end_date = Some(today);
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnrollRequest {
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Enrollment joined with its benefit, as listed for an employee.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EmployeeBenefitDetail {
    pub id: EmployeeBenefitId,
    pub benefit_id: BenefitId,
    pub benefit_name: String,
    pub benefit_type: BenefitType,
    pub monthly_amount: f64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: EnrollmentStatus,
}
