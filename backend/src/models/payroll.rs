use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::types::{EmployeeId, OrganizationId, PayrollId, UserId};

text_enum! {
    pub enum PayrollStatus {
        Draft => "draft",
        Approved => "approved",
        Submitted => "submitted",
        Accepted => "accepted",
        Rejected => "rejected",
        Paid => "paid",
    }
}

impl PayrollStatus {
    pub fn can_transition_to(&self, next: PayrollStatus) -> bool {
        use PayrollStatus::*;
        matches!(
            (self, next),
            (Draft, Approved)
                | (Approved, Submitted)
                | (Submitted, Accepted)
                | (Submitted, Rejected)
                | (Rejected, Submitted)
                | (Approved, Paid)
                | (Accepted, Paid)
        )
    }

    /// States from which the document may be sent to DIAN.
    pub fn is_submittable(&self) -> bool {
        matches!(self, PayrollStatus::Approved | PayrollStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payroll {
    pub id: PayrollId,
    pub organization_id: OrganizationId,
    pub employee_id: EmployeeId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub base_salary: f64,
    pub worked_days: i32,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub base_pay: f64,
    pub overtime_pay: f64,
    pub transport_allowance: f64,
    pub bonuses: f64,
    pub gross_pay: f64,
    pub health_deduction: f64,
    pub pension_deduction: f64,
    pub other_deductions: f64,
    pub total_deductions: f64,
    pub net_pay: f64,
    pub status: PayrollStatus,
    pub dian_document_number: Option<String>,
    pub cune: Option<String>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payroll {
    pub fn transition(&mut self, next: PayrollStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Payroll cannot move from {} to {}",
                self.status, next
            ));
        }
        let now = Utc::now();
        self.status = next;
        self.updated_at = now;
        if next == PayrollStatus::Paid {
            self.paid_at = Some(now);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GeneratePayrollRequest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Restricts generation to one employee; all active employees otherwise.
    #[serde(default)]
    pub employee_id: Option<EmployeeId>,
    #[serde(default)]
    pub bonuses: Option<f64>,
    #[serde(default)]
    pub other_deductions: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedPayroll {
    pub employee_id: EmployeeId,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratePayrollResponse {
    pub generated: Vec<Payroll>,
    pub skipped: Vec<SkippedPayroll>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PayrollListQuery {
    pub employee_id: Option<String>,
    pub status: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PayrollExportQuery {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}
