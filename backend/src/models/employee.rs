use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    models::organization::trim_optional,
    types::{DepartmentId, EmployeeId, OrganizationId, PositionId, UserId},
    validation::rules::{validate_document_number, validate_employee_number, validate_not_blank},
};

text_enum! {
    /// Colombian identity document kinds.
    pub enum DocumentType {
        /// Cédula de ciudadanía.
        Cc => "cc",
        /// Cédula de extranjería.
        Ce => "ce",
        /// Tarjeta de identidad.
        Ti => "ti",
        Passport => "pa",
        Nit => "nit",
    }
}

impl DocumentType {
    /// Code used by the DIAN electronic payroll schema.
    pub fn dian_code(&self) -> &'static str {
        match self {
            DocumentType::Cc => "13",
            DocumentType::Ce => "22",
            DocumentType::Ti => "12",
            DocumentType::Passport => "41",
            DocumentType::Nit => "31",
        }
    }
}

text_enum! {
    pub enum EmployeeStatus {
        Active => "active",
        Inactive => "inactive",
        OnLeave => "on_leave",
        Terminated => "terminated",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: EmployeeId,
    pub organization_id: OrganizationId,
    /// Login account linked to this employee, enabling self-service.
    pub user_id: Option<UserId>,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub hire_date: NaiveDate,
    pub termination_date: Option<NaiveDate>,
    pub department_id: Option<DepartmentId>,
    pub position_id: Option<PositionId>,
    /// Monthly salary in COP.
    pub base_salary: f64,
    pub bank_account: Option<String>,
    pub eps: Option<String>,
    pub pension_fund: Option<String>,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(organization_id: OrganizationId, payload: CreateEmployee) -> Self {
        let now = Utc::now();
        Self {
            id: EmployeeId::new(),
            organization_id,
            user_id: payload.user_id,
            employee_number: payload.employee_number.trim().to_string(),
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            document_type: payload.document_type,
            document_number: payload.document_number.trim().to_string(),
            email: payload.email.trim().to_ascii_lowercase(),
            phone: trim_optional(payload.phone),
            address: trim_optional(payload.address),
            birth_date: payload.birth_date,
            hire_date: payload.hire_date,
            termination_date: None,
            department_id: payload.department_id,
            position_id: payload.position_id,
            base_salary: payload.base_salary,
            bank_account: trim_optional(payload.bank_account),
            eps: trim_optional(payload.eps),
            pension_fund: trim_optional(payload.pension_fund),
            status: EmployeeStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, EmployeeStatus::Active | EmployeeStatus::OnLeave)
    }

    pub fn is_linked_to(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }

    pub fn terminate(&mut self, date: NaiveDate) {
        self.status = EmployeeStatus::Terminated;
        self.termination_date = Some(date);
        self.updated_at = Utc::now();
    }

    pub fn apply_update(&mut self, payload: UpdateEmployee) {
        if let Some(v) = payload.employee_number {
            self.employee_number = v.trim().to_string();
        }
        if let Some(v) = payload.first_name {
            self.first_name = v.trim().to_string();
        }
        if let Some(v) = payload.last_name {
            self.last_name = v.trim().to_string();
        }
        if let Some(v) = payload.document_type {
            self.document_type = v;
        }
        if let Some(v) = payload.document_number {
            self.document_number = v.trim().to_string();
        }
        if let Some(v) = payload.email {
            self.email = v.trim().to_ascii_lowercase();
        }
        if payload.phone.is_some() {
            self.phone = trim_optional(payload.phone);
        }
        if payload.address.is_some() {
            self.address = trim_optional(payload.address);
        }
        if payload.birth_date.is_some() {
            self.birth_date = payload.birth_date;
        }
        if let Some(v) = payload.hire_date {
            self.hire_date = v;
        }
        if payload.department_id.is_some() {
            self.department_id = payload.department_id;
        }
        if payload.position_id.is_some() {
            self.position_id = payload.position_id;
        }
        if payload.user_id.is_some() {
            self.user_id = payload.user_id;
        }
        if let Some(v) = payload.base_salary {
            self.base_salary = v;
        }
        if payload.bank_account.is_some() {
            self.bank_account = trim_optional(payload.bank_account);
        }
        if payload.eps.is_some() {
            self.eps = trim_optional(payload.eps);
        }
        if payload.pension_fund.is_some() {
            self.pension_fund = trim_optional(payload.pension_fund);
        }
        if let Some(status) = payload.status {
            self.status = status;
            if status != EmployeeStatus::Terminated {
                self.termination_date = None;
            }
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEmployee {
    #[validate(custom(function = "validate_employee_number"))]
    pub employee_number: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub last_name: String,
    pub document_type: DocumentType,
    #[validate(custom(function = "validate_document_number"))]
    pub document_number: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    pub hire_date: NaiveDate,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub position_id: Option<PositionId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[validate(range(min = 0.0))]
    pub base_salary: f64,
    #[serde(default)]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub eps: Option<String>,
    #[serde(default)]
    pub pension_fund: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployee {
    #[validate(custom(function = "validate_employee_number"))]
    pub employee_number: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub document_type: Option<DocumentType>,
    #[validate(custom(function = "validate_document_number"))]
    pub document_number: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub hire_date: Option<NaiveDate>,
    pub department_id: Option<DepartmentId>,
    pub position_id: Option<PositionId>,
    pub user_id: Option<UserId>,
    #[validate(range(min = 0.0))]
    pub base_salary: Option<f64>,
    pub bank_account: Option<String>,
    pub eps: Option<String>,
    pub pension_fund: Option<String>,
    pub status: Option<EmployeeStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeListQuery {
    pub department_id: Option<String>,
    pub position_id: Option<String>,
    pub status: Option<String>,
    /// Case-insensitive match on name, email or document number.
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Parsed and validated form of [`EmployeeListQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilters {
    pub department_id: Option<DepartmentId>,
    pub position_id: Option<PositionId>,
    pub status: Option<EmployeeStatus>,
    pub search: Option<String>,
}
