//! Benefits catalogue and employee enrollments.

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::benefit::{Benefit, EmployeeBenefit, EmployeeBenefitDetail};
use crate::repositories::repository::{ensure_affected, TenantRepository};
use crate::types::{BenefitId, EmployeeBenefitId, EmployeeId, OrganizationId};

const TABLE_NAME: &str = "benefits";
const SELECT_COLUMNS: &str = "id, organization_id, name, description, benefit_type, monthly_amount, \
     is_active, created_at, updated_at";
const ENROLLMENT_COLUMNS: &str =
    "id, organization_id, employee_id, benefit_id, start_date, end_date, status, created_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct BenefitRepository;

impl BenefitRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn has_active_enrollment(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
        benefit_id: BenefitId,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM employee_benefits WHERE employee_id = $1 \
             AND benefit_id = $2 AND status = 'active')",
        )
        .bind(employee_id)
        .bind(benefit_id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn enroll(&self, db: &PgPool, item: &EmployeeBenefit) -> Result<EmployeeBenefit, AppError> {
        let query = format!(
            "INSERT INTO employee_benefits ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            ENROLLMENT_COLUMNS, ENROLLMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, EmployeeBenefit>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.employee_id)
            .bind(item.benefit_id)
            .bind(item.start_date)
            .bind(item.end_date)
            .bind(item.status)
            .bind(item.created_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn find_enrollment(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: EmployeeBenefitId,
    ) -> Result<EmployeeBenefit, AppError> {
        let query = format!(
            "SELECT {} FROM employee_benefits WHERE organization_id = $1 AND id = $2",
            ENROLLMENT_COLUMNS
        );
        sqlx::query_as::<_, EmployeeBenefit>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Enrollment not found".into()))
    }

    pub async fn update_enrollment(
        &self,
        db: &PgPool,
        item: &EmployeeBenefit,
    ) -> Result<EmployeeBenefit, AppError> {
        let query = format!(
            "UPDATE employee_benefits SET end_date = $3, status = $4 \
             WHERE id = $1 AND organization_id = $2 RETURNING {}",
            ENROLLMENT_COLUMNS
        );
        sqlx::query_as::<_, EmployeeBenefit>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.end_date)
            .bind(item.status)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Enrollment not found".into()))
    }

    pub async fn for_employee(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: EmployeeId,
    ) -> Result<Vec<EmployeeBenefitDetail>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeBenefitDetail>(
            "SELECT eb.id, eb.benefit_id, b.name AS benefit_name, b.benefit_type, b.monthly_amount, \
             eb.start_date, eb.end_date, eb.status \
             FROM employee_benefits eb JOIN benefits b ON b.id = eb.benefit_id \
             WHERE eb.organization_id = $1 AND eb.employee_id = $2 \
             ORDER BY eb.status ASC, eb.start_date DESC",
        )
        .bind(org)
        .bind(employee_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

impl TenantRepository<Benefit> for BenefitRepository {
    const TABLE: &'static str = TABLE_NAME;
    type Id = BenefitId;

    async fn find_all(&self, db: &PgPool, org: OrganizationId) -> Result<Vec<Benefit>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 ORDER BY name ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, Benefit>(&query)
            .bind(org)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, db: &PgPool, org: OrganizationId, id: BenefitId) -> Result<Benefit, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Benefit>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Benefit not found".into()))
    }

    async fn create(&self, db: &PgPool, item: &Benefit) -> Result<Benefit, AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Benefit>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.benefit_type)
            .bind(item.monthly_amount)
            .bind(item.is_active)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn update(&self, db: &PgPool, item: &Benefit) -> Result<Benefit, AppError> {
        let query = format!(
            "UPDATE {} SET name = $3, description = $4, benefit_type = $5, monthly_amount = $6, \
             is_active = $7, updated_at = $8 WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, Benefit>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.benefit_type)
            .bind(item.monthly_amount)
            .bind(item.is_active)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Benefit not found".into()))
    }

    async fn delete(&self, db: &PgPool, org: OrganizationId, id: BenefitId) -> Result<(), AppError> {
        let query = format!("DELETE FROM {} WHERE organization_id = $1 AND id = $2", TABLE_NAME);
        let result = sqlx::query(&query).bind(org).bind(id).execute(db).await?;
        ensure_affected(result.rows_affected(), "Benefit")
    }
}
