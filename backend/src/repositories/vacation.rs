//! Vacation request repository.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::vacation::{Vacation, VacationStatus, VacationType};
use crate::repositories::common::{push_clause, tenant_select};
use crate::types::{EmployeeId, OrganizationId, VacationId};

const TABLE_NAME: &str = "vacations";
const SELECT_COLUMNS: &str = "id, organization_id, employee_id, vacation_type, start_date, end_date, \
     days, reason, status, reviewed_by, reviewed_at, review_comment, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct VacationRepository;

impl VacationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: Option<EmployeeId>,
        status: Option<VacationStatus>,
    ) -> Result<Vec<Vacation>, AppError> {
        let mut builder = tenant_select(SELECT_COLUMNS, TABLE_NAME, org);
        let mut has_clause = true;
        if let Some(employee_id) = employee_id {
            push_clause(&mut builder, &mut has_clause);
            builder.push("employee_id = ").push_bind(employee_id);
        }
        if let Some(status) = status {
            push_clause(&mut builder, &mut has_clause);
            builder.push("status = ").push_bind(status);
        }
        builder.push(" ORDER BY start_date DESC");
        let rows = builder.build_query_as::<Vacation>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn find_by_id(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: VacationId,
    ) -> Result<Vacation, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Vacation>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Vacation request not found".into()))
    }

    /// True when a pending or approved request of the employee intersects the range.
    pub async fn has_overlap(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<VacationId>,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM vacations WHERE organization_id = $1 AND employee_id = $2 \
             AND status IN ('pending', 'approved') AND start_date <= $4 AND end_date >= $3 \
             AND ($5::text IS NULL OR id <> $5))",
        )
        .bind(org)
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .bind(exclude)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    /// Sum of `days` for the employee's requests of a type and status.
    pub async fn sum_days(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: EmployeeId,
        vacation_type: VacationType,
        status: VacationStatus,
    ) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(days), 0)::BIGINT FROM vacations WHERE organization_id = $1 \
             AND employee_id = $2 AND vacation_type = $3 AND status = $4",
        )
        .bind(org)
        .bind(employee_id)
        .bind(vacation_type)
        .bind(status)
        .fetch_one(db)
        .await?;
        Ok(total)
    }

    pub async fn create(&self, db: &PgPool, item: &Vacation) -> Result<Vacation, AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Vacation>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.employee_id)
            .bind(item.vacation_type)
            .bind(item.start_date)
            .bind(item.end_date)
            .bind(item.days)
            .bind(&item.reason)
            .bind(item.status)
            .bind(item.reviewed_by)
            .bind(item.reviewed_at)
            .bind(&item.review_comment)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    /// Persists a status change, guarded by the status the caller observed.
    pub async fn update_status(
        &self,
        db: &PgPool,
        item: &Vacation,
        expected: VacationStatus,
    ) -> Result<Vacation, AppError> {
        let query = format!(
            "UPDATE {} SET status = $3, reviewed_by = $4, reviewed_at = $5, review_comment = $6, \
             updated_at = $7 WHERE id = $1 AND organization_id = $2 AND status = $8 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, Vacation>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.status)
            .bind(item.reviewed_by)
            .bind(item.reviewed_at)
            .bind(&item.review_comment)
            .bind(item.updated_at)
            .bind(expected)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::Conflict("Vacation request was modified concurrently".into()))
    }
}
