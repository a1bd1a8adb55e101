//! Attendance repository trait for dependency injection and testing.
//!
//! The check-in/check-out flow in `services::attendance` depends on the trait
//! only, so it can be exercised with `MockAttendanceRepositoryTrait`.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool};

use crate::error::AppError;
use crate::models::attendance::Attendance;
use crate::repositories::common::{push_clause, tenant_select};
use crate::repositories::repository::ensure_affected;
use crate::types::{AttendanceId, EmployeeId, OrganizationId};

const TABLE_NAME: &str = "attendance";
const SELECT_COLUMNS: &str = "id, organization_id, employee_id, date, check_in, check_out, status, \
     hours_worked, overtime_hours, notes, created_at, updated_at";

/// Repository trait for attendance operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepositoryTrait: Send + Sync {
    async fn find_by_id(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: AttendanceId,
    ) -> Result<Attendance, AppError>;

    /// The record of an employee for a calendar day.
    async fn find_by_employee_and_date(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, AppError>;

    /// Records filtered by employee and inclusive date range, oldest first.
    async fn list(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: Option<EmployeeId>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Attendance>, AppError>;

    async fn create(&self, db: &PgPool, item: &Attendance) -> Result<Attendance, AppError>;

    async fn update(&self, db: &PgPool, item: &Attendance) -> Result<Attendance, AppError>;

    async fn delete(&self, db: &PgPool, org: OrganizationId, id: AttendanceId) -> Result<(), AppError>;
}

/// Concrete implementation of [`AttendanceRepositoryTrait`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AttendanceRepository;

impl AttendanceRepository {
    pub fn new() -> Self {
        Self
    }

    /// Records of one employee in a period; used by payroll inside its transaction.
    pub async fn find_for_period(
        &self,
        db: impl PgExecutor<'_>,
        org: OrganizationId,
        employee_id: EmployeeId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND employee_id = $2 \
             AND date BETWEEN $3 AND $4 ORDER BY date ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, Attendance>(&query)
            .bind(org)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl AttendanceRepositoryTrait for AttendanceRepository {
    async fn find_by_id(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: AttendanceId,
    ) -> Result<Attendance, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Attendance>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))
    }

    async fn find_by_employee_and_date(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Option<Attendance>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND employee_id = $2 AND date = $3",
            SELECT_COLUMNS, TABLE_NAME
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(org)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn list(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: Option<EmployeeId>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Attendance>, AppError> {
        let mut builder = tenant_select(SELECT_COLUMNS, TABLE_NAME, org);
        let mut has_clause = true;
        if let Some(employee_id) = employee_id {
            push_clause(&mut builder, &mut has_clause);
            builder.push("employee_id = ").push_bind(employee_id);
        }
        if let Some(from) = from {
            push_clause(&mut builder, &mut has_clause);
            builder.push("date >= ").push_bind(from);
        }
        if let Some(to) = to {
            push_clause(&mut builder, &mut has_clause);
            builder.push("date <= ").push_bind(to);
        }
        builder.push(" ORDER BY date ASC, created_at ASC");
        let rows = builder.build_query_as::<Attendance>().fetch_all(db).await?;
        Ok(rows)
    }

    async fn create(&self, db: &PgPool, item: &Attendance) -> Result<Attendance, AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Attendance>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.employee_id)
            .bind(item.date)
            .bind(item.check_in)
            .bind(item.check_out)
            .bind(item.status)
            .bind(item.hours_worked)
            .bind(item.overtime_hours)
            .bind(&item.notes)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn update(&self, db: &PgPool, item: &Attendance) -> Result<Attendance, AppError> {
        let query = format!(
            "UPDATE {} SET check_in = $3, check_out = $4, status = $5, hours_worked = $6, \
             overtime_hours = $7, notes = $8, updated_at = $9 \
             WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, Attendance>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.check_in)
            .bind(item.check_out)
            .bind(item.status)
            .bind(item.hours_worked)
            .bind(item.overtime_hours)
            .bind(&item.notes)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))
    }

    async fn delete(&self, db: &PgPool, org: OrganizationId, id: AttendanceId) -> Result<(), AppError> {
        let query = format!("DELETE FROM {} WHERE organization_id = $1 AND id = $2", TABLE_NAME);
        let result = sqlx::query(&query).bind(org).bind(id).execute(db).await?;
        ensure_affected(result.rows_affected(), "Attendance record")
    }
}
