//! Payroll repository.

use chrono::NaiveDate;
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};

use crate::error::AppError;
use crate::models::payroll::{Payroll, PayrollStatus};
use crate::repositories::common::{push_clause, tenant_select};
use crate::repositories::repository::ensure_affected;
use crate::types::{EmployeeId, OrganizationId, PayrollId};

const TABLE_NAME: &str = "payrolls";
const SELECT_COLUMNS: &str = "id, organization_id, employee_id, period_start, period_end, base_salary, \
     worked_days, regular_hours, overtime_hours, base_pay, overtime_pay, transport_allowance, bonuses, \
     gross_pay, health_deduction, pension_deduction, other_deductions, total_deductions, net_pay, status, \
     dian_document_number, cune, approved_by, approved_at, paid_at, created_at, updated_at";

/// Payroll row joined with the employee fields needed by the CSV export.
#[derive(Debug, Clone, FromRow)]
pub struct PayrollExportRow {
    pub employee_number: String,
    pub employee_name: String,
    pub document_number: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub worked_days: i32,
    pub overtime_hours: f64,
    pub base_pay: f64,
    pub overtime_pay: f64,
    pub transport_allowance: f64,
    pub bonuses: f64,
    pub gross_pay: f64,
    pub total_deductions: f64,
    pub net_pay: f64,
    pub status: PayrollStatus,
}

#[derive(Debug, Default, Clone)]
pub struct PayrollFilters {
    pub employee_id: Option<EmployeeId>,
    pub status: Option<PayrollStatus>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PayrollRepository;

impl PayrollRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(
        &self,
        db: &PgPool,
        org: OrganizationId,
        filters: &PayrollFilters,
    ) -> Result<Vec<Payroll>, AppError> {
        let mut builder = tenant_select(SELECT_COLUMNS, TABLE_NAME, org);
        let mut has_clause = true;
        if let Some(employee_id) = filters.employee_id {
            push_clause(&mut builder, &mut has_clause);
            builder.push("employee_id = ").push_bind(employee_id);
        }
        if let Some(status) = filters.status {
            push_clause(&mut builder, &mut has_clause);
            builder.push("status = ").push_bind(status);
        }
        if let Some(start) = filters.period_start {
            push_clause(&mut builder, &mut has_clause);
            builder.push("period_start >= ").push_bind(start);
        }
        if let Some(end) = filters.period_end {
            push_clause(&mut builder, &mut has_clause);
            builder.push("period_end <= ").push_bind(end);
        }
        builder.push(" ORDER BY period_start DESC, created_at DESC");
        let rows = builder.build_query_as::<Payroll>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn find_by_id(
        &self,
        db: impl PgExecutor<'_>,
        org: OrganizationId,
        id: PayrollId,
    ) -> Result<Payroll, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Payroll>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Payroll not found".into()))
    }

    /// Locks the row for the rest of the transaction.
    pub async fn find_for_update(
        &self,
        db: &mut PgConnection,
        org: OrganizationId,
        id: PayrollId,
    ) -> Result<Payroll, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2 FOR UPDATE",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Payroll>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Payroll not found".into()))
    }

    pub async fn exists_for_period(
        &self,
        db: &mut PgConnection,
        org: OrganizationId,
        employee_id: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM payrolls WHERE organization_id = $1 AND employee_id = $2 \
             AND period_start = $3 AND period_end = $4)",
        )
        .bind(org)
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn insert(&self, db: &mut PgConnection, item: &Payroll) -> Result<Payroll, AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
             $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Payroll>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.employee_id)
            .bind(item.period_start)
            .bind(item.period_end)
            .bind(item.base_salary)
            .bind(item.worked_days)
            .bind(item.regular_hours)
            .bind(item.overtime_hours)
            .bind(item.base_pay)
            .bind(item.overtime_pay)
            .bind(item.transport_allowance)
            .bind(item.bonuses)
            .bind(item.gross_pay)
            .bind(item.health_deduction)
            .bind(item.pension_deduction)
            .bind(item.other_deductions)
            .bind(item.total_deductions)
            .bind(item.net_pay)
            .bind(item.status)
            .bind(&item.dian_document_number)
            .bind(&item.cune)
            .bind(item.approved_by)
            .bind(item.approved_at)
            .bind(item.paid_at)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    /// Persists status, approval, payment and DIAN bookkeeping fields.
    pub async fn update_state(
        &self,
        db: impl PgExecutor<'_>,
        item: &Payroll,
    ) -> Result<Payroll, AppError> {
        let query = format!(
            "UPDATE {} SET status = $3, dian_document_number = $4, cune = $5, approved_by = $6, \
             approved_at = $7, paid_at = $8, updated_at = $9 \
             WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, Payroll>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.status)
            .bind(&item.dian_document_number)
            .bind(&item.cune)
            .bind(item.approved_by)
            .bind(item.approved_at)
            .bind(item.paid_at)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Payroll not found".into()))
    }

    /// Deletes a payroll only while it is still a draft.
    pub async fn delete_draft(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: PayrollId,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM payrolls WHERE organization_id = $1 AND id = $2 AND status = 'draft'",
        )
        .bind(org)
        .bind(id)
        .execute(db)
        .await?;
        ensure_affected(result.rows_affected(), "Payroll")
    }

    /// Next value of the installation-wide DIAN document sequence.
    pub async fn next_document_sequence(&self, db: &mut PgConnection) -> Result<i64, AppError> {
        let value = sqlx::query_scalar::<_, i64>("SELECT nextval('payroll_document_seq')")
            .fetch_one(db)
            .await?;
        Ok(value)
    }

    pub async fn export_rows(
        &self,
        db: &PgPool,
        org: OrganizationId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PayrollExportRow>, AppError> {
        let rows = sqlx::query_as::<_, PayrollExportRow>(
            "SELECT e.employee_number, e.first_name || ' ' || e.last_name AS employee_name, \
             e.document_number, p.period_start, p.period_end, p.worked_days, p.overtime_hours, \
             p.base_pay, p.overtime_pay, p.transport_allowance, p.bonuses, p.gross_pay, \
             p.total_deductions, p.net_pay, p.status \
             FROM payrolls p JOIN employees e ON e.id = p.employee_id \
             WHERE p.organization_id = $1 \
             AND ($2::date IS NULL OR p.period_start >= $2) \
             AND ($3::date IS NULL OR p.period_end <= $3) \
             ORDER BY p.period_start ASC, e.employee_number ASC",
        )
        .bind(org)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
