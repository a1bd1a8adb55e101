//! Employee repository.

use crate::error::AppError;
use crate::models::employee::{Employee, EmployeeFilters, EmployeeStatus};
use crate::repositories::common::{like_pattern, push_clause, tenant_select};
use crate::repositories::repository::{ensure_affected, TenantRepository};
use crate::types::{EmployeeId, OrganizationId, UserId};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

const TABLE_NAME: &str = "employees";
const SELECT_COLUMNS: &str = "id, organization_id, user_id, employee_number, first_name, last_name, \
     document_type, document_number, email, phone, address, birth_date, hire_date, termination_date, \
     department_id, position_id, base_salary, bank_account, eps, pension_fund, status, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn new() -> Self {
        Self
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &EmployeeFilters) {
        let mut has_clause = true;
        if let Some(department_id) = filters.department_id {
            push_clause(builder, &mut has_clause);
            builder.push("department_id = ").push_bind(department_id);
        }
        if let Some(position_id) = filters.position_id {
            push_clause(builder, &mut has_clause);
            builder.push("position_id = ").push_bind(position_id);
        }
        if let Some(status) = filters.status {
            push_clause(builder, &mut has_clause);
            builder.push("status = ").push_bind(status);
        }
        if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(search);
            push_clause(builder, &mut has_clause);
            builder
                .push("(first_name || ' ' || last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR document_number ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    /// Filtered page of employees plus the total match count.
    pub async fn search(
        &self,
        db: &PgPool,
        org: OrganizationId,
        filters: &EmployeeFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Employee>, i64), AppError> {
        let mut count = tenant_select("COUNT(*)", TABLE_NAME, org);
        Self::push_filters(&mut count, filters);
        let total = count.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut builder = tenant_select(SELECT_COLUMNS, TABLE_NAME, org);
        Self::push_filters(&mut builder, filters);
        builder
            .push(" ORDER BY last_name ASC, first_name ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let items = builder.build_query_as::<Employee>().fetch_all(db).await?;
        Ok((items, total))
    }

    pub async fn find_active(
        &self,
        db: impl PgExecutor<'_>,
        org: OrganizationId,
    ) -> Result<Vec<Employee>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND status IN ('active', 'on_leave') \
             ORDER BY employee_number ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, Employee>(&query)
            .bind(org)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    /// Same as [`TenantRepository::find_by_id`], usable inside a transaction.
    pub async fn fetch(
        &self,
        db: impl PgExecutor<'_>,
        org: OrganizationId,
        id: EmployeeId,
    ) -> Result<Employee, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))
    }

    /// The employee record linked to a login account, if any.
    pub async fn find_by_user(
        &self,
        db: &PgPool,
        org: OrganizationId,
        user_id: UserId,
    ) -> Result<Option<Employee>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND user_id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        let row = sqlx::query_as::<_, Employee>(&query)
            .bind(org)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    pub async fn exists(&self, db: &PgPool, org: OrganizationId, id: EmployeeId) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM employees WHERE organization_id = $1 AND id = $2)",
        )
        .bind(org)
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn set_status(
        &self,
        db: impl PgExecutor<'_>,
        org: OrganizationId,
        id: EmployeeId,
        status: EmployeeStatus,
        termination_date: Option<chrono::NaiveDate>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE employees SET status = $3, termination_date = $4, updated_at = NOW() \
             WHERE organization_id = $1 AND id = $2",
        )
        .bind(org)
        .bind(id)
        .bind(status)
        .bind(termination_date)
        .execute(db)
        .await?;
        ensure_affected(result.rows_affected(), "Employee")
    }
}

impl TenantRepository<Employee> for EmployeeRepository {
    const TABLE: &'static str = TABLE_NAME;
    type Id = EmployeeId;

    async fn find_all(&self, db: &PgPool, org: OrganizationId) -> Result<Vec<Employee>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 ORDER BY last_name ASC, first_name ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, Employee>(&query)
            .bind(org)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, db: &PgPool, org: OrganizationId, id: EmployeeId) -> Result<Employee, AppError> {
        self.fetch(db, org, id).await
    }

    async fn create(&self, db: &PgPool, item: &Employee) -> Result<Employee, AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
             $15, $16, $17, $18, $19, $20, $21, $22, $23) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Employee>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.user_id)
            .bind(&item.employee_number)
            .bind(&item.first_name)
            .bind(&item.last_name)
            .bind(item.document_type)
            .bind(&item.document_number)
            .bind(&item.email)
            .bind(&item.phone)
            .bind(&item.address)
            .bind(item.birth_date)
            .bind(item.hire_date)
            .bind(item.termination_date)
            .bind(item.department_id)
            .bind(item.position_id)
            .bind(item.base_salary)
            .bind(&item.bank_account)
            .bind(&item.eps)
            .bind(&item.pension_fund)
            .bind(item.status)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn update(&self, db: &PgPool, item: &Employee) -> Result<Employee, AppError> {
        let query = format!(
            "UPDATE {} SET user_id = $3, employee_number = $4, first_name = $5, last_name = $6, \
             document_type = $7, document_number = $8, email = $9, phone = $10, address = $11, \
             birth_date = $12, hire_date = $13, termination_date = $14, department_id = $15, \
             position_id = $16, base_salary = $17, bank_account = $18, eps = $19, pension_fund = $20, \
             status = $21, updated_at = $22 WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.user_id)
            .bind(&item.employee_number)
            .bind(&item.first_name)
            .bind(&item.last_name)
            .bind(item.document_type)
            .bind(&item.document_number)
            .bind(&item.email)
            .bind(&item.phone)
            .bind(&item.address)
            .bind(item.birth_date)
            .bind(item.hire_date)
            .bind(item.termination_date)
            .bind(item.department_id)
            .bind(item.position_id)
            .bind(item.base_salary)
            .bind(&item.bank_account)
            .bind(&item.eps)
            .bind(&item.pension_fund)
            .bind(item.status)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee not found".into()))
    }

    /// Hard delete; the API terminates employees instead.
    async fn delete(&self, db: &PgPool, org: OrganizationId, id: EmployeeId) -> Result<(), AppError> {
        let query = format!("DELETE FROM {} WHERE organization_id = $1 AND id = $2", TABLE_NAME);
        let result = sqlx::query(&query).bind(org).bind(id).execute(db).await?;
        ensure_affected(result.rows_affected(), "Employee")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DepartmentId;

    #[test]
    fn search_filters_are_appended_after_tenant_clause() {
        let mut builder = tenant_select("COUNT(*)", TABLE_NAME, OrganizationId::new());
        EmployeeRepository::push_filters(
            &mut builder,
            &EmployeeFilters {
                department_id: Some(DepartmentId::new()),
                status: Some(EmployeeStatus::Active),
                search: Some("ana".into()),
                ..Default::default()
            },
        );
        let sql = builder.sql();
        assert!(sql.starts_with("SELECT COUNT(*) FROM employees WHERE organization_id = $1"));
        assert!(sql.contains(" AND department_id = $2"));
        assert!(sql.contains(" AND status = $3"));
        assert!(sql.contains("email ILIKE $5"));
    }
}
