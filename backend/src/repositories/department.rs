//! Department repository.

use crate::error::AppError;
use crate::models::department::{Department, DepartmentSummary};
use crate::repositories::repository::{ensure_affected, TenantRepository};
use crate::types::{DepartmentId, OrganizationId};
use sqlx::PgPool;

const TABLE_NAME: &str = "departments";
const SELECT_COLUMNS: &str =
    "id, organization_id, name, description, manager_employee_id, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct DepartmentRepository;

impl DepartmentRepository {
    pub fn new() -> Self {
        Self
    }

    /// Departments with their current headcount.
    pub async fn find_all_with_counts(
        &self,
        db: &PgPool,
        org: OrganizationId,
    ) -> Result<Vec<DepartmentSummary>, AppError> {
        let rows = sqlx::query_as::<_, DepartmentSummary>(
            "SELECT d.id, d.organization_id, d.name, d.description, d.manager_employee_id, \
             d.created_at, d.updated_at, \
             (SELECT COUNT(*) FROM employees e WHERE e.department_id = d.id \
              AND e.status <> 'terminated') AS employee_count \
             FROM departments d WHERE d.organization_id = $1 ORDER BY d.name ASC",
        )
        .bind(org)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_employees(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: DepartmentId,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM employees WHERE organization_id = $1 AND department_id = $2",
        )
        .bind(org)
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    pub async fn exists(&self, db: &PgPool, org: OrganizationId, id: DepartmentId) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM departments WHERE organization_id = $1 AND id = $2)",
        )
        .bind(org)
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }
}

impl TenantRepository<Department> for DepartmentRepository {
    const TABLE: &'static str = TABLE_NAME;
    type Id = DepartmentId;

    async fn find_all(&self, db: &PgPool, org: OrganizationId) -> Result<Vec<Department>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 ORDER BY name ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, Department>(&query)
            .bind(org)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, db: &PgPool, org: OrganizationId, id: DepartmentId) -> Result<Department, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Department not found".into()))
    }

    async fn create(&self, db: &PgPool, item: &Department) -> Result<Department, AppError> {
        let query = format!(
            "INSERT INTO {} (id, organization_id, name, description, manager_employee_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Department>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.manager_employee_id)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn update(&self, db: &PgPool, item: &Department) -> Result<Department, AppError> {
        let query = format!(
            "UPDATE {} SET name = $3, description = $4, manager_employee_id = $5, updated_at = $6 \
             WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.manager_employee_id)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Department not found".into()))
    }

    async fn delete(&self, db: &PgPool, org: OrganizationId, id: DepartmentId) -> Result<(), AppError> {
        let query = format!("DELETE FROM {} WHERE organization_id = $1 AND id = $2", TABLE_NAME);
        let result = sqlx::query(&query).bind(org).bind(id).execute(db).await?;
        ensure_affected(result.rows_affected(), "Department")
    }
}
