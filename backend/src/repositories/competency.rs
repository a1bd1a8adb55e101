//! Competency catalogue and employee assessments.

use sqlx::{PgConnection, PgPool};

use crate::error::AppError;
use crate::models::competency::{AssessmentInput, Competency, EmployeeCompetency};
use crate::repositories::repository::{ensure_affected, TenantRepository};
use crate::types::{CompetencyId, EmployeeId, OrganizationId, UserId};

const TABLE_NAME: &str = "competencies";
const SELECT_COLUMNS: &str = "id, organization_id, name, description, category, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct CompetencyRepository;

impl CompetencyRepository {
    pub fn new() -> Self {
        Self
    }

    /// Number of the given ids that belong to the organization.
    pub async fn count_owned(
        &self,
        db: &PgPool,
        org: OrganizationId,
        ids: &[CompetencyId],
    ) -> Result<i64, AppError> {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT id) FROM competencies WHERE organization_id = $1 AND id = ANY($2)",
        )
        .bind(org)
        .bind(&ids)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    pub async fn for_employee(
        &self,
        db: &PgPool,
        employee_id: EmployeeId,
    ) -> Result<Vec<EmployeeCompetency>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeCompetency>(
            "SELECT ec.employee_id, ec.competency_id, c.name AS competency_name, ec.level, \
             ec.assessed_by, ec.assessed_at \
             FROM employee_competencies ec JOIN competencies c ON c.id = ec.competency_id \
             WHERE ec.employee_id = $1 ORDER BY c.name ASC",
        )
        .bind(employee_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn upsert_assessments(
        &self,
        db: &mut PgConnection,
        employee_id: EmployeeId,
        assessed_by: UserId,
        assessments: &[AssessmentInput],
    ) -> Result<(), AppError> {
        for a in assessments {
            sqlx::query(
                "INSERT INTO employee_competencies (employee_id, competency_id, level, assessed_by, assessed_at) \
                 VALUES ($1, $2, $3, $4, NOW()) ON CONFLICT (employee_id, competency_id) \
                 DO UPDATE SET level = EXCLUDED.level, assessed_by = EXCLUDED.assessed_by, \
                 assessed_at = EXCLUDED.assessed_at",
            )
            .bind(employee_id)
            .bind(a.competency_id)
            .bind(a.level)
            .bind(assessed_by)
            .execute(&mut *db)
            .await?;
        }
        Ok(())
    }
}

impl TenantRepository<Competency> for CompetencyRepository {
    const TABLE: &'static str = TABLE_NAME;
    type Id = CompetencyId;

    async fn find_all(&self, db: &PgPool, org: OrganizationId) -> Result<Vec<Competency>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 ORDER BY category ASC, name ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, Competency>(&query)
            .bind(org)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, db: &PgPool, org: OrganizationId, id: CompetencyId) -> Result<Competency, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Competency>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Competency not found".into()))
    }

    async fn create(&self, db: &PgPool, item: &Competency) -> Result<Competency, AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Competency>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn update(&self, db: &PgPool, item: &Competency) -> Result<Competency, AppError> {
        let query = format!(
            "UPDATE {} SET name = $3, description = $4, category = $5, updated_at = $6 \
             WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, Competency>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Competency not found".into()))
    }

    async fn delete(&self, db: &PgPool, org: OrganizationId, id: CompetencyId) -> Result<(), AppError> {
        let query = format!("DELETE FROM {} WHERE organization_id = $1 AND id = $2", TABLE_NAME);
        let result = sqlx::query(&query).bind(org).bind(id).execute(db).await?;
        ensure_affected(result.rows_affected(), "Competency")
    }
}
