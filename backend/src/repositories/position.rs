//! Position repository, including competency requirements per position.

use crate::error::AppError;
use crate::models::competency::{PositionCompetency, RequirementInput};
use crate::models::position::Position;
use crate::repositories::repository::{ensure_affected, TenantRepository};
use crate::types::{OrganizationId, PositionId};
use sqlx::{PgConnection, PgPool};

const TABLE_NAME: &str = "positions";
const SELECT_COLUMNS: &str =
    "id, organization_id, department_id, title, description, base_salary, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct PositionRepository;

impl PositionRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn exists(&self, db: &PgPool, org: OrganizationId, id: PositionId) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM positions WHERE organization_id = $1 AND id = $2)",
        )
        .bind(org)
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn requirements(
        &self,
        db: &PgPool,
        id: PositionId,
    ) -> Result<Vec<PositionCompetency>, AppError> {
        let rows = sqlx::query_as::<_, PositionCompetency>(
            "SELECT pc.position_id, pc.competency_id, c.name AS competency_name, pc.required_level \
             FROM position_competencies pc JOIN competencies c ON c.id = pc.competency_id \
             WHERE pc.position_id = $1 ORDER BY c.name ASC",
        )
        .bind(id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn replace_requirements(
        &self,
        db: &mut PgConnection,
        id: PositionId,
        requirements: &[RequirementInput],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM position_competencies WHERE position_id = $1")
            .bind(id)
            .execute(&mut *db)
            .await?;
        for req in requirements {
            sqlx::query(
                "INSERT INTO position_competencies (position_id, competency_id, required_level) \
                 VALUES ($1, $2, $3) ON CONFLICT (position_id, competency_id) \
                 DO UPDATE SET required_level = EXCLUDED.required_level",
            )
            .bind(id)
            .bind(req.competency_id)
            .bind(req.required_level)
            .execute(&mut *db)
            .await?;
        }
        Ok(())
    }
}

impl TenantRepository<Position> for PositionRepository {
    const TABLE: &'static str = TABLE_NAME;
    type Id = PositionId;

    async fn find_all(&self, db: &PgPool, org: OrganizationId) -> Result<Vec<Position>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 ORDER BY title ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query_as::<_, Position>(&query)
            .bind(org)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, db: &PgPool, org: OrganizationId, id: PositionId) -> Result<Position, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Position>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Position not found".into()))
    }

    async fn create(&self, db: &PgPool, item: &Position) -> Result<Position, AppError> {
        let query = format!(
            "INSERT INTO {} (id, organization_id, department_id, title, description, base_salary, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Position>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.department_id)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.base_salary)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn update(&self, db: &PgPool, item: &Position) -> Result<Position, AppError> {
        let query = format!(
            "UPDATE {} SET department_id = $3, title = $4, description = $5, base_salary = $6, \
             updated_at = $7 WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, Position>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.department_id)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.base_salary)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Position not found".into()))
    }

    async fn delete(&self, db: &PgPool, org: OrganizationId, id: PositionId) -> Result<(), AppError> {
        let query = format!("DELETE FROM {} WHERE organization_id = $1 AND id = $2", TABLE_NAME);
        let result = sqlx::query(&query).bind(org).bind(id).execute(db).await?;
        ensure_affected(result.rows_affected(), "Position")
    }
}
