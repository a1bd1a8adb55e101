//! Performance evaluations and their weighted criteria.

use sqlx::{PgConnection, PgPool};

use crate::error::AppError;
use crate::models::evaluation::{Evaluation, EvaluationCriteria, EvaluationStatus};
use crate::repositories::common::{push_clause, tenant_select};
use crate::repositories::repository::ensure_affected;
use crate::types::{EmployeeId, EvaluationId, OrganizationId};

const TABLE_NAME: &str = "performance_evaluations";
const SELECT_COLUMNS: &str = "id, organization_id, employee_id, evaluator_id, period_start, period_end, \
     status, overall_score, comments, submitted_at, completed_at, created_at, updated_at";
const CRITERIA_COLUMNS: &str = "id, evaluation_id, name, weight, score, comments";

#[derive(Debug, Default, Clone, Copy)]
pub struct EvaluationRepository;

impl EvaluationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: Option<EmployeeId>,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<Evaluation>, AppError> {
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
        builder.push(" ORDER BY period_end DESC");
        let rows = builder.build_query_as::<Evaluation>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn find_by_id(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: EvaluationId,
    ) -> Result<Evaluation, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Evaluation>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Evaluation not found".into()))
    }

    pub async fn criteria(
        &self,
        db: &PgPool,
        id: EvaluationId,
    ) -> Result<Vec<EvaluationCriteria>, AppError> {
        let query = format!(
            "SELECT {} FROM evaluation_criteria WHERE evaluation_id = $1 ORDER BY name ASC",
            CRITERIA_COLUMNS
        );
        let rows = sqlx::query_as::<_, EvaluationCriteria>(&query)
            .bind(id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn insert(&self, db: &mut PgConnection, item: &Evaluation) -> Result<Evaluation, AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Evaluation>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.employee_id)
            .bind(item.evaluator_id)
            .bind(item.period_start)
            .bind(item.period_end)
            .bind(item.status)
            .bind(item.overall_score)
            .bind(&item.comments)
            .bind(item.submitted_at)
            .bind(item.completed_at)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn update(&self, db: &mut PgConnection, item: &Evaluation) -> Result<Evaluation, AppError> {
        let query = format!(
            "UPDATE {} SET period_start = $3, period_end = $4, status = $5, overall_score = $6, \
             comments = $7, submitted_at = $8, completed_at = $9, updated_at = $10 \
             WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, Evaluation>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.period_start)
            .bind(item.period_end)
            .bind(item.status)
            .bind(item.overall_score)
            .bind(&item.comments)
            .bind(item.submitted_at)
            .bind(item.completed_at)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Evaluation not found".into()))
    }

    pub async fn replace_criteria(
        &self,
        db: &mut PgConnection,
        id: EvaluationId,
        criteria: &[EvaluationCriteria],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM evaluation_criteria WHERE evaluation_id = $1")
            .bind(id)
            .execute(&mut *db)
            .await?;
        let query = format!(
            "INSERT INTO evaluation_criteria ({}) VALUES ($1, $2, $3, $4, $5, $6)",
            CRITERIA_COLUMNS
        );
        for c in criteria {
            sqlx::query(&query)
                .bind(c.id)
                .bind(c.evaluation_id)
                .bind(&c.name)
                .bind(c.weight)
                .bind(c.score)
                .bind(&c.comments)
                .execute(&mut *db)
                .await?;
        }
        Ok(())
    }

    pub async fn delete(&self, db: &PgPool, org: OrganizationId, id: EvaluationId) -> Result<(), AppError> {
        let query = format!("DELETE FROM {} WHERE organization_id = $1 AND id = $2", TABLE_NAME);
        let result = sqlx::query(&query).bind(org).bind(id).execute(db).await?;
        ensure_affected(result.rows_affected(), "Evaluation")
    }
}
