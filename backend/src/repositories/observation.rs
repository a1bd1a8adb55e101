//! Observations and interviews recorded against an employee.

use crate::error::AppError;
use crate::models::interview::Interview;
use crate::models::observation::Observation;
use crate::types::{EmployeeId, InterviewId, OrganizationId};
use sqlx::PgPool;

const OBSERVATION_COLUMNS: &str =
    "id, organization_id, employee_id, author_id, category, content, created_at";
const INTERVIEW_COLUMNS: &str = "id, organization_id, employee_id, interviewer_id, interview_type, \
     scheduled_at, status, notes, outcome, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct ObservationRepository;

impl ObservationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_for_employee(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: EmployeeId,
    ) -> Result<Vec<Observation>, AppError> {
        let query = format!(
            "SELECT {} FROM observations WHERE organization_id = $1 AND employee_id = $2 \
             ORDER BY created_at DESC",
            OBSERVATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Observation>(&query)
            .bind(org)
            .bind(employee_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, db: &PgPool, item: &Observation) -> Result<Observation, AppError> {
        let query = format!(
            "INSERT INTO observations ({}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            OBSERVATION_COLUMNS, OBSERVATION_COLUMNS
        );
        let row = sqlx::query_as::<_, Observation>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.employee_id)
            .bind(item.author_id)
            .bind(item.category)
            .bind(&item.content)
            .bind(item.created_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InterviewRepository;

impl InterviewRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_for_employee(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: EmployeeId,
    ) -> Result<Vec<Interview>, AppError> {
        let query = format!(
            "SELECT {} FROM interviews WHERE organization_id = $1 AND employee_id = $2 \
             ORDER BY scheduled_at DESC",
            INTERVIEW_COLUMNS
        );
        let rows = sqlx::query_as::<_, Interview>(&query)
            .bind(org)
            .bind(employee_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn find_by_id(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: InterviewId,
    ) -> Result<Interview, AppError> {
        let query = format!(
            "SELECT {} FROM interviews WHERE organization_id = $1 AND id = $2",
            INTERVIEW_COLUMNS
        );
        sqlx::query_as::<_, Interview>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Interview not found".into()))
    }

    pub async fn create(&self, db: &PgPool, item: &Interview) -> Result<Interview, AppError> {
        let query = format!(
            "INSERT INTO interviews ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            INTERVIEW_COLUMNS, INTERVIEW_COLUMNS
        );
        let row = sqlx::query_as::<_, Interview>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.employee_id)
            .bind(item.interviewer_id)
            .bind(&item.interview_type)
            .bind(item.scheduled_at)
            .bind(item.status)
            .bind(&item.notes)
            .bind(&item.outcome)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn update(&self, db: &PgPool, item: &Interview) -> Result<Interview, AppError> {
        let query = format!(
            "UPDATE interviews SET scheduled_at = $3, status = $4, notes = $5, outcome = $6, \
             updated_at = $7 WHERE id = $1 AND organization_id = $2 RETURNING {}",
            INTERVIEW_COLUMNS
        );
        sqlx::query_as::<_, Interview>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.scheduled_at)
            .bind(item.status)
            .bind(&item.notes)
            .bind(&item.outcome)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Interview not found".into()))
    }
}
