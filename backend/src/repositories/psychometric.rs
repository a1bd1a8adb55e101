//! Psychometric tests, questions, assignments and results.

use sqlx::{PgConnection, PgPool};

use crate::error::AppError;
use crate::models::psychometric::{
    Assignment, AssignmentStatus, PsychometricTest, Question, StoredAnswer, TestResult,
};
use crate::repositories::common::{push_clause, tenant_select};
use crate::repositories::repository::{ensure_affected, TenantRepository};
use crate::types::{AssignmentId, EmployeeId, OrganizationId, PsychometricTestId, QuestionId};

const TEST_TABLE: &str = "psychometric_tests";
const TEST_COLUMNS: &str = "id, organization_id, name, description, category, time_limit_minutes, \
     is_active, created_by, created_at, updated_at";
const QUESTION_COLUMNS: &str = "id, organization_id, test_id, text, question_type, options, \
     correct_answer, weight, position, created_at";
const ASSIGNMENT_COLUMNS: &str = "id, organization_id, test_id, employee_id, assigned_by, due_date, \
     status, assigned_at, completed_at";
const RESULT_COLUMNS: &str = "id, organization_id, assignment_id, test_id, employee_id, score, \
     max_score, percentage, interpretation, completed_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct PsychometricRepository;

impl PsychometricRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn questions(
        &self,
        db: &PgPool,
        org: OrganizationId,
        test_id: PsychometricTestId,
    ) -> Result<Vec<Question>, AppError> {
        let query = format!(
            "SELECT {} FROM psychometric_questions WHERE organization_id = $1 AND test_id = $2 \
             ORDER BY position ASC",
            QUESTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Question>(&query)
            .bind(org)
            .bind(test_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn next_question_position(
        &self,
        db: &PgPool,
        test_id: PsychometricTestId,
    ) -> Result<i32, AppError> {
        let next = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM psychometric_questions WHERE test_id = $1",
        )
        .bind(test_id)
        .fetch_one(db)
        .await?;
        Ok(next)
    }

    pub async fn insert_question(&self, db: &PgPool, item: &Question) -> Result<Question, AppError> {
        let query = format!(
            "INSERT INTO psychometric_questions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            QUESTION_COLUMNS, QUESTION_COLUMNS
        );
        let row = sqlx::query_as::<_, Question>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.test_id)
            .bind(&item.text)
            .bind(item.question_type)
            .bind(&item.options)
            .bind(&item.correct_answer)
            .bind(item.weight)
            .bind(item.position)
            .bind(item.created_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn delete_question(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: QuestionId,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM psychometric_questions WHERE organization_id = $1 AND id = $2",
        )
        .bind(org)
        .bind(id)
        .execute(db)
        .await?;
        ensure_affected(result.rows_affected(), "Question")
    }

    pub async fn has_pending_assignment(
        &self,
        db: &PgPool,
        org: OrganizationId,
        test_id: PsychometricTestId,
        employee_id: EmployeeId,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM psychometric_assignments WHERE organization_id = $1 \
             AND test_id = $2 AND employee_id = $3 AND status = 'pending')",
        )
        .bind(org)
        .bind(test_id)
        .bind(employee_id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn insert_assignment(
        &self,
        db: &PgPool,
        item: &Assignment,
    ) -> Result<Assignment, AppError> {
        let query = format!(
            "INSERT INTO psychometric_assignments ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {}",
            ASSIGNMENT_COLUMNS, ASSIGNMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Assignment>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.test_id)
            .bind(item.employee_id)
            .bind(item.assigned_by)
            .bind(item.due_date)
            .bind(item.status)
            .bind(item.assigned_at)
            .bind(item.completed_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn find_assignment(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: AssignmentId,
    ) -> Result<Assignment, AppError> {
        let query = format!(
            "SELECT {} FROM psychometric_assignments WHERE organization_id = $1 AND id = $2",
            ASSIGNMENT_COLUMNS
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
    }

    pub async fn list_assignments(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: Option<EmployeeId>,
        status: Option<AssignmentStatus>,
    ) -> Result<Vec<Assignment>, AppError> {
        let mut builder = tenant_select(ASSIGNMENT_COLUMNS, "psychometric_assignments", org);
        let mut has_clause = true;
        if let Some(employee_id) = employee_id {
            push_clause(&mut builder, &mut has_clause);
            builder.push("employee_id = ").push_bind(employee_id);
        }
        if let Some(status) = status {
            push_clause(&mut builder, &mut has_clause);
            builder.push("status = ").push_bind(status);
        }
        builder.push(" ORDER BY assigned_at DESC");
        let rows = builder.build_query_as::<Assignment>().fetch_all(db).await?;
        Ok(rows)
    }

    /// Marks the assignment completed if it is still pending; false otherwise.
    pub async fn complete_assignment(
        &self,
        db: &mut PgConnection,
        id: AssignmentId,
        completed_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE psychometric_assignments SET status = 'completed', completed_at = $2 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(completed_at)
        .execute(db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn insert_result(
        &self,
        db: &mut PgConnection,
        item: &TestResult,
    ) -> Result<TestResult, AppError> {
        let query = format!(
            "INSERT INTO psychometric_results ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            RESULT_COLUMNS, RESULT_COLUMNS
        );
        let row = sqlx::query_as::<_, TestResult>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.assignment_id)
            .bind(item.test_id)
            .bind(item.employee_id)
            .bind(item.score)
            .bind(item.max_score)
            .bind(item.percentage)
            .bind(item.interpretation)
            .bind(item.completed_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn insert_answer(
        &self,
        db: &mut PgConnection,
        answer: &StoredAnswer,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO psychometric_answers (result_id, question_id, answer, points) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(answer.result_id)
        .bind(answer.question_id)
        .bind(&answer.answer)
        .bind(answer.points)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn list_results(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: Option<EmployeeId>,
        test_id: Option<PsychometricTestId>,
    ) -> Result<Vec<TestResult>, AppError> {
        let mut builder = tenant_select(RESULT_COLUMNS, "psychometric_results", org);
        let mut has_clause = true;
        if let Some(employee_id) = employee_id {
            push_clause(&mut builder, &mut has_clause);
            builder.push("employee_id = ").push_bind(employee_id);
        }
        if let Some(test_id) = test_id {
            push_clause(&mut builder, &mut has_clause);
            builder.push("test_id = ").push_bind(test_id);
        }
        builder.push(" ORDER BY completed_at DESC");
        let rows = builder.build_query_as::<TestResult>().fetch_all(db).await?;
        Ok(rows)
    }
}

impl TenantRepository<PsychometricTest> for PsychometricRepository {
    const TABLE: &'static str = TEST_TABLE;
    type Id = PsychometricTestId;

    async fn find_all(&self, db: &PgPool, org: OrganizationId) -> Result<Vec<PsychometricTest>, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 ORDER BY name ASC",
            TEST_COLUMNS, TEST_TABLE
        );
        let rows = sqlx::query_as::<_, PsychometricTest>(&query)
            .bind(org)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: PsychometricTestId,
    ) -> Result<PsychometricTest, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            TEST_COLUMNS, TEST_TABLE
        );
        sqlx::query_as::<_, PsychometricTest>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Test not found".into()))
    }

    async fn create(&self, db: &PgPool, item: &PsychometricTest) -> Result<PsychometricTest, AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            TEST_TABLE, TEST_COLUMNS, TEST_COLUMNS
        );
        let row = sqlx::query_as::<_, PsychometricTest>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category)
            .bind(item.time_limit_minutes)
            .bind(item.is_active)
            .bind(item.created_by)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn update(&self, db: &PgPool, item: &PsychometricTest) -> Result<PsychometricTest, AppError> {
        let query = format!(
            "UPDATE {} SET name = $3, description = $4, category = $5, time_limit_minutes = $6, \
             is_active = $7, updated_at = $8 WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TEST_TABLE, TEST_COLUMNS
        );
        sqlx::query_as::<_, PsychometricTest>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category)
            .bind(item.time_limit_minutes)
            .bind(item.is_active)
            .bind(item.updated_at)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Test not found".into()))
    }

    async fn delete(&self, db: &PgPool, org: OrganizationId, id: PsychometricTestId) -> Result<(), AppError> {
        let query = format!("DELETE FROM {} WHERE organization_id = $1 AND id = $2", TEST_TABLE);
        let result = sqlx::query(&query).bind(org).bind(id).execute(db).await?;
        ensure_affected(result.rows_affected(), "Test")
    }
}
