//! Disciplinary cases and the records attached to each process stage.

use sqlx::{PgConnection, PgPool};

use crate::error::AppError;
use crate::models::disciplinary::{
    CaseDetail, CaseNotification, CaseStatus, Charge, DefenseSubmission, DisciplinaryCase, Hearing,
    Sanction, Termination,
};
use crate::repositories::common::{push_clause, tenant_select};
use crate::types::{DisciplinaryCaseId, EmployeeId, OrganizationId};

const TABLE_NAME: &str = "disciplinary_cases";
const SELECT_COLUMNS: &str = "id, organization_id, employee_id, case_number, title, description, \
     incident_date, status, resolution, opened_by, closed_at, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct DisciplinaryRepository;

impl DisciplinaryRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(
        &self,
        db: &PgPool,
        org: OrganizationId,
        employee_id: Option<EmployeeId>,
        status: Option<CaseStatus>,
    ) -> Result<Vec<DisciplinaryCase>, AppError> {
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
        builder.push(" ORDER BY created_at DESC");
        let rows = builder.build_query_as::<DisciplinaryCase>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn find_by_id(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: DisciplinaryCaseId,
    ) -> Result<DisciplinaryCase, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, DisciplinaryCase>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Disciplinary case not found".into()))
    }

    /// Locks the case row so concurrent stage changes serialize.
    pub async fn find_for_update(
        &self,
        db: &mut PgConnection,
        org: OrganizationId,
        id: DisciplinaryCaseId,
    ) -> Result<DisciplinaryCase, AppError> {
        let query = format!(
            "SELECT {} FROM {} WHERE organization_id = $1 AND id = $2 FOR UPDATE",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, DisciplinaryCase>(&query)
            .bind(org)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Disciplinary case not found".into()))
    }

    /// Allocates the next per-organization, per-year case sequence.
    pub async fn next_case_sequence(
        &self,
        db: &mut PgConnection,
        org: OrganizationId,
        year: i32,
    ) -> Result<i64, AppError> {
        let value = sqlx::query_scalar::<_, i64>(
            "INSERT INTO disciplinary_case_counters (organization_id, year, last_value) \
             VALUES ($1, $2, 1) ON CONFLICT (organization_id, year) \
             DO UPDATE SET last_value = disciplinary_case_counters.last_value + 1 \
             RETURNING last_value",
        )
        .bind(org)
        .bind(year)
        .fetch_one(db)
        .await?;
        Ok(value)
    }

    pub async fn insert(
        &self,
        db: &mut PgConnection,
        item: &DisciplinaryCase,
    ) -> Result<DisciplinaryCase, AppError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, DisciplinaryCase>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.employee_id)
            .bind(&item.case_number)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.incident_date)
            .bind(item.status)
            .bind(&item.resolution)
            .bind(item.opened_by)
            .bind(item.closed_at)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn update_status(
        &self,
        db: &mut PgConnection,
        item: &DisciplinaryCase,
    ) -> Result<DisciplinaryCase, AppError> {
        let query = format!(
            "UPDATE {} SET status = $3, resolution = $4, closed_at = $5, updated_at = $6 \
             WHERE id = $1 AND organization_id = $2 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, DisciplinaryCase>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.status)
            .bind(&item.resolution)
            .bind(item.closed_at)
            .bind(item.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn count_charges(
        &self,
        db: &mut PgConnection,
        case_id: DisciplinaryCaseId,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM disciplinary_charges WHERE case_id = $1",
        )
        .bind(case_id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    pub async fn insert_charge(&self, db: &mut PgConnection, item: &Charge) -> Result<Charge, AppError> {
        let row = sqlx::query_as::<_, Charge>(
            "INSERT INTO disciplinary_charges (id, case_id, description, regulation_reference, severity, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, case_id, description, regulation_reference, severity, created_at",
        )
        .bind(item.id)
        .bind(item.case_id)
        .bind(&item.description)
        .bind(&item.regulation_reference)
        .bind(item.severity)
        .bind(item.created_at)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn insert_notification(
        &self,
        db: &mut PgConnection,
        item: &CaseNotification,
    ) -> Result<CaseNotification, AppError> {
        let row = sqlx::query_as::<_, CaseNotification>(
            "INSERT INTO disciplinary_notifications (id, case_id, method, recipient, content, notified_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, case_id, method, recipient, content, notified_at",
        )
        .bind(item.id)
        .bind(item.case_id)
        .bind(item.method)
        .bind(&item.recipient)
        .bind(&item.content)
        .bind(item.notified_at)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn insert_defense(
        &self,
        db: &mut PgConnection,
        item: &DefenseSubmission,
    ) -> Result<DefenseSubmission, AppError> {
        let row = sqlx::query_as::<_, DefenseSubmission>(
            "INSERT INTO defense_submissions (id, case_id, content, submitted_at) \
             VALUES ($1, $2, $3, $4) RETURNING id, case_id, content, submitted_at",
        )
        .bind(item.id)
        .bind(item.case_id)
        .bind(&item.content)
        .bind(item.submitted_at)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn insert_hearing(&self, db: &mut PgConnection, item: &Hearing) -> Result<Hearing, AppError> {
        let row = sqlx::query_as::<_, Hearing>(
            "INSERT INTO disciplinary_hearings (id, case_id, scheduled_at, location, attendees, minutes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, case_id, scheduled_at, location, attendees, minutes, created_at",
        )
        .bind(item.id)
        .bind(item.case_id)
        .bind(item.scheduled_at)
        .bind(&item.location)
        .bind(&item.attendees)
        .bind(&item.minutes)
        .bind(item.created_at)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn insert_sanction(&self, db: &mut PgConnection, item: &Sanction) -> Result<Sanction, AppError> {
        let row = sqlx::query_as::<_, Sanction>(
            "INSERT INTO disciplinary_sanctions (id, case_id, sanction_type, description, start_date, end_date, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, case_id, sanction_type, description, start_date, end_date, created_at",
        )
        .bind(item.id)
        .bind(item.case_id)
        .bind(item.sanction_type)
        .bind(&item.description)
        .bind(item.start_date)
        .bind(item.end_date)
        .bind(item.created_at)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn insert_termination(
        &self,
        db: &mut PgConnection,
        item: &Termination,
    ) -> Result<Termination, AppError> {
        let row = sqlx::query_as::<_, Termination>(
            "INSERT INTO disciplinary_terminations (id, case_id, termination_date, reason, with_just_cause, \
             severance_amount, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, case_id, termination_date, reason, with_just_cause, severance_amount, created_at",
        )
        .bind(item.id)
        .bind(item.case_id)
        .bind(item.termination_date)
        .bind(&item.reason)
        .bind(item.with_just_cause)
        .bind(item.severance_amount)
        .bind(item.created_at)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Loads a case with every stage record attached to it.
    pub async fn detail(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: DisciplinaryCaseId,
    ) -> Result<CaseDetail, AppError> {
        let case = self.find_by_id(db, org, id).await?;
        let charges = sqlx::query_as::<_, Charge>(
            "SELECT id, case_id, description, regulation_reference, severity, created_at \
             FROM disciplinary_charges WHERE case_id = $1 ORDER BY created_at ASC",
        )
        .bind(id)
        .fetch_all(db)
        .await?;
        let notifications = sqlx::query_as::<_, CaseNotification>(
            "SELECT id, case_id, method, recipient, content, notified_at \
             FROM disciplinary_notifications WHERE case_id = $1 ORDER BY notified_at ASC",
        )
        .bind(id)
        .fetch_all(db)
        .await?;
        let defenses = sqlx::query_as::<_, DefenseSubmission>(
            "SELECT id, case_id, content, submitted_at FROM defense_submissions \
             WHERE case_id = $1 ORDER BY submitted_at ASC",
        )
        .bind(id)
        .fetch_all(db)
        .await?;
        let hearings = sqlx::query_as::<_, Hearing>(
            "SELECT id, case_id, scheduled_at, location, attendees, minutes, created_at \
             FROM disciplinary_hearings WHERE case_id = $1 ORDER BY scheduled_at ASC",
        )
        .bind(id)
        .fetch_all(db)
        .await?;
        let sanction = sqlx::query_as::<_, Sanction>(
            "SELECT id, case_id, sanction_type, description, start_date, end_date, created_at \
             FROM disciplinary_sanctions WHERE case_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        let termination = sqlx::query_as::<_, Termination>(
            "SELECT id, case_id, termination_date, reason, with_just_cause, severance_amount, created_at \
             FROM disciplinary_terminations WHERE case_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(CaseDetail {
            case,
            charges,
            notifications,
            defenses,
            hearings,
            sanction,
            termination,
        })
    }
}
