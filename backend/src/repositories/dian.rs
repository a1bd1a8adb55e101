//! DIAN submission history.

use sqlx::{PgExecutor, PgPool};

use crate::error::AppError;
use crate::models::dian::DianSubmission;
use crate::types::{OrganizationId, PayrollId};

const SELECT_COLUMNS: &str = "id, organization_id, payroll_id, document_number, cune, status, \
     response_code, response_message, tracking_id, xml_document, submitted_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct DianSubmissionRepository;

impl DianSubmissionRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert(
        &self,
        db: impl PgExecutor<'_>,
        item: &DianSubmission,
    ) -> Result<DianSubmission, AppError> {
        let query = format!(
            "INSERT INTO dian_submissions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            SELECT_COLUMNS, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, DianSubmission>(&query)
            .bind(item.id)
            .bind(item.organization_id)
            .bind(item.payroll_id)
            .bind(&item.document_number)
            .bind(&item.cune)
            .bind(item.status)
            .bind(&item.response_code)
            .bind(&item.response_message)
            .bind(&item.tracking_id)
            .bind(&item.xml_document)
            .bind(item.submitted_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn list(
        &self,
        db: &PgPool,
        org: OrganizationId,
        payroll_id: Option<PayrollId>,
    ) -> Result<Vec<DianSubmission>, AppError> {
        let query = format!(
            "SELECT {} FROM dian_submissions WHERE organization_id = $1 \
             AND ($2::text IS NULL OR payroll_id = $2) ORDER BY submitted_at DESC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, DianSubmission>(&query)
            .bind(org)
            .bind(payroll_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    /// Most recent submission of a payroll, the document DIAN actually received.
    pub async fn latest_for_payroll(
        &self,
        db: &PgPool,
        org: OrganizationId,
        payroll_id: PayrollId,
    ) -> Result<Option<DianSubmission>, AppError> {
        let query = format!(
            "SELECT {} FROM dian_submissions WHERE organization_id = $1 AND payroll_id = $2 \
             ORDER BY submitted_at DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, DianSubmission>(&query)
            .bind(org)
            .bind(payroll_id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }
}
