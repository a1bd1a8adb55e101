//! Organization (tenant) repository.

use crate::error::AppError;
use crate::models::organization::Organization;
use crate::types::{OrganizationId, UserId};
use sqlx::{PgExecutor, PgPool};

const TABLE_NAME: &str = "organizations";
const SELECT_COLUMNS: &str =
    "id, name, nit, legal_name, email, phone, address, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct OrganizationRepository;

impl OrganizationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert(
        &self,
        db: impl PgExecutor<'_>,
        org: &Organization,
    ) -> Result<Organization, AppError> {
        let query = format!(
            "INSERT INTO {} (id, name, nit, legal_name, email, phone, address, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Organization>(&query)
            .bind(org.id)
            .bind(&org.name)
            .bind(&org.nit)
            .bind(&org.legal_name)
            .bind(&org.email)
            .bind(&org.phone)
            .bind(&org.address)
            .bind(org.created_at)
            .bind(org.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn find_by_id(
        &self,
        db: impl PgExecutor<'_>,
        id: OrganizationId,
    ) -> Result<Organization, AppError> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Organization not found".into()))
    }

    pub async fn find_all(&self, db: &PgPool) -> Result<Vec<Organization>, AppError> {
        let query = format!("SELECT {} FROM {} ORDER BY name ASC", SELECT_COLUMNS, TABLE_NAME);
        let rows = sqlx::query_as::<_, Organization>(&query).fetch_all(db).await?;
        Ok(rows)
    }

    /// Organizations in which the user holds a membership.
    pub async fn find_for_user(
        &self,
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<Organization>, AppError> {
        let query = format!(
            "SELECT {} FROM {} o WHERE EXISTS (SELECT 1 FROM memberships m \
             WHERE m.organization_id = o.id AND m.user_id = $1) ORDER BY o.name ASC",
            prefixed("o"),
            TABLE_NAME
        );
        let rows = sqlx::query_as::<_, Organization>(&query)
            .bind(user_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn update(&self, db: &PgPool, org: &Organization) -> Result<Organization, AppError> {
        let query = format!(
            "UPDATE {} SET name = $2, legal_name = $3, email = $4, phone = $5, address = $6, \
             updated_at = $7 WHERE id = $1 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Organization>(&query)
            .bind(org.id)
            .bind(&org.name)
            .bind(&org.legal_name)
            .bind(&org.email)
            .bind(&org.phone)
            .bind(&org.address)
            .bind(org.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }
}

fn prefixed(alias: &str) -> String {
    SELECT_COLUMNS
        .split(", ")
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}
