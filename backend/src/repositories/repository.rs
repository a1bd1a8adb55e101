//! Repository trait and common functionality
//!
//! Tenant-owned tables implement [`TenantRepository`]. Every method takes the
//! organization id and filters on it, so a record of another tenant behaves
//! exactly like a missing one.

use crate::error::AppError;
use crate::types::OrganizationId;
use sqlx::PgPool;

/// Standard repository trait for tenant-scoped database operations.
#[allow(async_fn_in_trait)]
pub trait TenantRepository<T> {
    /// Target table name.
    const TABLE: &'static str;
    /// Primary key type for the record.
    type Id;

    /// Find all records of the organization.
    async fn find_all(&self, db: &PgPool, org: OrganizationId) -> Result<Vec<T>, AppError>;

    /// Find a single record by ID; `NotFound` when it belongs to another organization.
    async fn find_by_id(&self, db: &PgPool, org: OrganizationId, id: Self::Id) -> Result<T, AppError>;

    /// Create a new record.
    async fn create(&self, db: &PgPool, item: &T) -> Result<T, AppError>;

    /// Update an existing record.
    async fn update(&self, db: &PgPool, item: &T) -> Result<T, AppError>;

    /// Delete a record by ID.
    async fn delete(&self, db: &PgPool, org: OrganizationId, id: Self::Id) -> Result<(), AppError>;
}

/// Maps a zero-row write to `NotFound`.
pub fn ensure_affected(rows: u64, entity: &str) -> Result<(), AppError> {
    if rows == 0 {
        Err(AppError::NotFound(format!("{} not found", entity)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_affected_reports_missing_rows() {
        assert!(ensure_affected(1, "Employee").is_ok());
        match ensure_affected(0, "Employee") {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Employee not found"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
