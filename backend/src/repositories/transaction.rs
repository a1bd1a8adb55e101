//! Transaction helpers for handlers that write several tables at once.
//!
//! A transaction dropped without [`commit_transaction`] is rolled back by
//! sqlx, so early returns through `?` leave no partial writes behind.

use crate::error::AppError;
use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

pub async fn begin_transaction(db: &PgPool) -> Result<PgTransaction<'static>, AppError> {
    db.begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}

pub async fn commit_transaction(tx: PgTransaction<'_>) -> Result<(), AppError> {
    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to commit transaction");
        AppError::InternalServerError(e.into())
    })
}
