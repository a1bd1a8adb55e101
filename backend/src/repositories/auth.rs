use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::types::UserId;
use crate::{models::user::User, utils::jwt::RefreshToken};

pub const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, is_system_admin, is_active, created_at, updated_at";

#[derive(Debug, FromRow)]
/// Represents a stored refresh token in the database.
pub struct StoredRefreshToken {
    pub id: String,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
/// Represents an active access token to be stored for revocation checks.
pub struct ActiveAccessToken<'a> {
    pub jti: &'a str,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Finds a user by their (normalized) email address.
pub async fn find_user_by_email(
    db: impl PgExecutor<'_>,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(db)
        .await
}

/// Finds a user by their ID.
pub async fn find_user_by_id(pool: &PgPool, user_id: UserId) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_user(db: impl PgExecutor<'_>, user: &User) -> Result<User, sqlx::Error> {
    let query = format!(
        "INSERT INTO users (id, email, password_hash, full_name, is_system_admin, is_active, \
         created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
        USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&query)
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.is_system_admin)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(db)
        .await
}

/// Updates a user's password hash.
pub async fn update_user_password(
    pool: &PgPool,
    user_id: UserId,
    new_password_hash: &str,
) -> Result<User, sqlx::Error> {
    let query = format!(
        "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
        USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&query)
        .bind(new_password_hash)
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Inserts a new refresh token into the database.
pub async fn insert_refresh_token(pool: &PgPool, token: &RefreshToken) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(&token.id)
    .bind(token.user_id)
    .bind(&token.token_hash)
    .bind(token.expires_at)
    .execute(pool)
    .await
    .map(|_| ())
}

/// Deletes a specific refresh token by its ID.
pub async fn delete_refresh_token_by_id(pool: &PgPool, token_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
        .bind(token_id)
        .execute(pool)
        .await
        .map(|_| ())
}

/// Deletes all refresh tokens for a specific user.
pub async fn delete_refresh_tokens_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map(|_| ())
}

/// Fetches a valid (non-expired) refresh token by its ID.
pub async fn fetch_valid_refresh_token(
    pool: &PgPool,
    token_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<StoredRefreshToken>, sqlx::Error> {
    sqlx::query_as::<_, StoredRefreshToken>(
        "SELECT id, user_id, token_hash, expires_at FROM refresh_tokens \
         WHERE id = $1 AND expires_at > $2",
    )
    .bind(token_id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Inserts an active access token into the database (for revocation tracking).
pub async fn insert_active_access_token(
    pool: &PgPool,
    token: &ActiveAccessToken<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO active_access_tokens (jti, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token.jti)
        .bind(token.user_id)
        .bind(token.expires_at)
        .execute(pool)
        .await
        .map(|_| ())
}

/// Checks if an access token exists (is active/valid) by its JTI.
pub async fn access_token_exists(pool: &PgPool, jti: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM active_access_tokens WHERE jti = $1 AND expires_at > NOW())",
    )
    .bind(jti)
    .fetch_one(pool)
    .await
}

/// Deletes a specific active access token by its JTI (revocation).
pub async fn delete_active_access_token_by_jti(
    pool: &PgPool,
    jti: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM active_access_tokens WHERE jti = $1")
        .bind(jti)
        .execute(pool)
        .await
        .map(|_| ())
}

/// Removes expired refresh tokens, returning how many were deleted.
pub async fn cleanup_expired_refresh_tokens(pool: &PgPool) -> Result<u64, sqlx::Error> {
    sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
        .execute(pool)
        .await
        .map(|r| r.rows_affected())
}

/// Removes expired access tokens, returning how many were deleted.
pub async fn cleanup_expired_access_tokens(pool: &PgPool) -> Result<u64, sqlx::Error> {
    sqlx::query("DELETE FROM active_access_tokens WHERE expires_at <= NOW()")
        .execute(pool)
        .await
        .map(|r| r.rows_affected())
}
