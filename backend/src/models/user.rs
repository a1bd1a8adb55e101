//! Models that represent users and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    models::{
        organization::{CreateOrganization, Organization},
        rbac::MembershipSummary,
    },
    types::UserId,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of a user account.
pub struct User {
    pub id: UserId,
    /// Login identifier, unique across the installation.
    pub email: String,
    /// Argon2 PHC hash of the user's password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    /// Installation-wide administrator, bypasses tenant permissions.
    pub is_system_admin: bool,
    /// Inactive users cannot log in.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Constructs a new active user with a fresh identifier.
    pub fn new(email: String, password_hash: String, full_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email: normalize_email(&email),
            password_hash,
            full_name,
            is_system_admin: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_system_admin(&self) -> bool {
        self.is_system_admin
    }
}

/// Emails are compared case-insensitively; store them lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Sign-up payload: the first user of a new organization.
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(nested)]
    pub organization: CreateOrganization,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Payload submitted when a user changes their password.
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub is_system_admin: bool,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_system_admin: user.is_system_admin,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Authentication tokens returned after a successful login or refresh.
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserResponse,
    pub memberships: Vec<MembershipSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub auth: AuthResponse,
    pub organization: Organization,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
    pub memberships: Vec<MembershipSummary>,
}
