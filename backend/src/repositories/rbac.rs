//! Roles, permissions and memberships.

use crate::error::AppError;
use crate::models::rbac::{MemberResponse, Membership, MembershipSummary, Permission, Role};
use crate::types::{MembershipId, OrganizationId, RoleId, UserId};
use sqlx::{PgConnection, PgExecutor, PgPool};

const ROLE_COLUMNS: &str = "id, organization_id, name, description, created_at";
const MEMBERSHIP_COLUMNS: &str = "id, organization_id, user_id, role_id, is_owner, created_at";

/// Membership of a user in one organization, with the effective permission codes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MembershipGrant {
    pub membership_id: MembershipId,
    pub role_name: String,
    pub is_owner: bool,
    pub permissions: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RbacRepository;

impl RbacRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_permissions(&self, db: &PgPool) -> Result<Vec<Permission>, AppError> {
        let rows = sqlx::query_as::<_, Permission>(
            "SELECT code, description FROM permissions ORDER BY code ASC",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Built-in roles plus the organization's own roles.
    pub async fn list_roles(&self, db: &PgPool, org: OrganizationId) -> Result<Vec<Role>, AppError> {
        let query = format!(
            "SELECT {} FROM roles WHERE organization_id IS NULL OR organization_id = $1 \
             ORDER BY organization_id NULLS FIRST, name ASC",
            ROLE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Role>(&query)
            .bind(org)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn find_role(
        &self,
        db: impl PgExecutor<'_>,
        org: OrganizationId,
        id: RoleId,
    ) -> Result<Role, AppError> {
        let query = format!(
            "SELECT {} FROM roles WHERE id = $1 AND (organization_id IS NULL OR organization_id = $2)",
            ROLE_COLUMNS
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .bind(org)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Role not found".into()))
    }

    pub async fn find_builtin_role(
        &self,
        db: impl PgExecutor<'_>,
        name: &str,
    ) -> Result<Role, AppError> {
        let query = format!(
            "SELECT {} FROM roles WHERE organization_id IS NULL AND name = $1",
            ROLE_COLUMNS
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(name)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| {
                AppError::InternalServerError(anyhow::anyhow!("built-in role `{}` is missing", name))
            })
    }

    pub async fn insert_role(&self, db: &mut PgConnection, role: &Role) -> Result<Role, AppError> {
        let query = format!(
            "INSERT INTO roles (id, organization_id, name, description, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ROLE_COLUMNS
        );
        let row = sqlx::query_as::<_, Role>(&query)
            .bind(role.id)
            .bind(role.organization_id)
            .bind(&role.name)
            .bind(&role.description)
            .bind(role.created_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn role_permissions(
        &self,
        db: impl PgExecutor<'_>,
        role_id: RoleId,
    ) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT permission_code FROM role_permissions WHERE role_id = $1 ORDER BY permission_code",
        )
        .bind(role_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Replaces the permission set of a role.
    pub async fn set_role_permissions(
        &self,
        db: &mut PgConnection,
        role_id: RoleId,
        codes: &[String],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *db)
            .await?;
        if !codes.is_empty() {
            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission_code) \
                 SELECT $1, code FROM UNNEST($2::text[]) AS code ON CONFLICT DO NOTHING",
            )
            .bind(role_id)
            .bind(codes)
            .execute(&mut *db)
            .await?;
        }
        Ok(())
    }

    pub async fn insert_membership(
        &self,
        db: impl PgExecutor<'_>,
        membership: &Membership,
    ) -> Result<Membership, AppError> {
        let query = format!(
            "INSERT INTO memberships (id, organization_id, user_id, role_id, is_owner, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            MEMBERSHIP_COLUMNS
        );
        let row = sqlx::query_as::<_, Membership>(&query)
            .bind(membership.id)
            .bind(membership.organization_id)
            .bind(membership.user_id)
            .bind(membership.role_id)
            .bind(membership.is_owner)
            .bind(membership.created_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn find_membership(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: MembershipId,
    ) -> Result<Membership, AppError> {
        let query = format!(
            "SELECT {} FROM memberships WHERE id = $1 AND organization_id = $2",
            MEMBERSHIP_COLUMNS
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .bind(org)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".into()))
    }

    pub async fn membership_exists(
        &self,
        db: &PgPool,
        org: OrganizationId,
        user_id: UserId,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM memberships WHERE organization_id = $1 AND user_id = $2)",
        )
        .bind(org)
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn update_membership_role(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: MembershipId,
        role_id: RoleId,
    ) -> Result<Membership, AppError> {
        let query = format!(
            "UPDATE memberships SET role_id = $3 WHERE id = $1 AND organization_id = $2 RETURNING {}",
            MEMBERSHIP_COLUMNS
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(id)
            .bind(org)
            .bind(role_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".into()))
    }

    pub async fn delete_membership(
        &self,
        db: &PgPool,
        org: OrganizationId,
        id: MembershipId,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM memberships WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(org)
            .execute(db)
            .await?;
        super::repository::ensure_affected(result.rows_affected(), "Member")
    }

    /// Memberships of a user across organizations.
    pub async fn summaries_for_user(
        &self,
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<MembershipSummary>, AppError> {
        let rows = sqlx::query_as::<_, MembershipSummary>(
            "SELECT m.id AS membership_id, m.organization_id, o.name AS organization_name, \
             m.role_id, r.name AS role_name, m.is_owner \
             FROM memberships m \
             JOIN organizations o ON o.id = m.organization_id \
             JOIN roles r ON r.id = m.role_id \
             WHERE m.user_id = $1 ORDER BY o.name ASC",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn members_of(
        &self,
        db: &PgPool,
        org: OrganizationId,
    ) -> Result<Vec<MemberResponse>, AppError> {
        let rows = sqlx::query_as::<_, MemberResponse>(
            "SELECT m.id AS membership_id, u.id AS user_id, u.email, u.full_name, \
             m.role_id, r.name AS role_name, m.is_owner, m.created_at \
             FROM memberships m \
             JOIN users u ON u.id = m.user_id \
             JOIN roles r ON r.id = m.role_id \
             WHERE m.organization_id = $1 ORDER BY u.full_name ASC",
        )
        .bind(org)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Loads the caller's grant in an organization, `None` when not a member.
    pub async fn grant_for(
        &self,
        db: &PgPool,
        org: OrganizationId,
        user_id: UserId,
    ) -> Result<Option<MembershipGrant>, AppError> {
        let row = sqlx::query_as::<_, MembershipGrant>(
            "SELECT m.id AS membership_id, r.name AS role_name, m.is_owner, \
             COALESCE(ARRAY_AGG(rp.permission_code) FILTER (WHERE rp.permission_code IS NOT NULL), \
             ARRAY[]::text[]) AS permissions \
             FROM memberships m \
             JOIN roles r ON r.id = m.role_id \
             LEFT JOIN role_permissions rp ON rp.role_id = r.id \
             WHERE m.organization_id = $1 AND m.user_id = $2 \
             GROUP BY m.id, r.name, m.is_owner",
        )
        .bind(org)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}
