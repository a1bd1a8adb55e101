//! Memberships, roles and permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{MembershipId, OrganizationId, RoleId, UserId};

/// Permission codes seeded by the initial migration.
pub mod permissions {
    pub const EMPLOYEES_READ: &str = "employees:read";
    pub const EMPLOYEES_WRITE: &str = "employees:write";
    pub const DEPARTMENTS_WRITE: &str = "departments:write";
    pub const POSITIONS_WRITE: &str = "positions:write";
    pub const ATTENDANCE_READ: &str = "attendance:read";
    pub const ATTENDANCE_WRITE: &str = "attendance:write";
    pub const VACATIONS_READ: &str = "vacations:read";
    pub const VACATIONS_WRITE: &str = "vacations:write";
    pub const VACATIONS_APPROVE: &str = "vacations:approve";
    pub const PAYROLL_READ: &str = "payroll:read";
    pub const PAYROLL_WRITE: &str = "payroll:write";
    pub const PAYROLL_APPROVE: &str = "payroll:approve";
    pub const DIAN_SUBMIT: &str = "dian:submit";
    pub const TRAINING_READ: &str = "training:read";
    pub const TRAINING_WRITE: &str = "training:write";
    pub const EVALUATIONS_READ: &str = "evaluations:read";
    pub const EVALUATIONS_WRITE: &str = "evaluations:write";
    pub const COMPETENCIES_WRITE: &str = "competencies:write";
    pub const BENEFITS_WRITE: &str = "benefits:write";
    pub const DISCIPLINARY_READ: &str = "disciplinary:read";
    pub const DISCIPLINARY_WRITE: &str = "disciplinary:write";
    pub const ADMIN_MANAGE: &str = "admin:manage";

    pub const ALL: &[&str] = &[
        EMPLOYEES_READ,
        EMPLOYEES_WRITE,
        DEPARTMENTS_WRITE,
        POSITIONS_WRITE,
        ATTENDANCE_READ,
        ATTENDANCE_WRITE,
        VACATIONS_READ,
        VACATIONS_WRITE,
        VACATIONS_APPROVE,
        PAYROLL_READ,
        PAYROLL_WRITE,
        PAYROLL_APPROVE,
        DIAN_SUBMIT,
        TRAINING_READ,
        TRAINING_WRITE,
        EVALUATIONS_READ,
        EVALUATIONS_WRITE,
        COMPETENCIES_WRITE,
        BENEFITS_WRITE,
        DISCIPLINARY_READ,
        DISCIPLINARY_WRITE,
        ADMIN_MANAGE,
    ];

    pub fn is_known(code: &str) -> bool {
        ALL.contains(&code)
    }
}

/// Name of the built-in role granted to organization founders.
pub const BUILTIN_ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Permission {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Role {
    pub id: RoleId,
    /// `None` for built-in roles shared by every organization.
    pub organization_id: Option<OrganizationId>,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Role {
    pub fn new(organization_id: OrganizationId, name: String, description: Option<String>) -> Self {
        Self {
            id: RoleId::new(),
            organization_id: Some(organization_id),
            name,
            description,
            created_at: Utc::now(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.organization_id.is_none()
    }

    /// Built-in roles are visible to every tenant; custom roles only to their owner.
    pub fn visible_to(&self, organization_id: OrganizationId) -> bool {
        self.organization_id
            .map(|owner| owner == organization_id)
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Membership {
    pub id: MembershipId,
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(
        organization_id: OrganizationId,
        user_id: UserId,
        role_id: RoleId,
        is_owner: bool,
    ) -> Self {
        Self {
            id: MembershipId::new(),
            organization_id,
            user_id,
            role_id,
            is_owner,
            created_at: Utc::now(),
        }
    }
}

/// A membership as seen by its user: which organization, which role.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MembershipSummary {
    pub membership_id: MembershipId,
    pub organization_id: OrganizationId,
    pub organization_name: String,
    pub role_id: RoleId,
    pub role_name: String,
    pub is_owner: bool,
}

/// A membership as seen by an organization administrator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MemberResponse {
    pub membership_id: MembershipId,
    pub user_id: UserId,
    pub email: String,
    pub full_name: String,
    pub role_id: RoleId,
    pub role_name: String,
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,
    pub builtin: bool,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRolePermissionsPayload {
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddMemberPayload {
    #[validate(email)]
    pub email: String,
    pub role_id: RoleId,
    /// Required only when the user does not exist yet.
    #[serde(default)]
    pub full_name: Option<String>,
    /// When present and the user does not exist, an account is created.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMemberPayload {
    pub role_id: RoleId,
}

/// Returns the permission codes that are not part of the catalogue.
pub fn unknown_permissions(codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .filter(|code| !permissions::is_known(code))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_roles_are_visible_everywhere() {
        let org = OrganizationId::new();
        let mut role = Role::new(org, "auditor".into(), None);
        assert!(role.visible_to(org));
        assert!(!role.visible_to(OrganizationId::new()));

        role.organization_id = None;
        assert!(role.is_builtin());
        assert!(role.visible_to(OrganizationId::new()));
    }

    #[test]
    fn unknown_permissions_are_reported() {
        let codes = vec!["payroll:read".to_string(), "payroll:delete".to_string()];
        assert_eq!(unknown_permissions(&codes), vec!["payroll:delete".to_string()]);
    }

    #[test]
    fn permission_catalogue_has_no_duplicates() {
        let mut codes = permissions::ALL.to_vec();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), permissions::ALL.len());
    }
}
