//! Tenant resolution from the `X-Organization-Id` header.

use std::collections::HashSet;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::{rbac::permissions, user::User},
    repositories::{OrganizationRepository, RbacRepository},
    state::AppState,
    types::{MembershipId, OrganizationId},
};

pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// The organization a request acts on and what the caller may do there.
#[derive(Debug, Clone)]
pub struct OrgContext {
    pub organization_id: OrganizationId,
    pub user: User,
    /// `None` for system administrators without a membership.
    pub membership_id: Option<MembershipId>,
    pub role_name: String,
    pub permissions: HashSet<String>,
    pub is_owner: bool,
}

impl OrgContext {
    pub fn has(&self, permission: &str) -> bool {
        self.is_owner || self.user.is_system_admin() || self.permissions.contains(permission)
    }

    pub fn require(&self, permission: &str) -> Result<(), AppError> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Missing permission: {}",
                permission
            )))
        }
    }

    fn system_admin(organization_id: OrganizationId, user: User) -> Self {
        Self {
            organization_id,
            user,
            membership_id: None,
            role_name: "system_admin".to_string(),
            permissions: permissions::ALL.iter().map(|p| p.to_string()).collect(),
            is_owner: false,
        }
    }
}

pub(crate) fn parse_organization_header(headers: &HeaderMap) -> Result<OrganizationId, AppError> {
    let raw = headers
        .get(ORGANIZATION_HEADER)
        .ok_or_else(|| AppError::BadRequest("X-Organization-Id header is required".into()))?
        .to_str()
        .map_err(|_| AppError::BadRequest("X-Organization-Id header is malformed".into()))?;
    raw.parse()
        .map_err(|_| AppError::BadRequest("X-Organization-Id header is malformed".into()))
}

/// Must run after `auth`, which provides the `User` extension.
pub async fn tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let organization_id = parse_organization_header(request.headers())?;
    let user = request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    let grant = RbacRepository::new()
        .grant_for(&state.pool, organization_id, user.id)
        .await?;

    let context = match grant {
        Some(grant) => OrgContext {
            organization_id,
            user,
            membership_id: Some(grant.membership_id),
            role_name: grant.role_name,
            permissions: grant.permissions.into_iter().collect(),
            is_owner: grant.is_owner,
        },
        None if user.is_system_admin() => {
            OrganizationRepository::new()
                .find_by_id(&state.pool, organization_id)
                .await?;
            OrgContext::system_admin(organization_id, user)
        }
        None => {
            tracing::warn!(
                user_id = %user.id,
                organization_id = %organization_id,
                "Rejected request for an organization the user does not belong to"
            );
            return Err(AppError::Forbidden(
                "You are not a member of this organization".into(),
            ));
        }
    };

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn context(permissions: &[&str], is_owner: bool) -> OrgContext {
        OrgContext {
            organization_id: OrganizationId::new(),
            user: User::new("ana@acme.co".into(), "hash".into(), "Ana".into()),
            membership_id: Some(MembershipId::new()),
            role_name: "custom".into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            is_owner,
        }
    }

    #[test]
    fn require_checks_role_permissions() {
        let ctx = context(&[permissions::PAYROLL_READ], false);
        assert!(ctx.require(permissions::PAYROLL_READ).is_ok());
        assert!(matches!(
            ctx.require(permissions::PAYROLL_APPROVE),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn owners_and_system_admins_bypass_permissions() {
        assert!(context(&[], true).require(permissions::ADMIN_MANAGE).is_ok());

        let mut ctx = context(&[], false);
        ctx.user.is_system_admin = true;
        assert!(ctx.require(permissions::DIAN_SUBMIT).is_ok());
    }

    #[test]
    fn organization_header_must_be_a_uuid() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            parse_organization_header(&headers),
            Err(AppError::BadRequest(_))
        ));

        headers.insert(ORGANIZATION_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(parse_organization_header(&headers).is_err());

        let id = OrganizationId::new();
        headers.insert(
            ORGANIZATION_HEADER,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        assert_eq!(parse_organization_header(&headers).unwrap(), id);
    }
}
