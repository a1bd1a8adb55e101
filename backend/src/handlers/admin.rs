//! Organization administration: roles, permissions and members.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::common::{created, Created},
    middleware::OrgContext,
    models::{
        rbac::{
            permissions, unknown_permissions, AddMemberPayload, CreateRolePayload, MemberResponse,
            Membership, Permission, Role, RoleResponse, SetRolePermissionsPayload,
            UpdateMemberPayload,
        },
        user::{normalize_email, User},
    },
    repositories::{auth as auth_repo, begin_transaction, commit_transaction, RbacRepository},
    state::AppState,
    types::{MembershipId, RoleId},
    utils::password::hash_password,
    validation::rules::validate_password,
};

pub async fn list_permissions(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> AppResult<Json<Vec<Permission>>> {
    ctx.require(permissions::ADMIN_MANAGE)?;
    Ok(Json(RbacRepository::new().list_permissions(&state.pool).await?))
}

pub async fn list_roles(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> AppResult<Json<Vec<RoleResponse>>> {
    ctx.require(permissions::ADMIN_MANAGE)?;
    let repo = RbacRepository::new();
    let roles = repo.list_roles(&state.pool, ctx.organization_id).await?;

    let mut response = Vec::with_capacity(roles.len());
    for role in roles {
        let permissions = repo.role_permissions(&state.pool, role.id).await?;
        response.push(RoleResponse {
            builtin: role.is_builtin(),
            role,
            permissions,
        });
    }
    Ok(Json(response))
}

pub async fn create_role(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateRolePayload>,
) -> AppResult<Created<RoleResponse>> {
    ctx.require(permissions::ADMIN_MANAGE)?;
    payload.validate()?;
    ensure_known_permissions(&payload.permissions)?;

    let repo = RbacRepository::new();
    let role = Role::new(
        ctx.organization_id,
        payload.name.trim().to_string(),
        payload.description,
    );

    let mut tx = begin_transaction(&state.pool).await?;
    let role = repo.insert_role(&mut tx, &role).await?;
    repo.set_role_permissions(&mut tx, role.id, &payload.permissions)
        .await?;
    let permissions = repo.role_permissions(&mut *tx, role.id).await?;
    commit_transaction(tx).await?;

    Ok(created(RoleResponse {
        builtin: false,
        role,
        permissions,
    }))
}

pub async fn set_role_permissions(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(role_id): Path<RoleId>,
    Json(payload): Json<SetRolePermissionsPayload>,
) -> AppResult<Json<RoleResponse>> {
    ctx.require(permissions::ADMIN_MANAGE)?;
    ensure_known_permissions(&payload.permissions)?;

    let repo = RbacRepository::new();
    let role = repo
        .find_role(&state.pool, ctx.organization_id, role_id)
        .await?;
    if role.is_builtin() {
        return Err(AppError::Forbidden("Built-in roles cannot be modified".into()));
    }

    let mut tx = begin_transaction(&state.pool).await?;
    repo.set_role_permissions(&mut tx, role.id, &payload.permissions)
        .await?;
    let permissions = repo.role_permissions(&mut *tx, role.id).await?;
    commit_transaction(tx).await?;

    Ok(Json(RoleResponse {
        builtin: false,
        role,
        permissions,
    }))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> AppResult<Json<Vec<MemberResponse>>> {
    ctx.require(permissions::ADMIN_MANAGE)?;
    Ok(Json(
        RbacRepository::new()
            .members_of(&state.pool, ctx.organization_id)
            .await?,
    ))
}

/// Attaches an existing account, or creates one when a password is supplied.
pub async fn add_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<AddMemberPayload>,
) -> AppResult<(StatusCode, Json<Value>)> {
    ctx.require(permissions::ADMIN_MANAGE)?;
    payload.validate()?;

    let repo = RbacRepository::new();
    let role = repo
        .find_role(&state.pool, ctx.organization_id, payload.role_id)
        .await?;
    let email = normalize_email(&payload.email);

    let user = match auth_repo::find_user_by_email(&state.pool, &email).await? {
        Some(user) => user,
        None => {
            let password = payload.password.as_deref().ok_or_else(|| {
                AppError::NotFound("No user with that email; provide a password to create one".into())
            })?;
            validate_password(password, state.config.password_min_length).map_err(|_| {
                AppError::BadRequest(format!(
                    "Password must be at least {} characters",
                    state.config.password_min_length
                ))
            })?;
            let full_name = payload
                .full_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| AppError::BadRequest("full_name is required for new users".into()))?;
            let user = User::new(email, hash_password(password)?, full_name.to_string());
            auth_repo::insert_user(&state.pool, &user).await?
        }
    };

    if repo
        .membership_exists(&state.pool, ctx.organization_id, user.id)
        .await?
    {
        return Err(AppError::Conflict(
            "User is already a member of this organization".into(),
        ));
    }

    let membership = repo
        .insert_membership(
            &state.pool,
            &Membership::new(ctx.organization_id, user.id, role.id, false),
        )
        .await?;

    tracing::info!(
        organization_id = %ctx.organization_id,
        user_id = %user.id,
        role = %role.name,
        "Member added"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "membership_id": membership.id,
            "user_id": user.id,
            "email": user.email,
            "full_name": user.full_name,
            "role_id": role.id,
            "role_name": role.name,
            "is_owner": membership.is_owner,
        })),
    ))
}

pub async fn update_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(membership_id): Path<MembershipId>,
    Json(payload): Json<UpdateMemberPayload>,
) -> AppResult<Json<Membership>> {
    ctx.require(permissions::ADMIN_MANAGE)?;
    let repo = RbacRepository::new();
    let role = repo
        .find_role(&state.pool, ctx.organization_id, payload.role_id)
        .await?;
    let membership = repo
        .update_membership_role(&state.pool, ctx.organization_id, membership_id, role.id)
        .await?;
    Ok(Json(membership))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(membership_id): Path<MembershipId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::ADMIN_MANAGE)?;
    let repo = RbacRepository::new();
    let membership = repo
        .find_membership(&state.pool, ctx.organization_id, membership_id)
        .await?;
    if membership.is_owner {
        return Err(AppError::BadRequest(
            "The owner membership cannot be removed".into(),
        ));
    }
    repo.delete_membership(&state.pool, ctx.organization_id, membership_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn ensure_known_permissions(codes: &[String]) -> AppResult<()> {
    let unknown = unknown_permissions(codes);
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Unknown permissions: {}",
            unknown.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_known_permissions_lists_offenders() {
        assert!(ensure_known_permissions(&["admin:manage".to_string()]).is_ok());
        match ensure_known_permissions(&["admin:manage".into(), "root".into()]) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Unknown permissions: root"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
