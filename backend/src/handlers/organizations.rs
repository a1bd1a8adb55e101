use axum::{
    extract::{Extension, State},
    Json,
};
use sqlx::PgConnection;
use validator::Validate;

use crate::{
    error::AppResult,
    handlers::common::{created, Created},
    middleware::OrgContext,
    models::{
        organization::{CreateOrganization, Organization, UpdateOrganization},
        rbac::{permissions, Membership, BUILTIN_ADMIN_ROLE},
        user::User,
    },
    repositories::{begin_transaction, commit_transaction, OrganizationRepository, RbacRepository},
    state::AppState,
    types::UserId,
};

/// Inserts the organization and makes `owner` its administrator.
pub(crate) async fn create_with_owner(
    conn: &mut PgConnection,
    organization: &Organization,
    owner: UserId,
) -> AppResult<Organization> {
    let rbac = RbacRepository::new();
    let organization = OrganizationRepository::new()
        .insert(&mut *conn, organization)
        .await?;
    let admin_role = rbac.find_builtin_role(&mut *conn, BUILTIN_ADMIN_ROLE).await?;
    rbac.insert_membership(
        &mut *conn,
        &Membership::new(organization.id, owner, admin_role.id, true),
    )
    .await?;
    Ok(organization)
}

pub async fn list_my_organizations(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<Organization>>> {
    let organizations = OrganizationRepository::new()
        .find_for_user(&state.pool, user.id)
        .await?;
    Ok(Json(organizations))
}

pub async fn create_organization(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateOrganization>,
) -> AppResult<Created<Organization>> {
    payload.validate()?;
    let organization = Organization::new(payload);

    let mut tx = begin_transaction(&state.pool).await?;
    let organization = create_with_owner(&mut *tx, &organization, user.id).await?;
    commit_transaction(tx).await?;

    tracing::info!(
        organization_id = %organization.id,
        user_id = %user.id,
        "Organization created"
    );
    Ok(created(organization))
}

pub async fn get_current_organization(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> AppResult<Json<Organization>> {
    let organization = OrganizationRepository::new()
        .find_by_id(&state.pool, ctx.organization_id)
        .await?;
    Ok(Json(organization))
}

pub async fn update_current_organization(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<UpdateOrganization>,
) -> AppResult<Json<Organization>> {
    ctx.require(permissions::ADMIN_MANAGE)?;
    payload.validate()?;

    let repo = OrganizationRepository::new();
    let mut organization = repo.find_by_id(&state.pool, ctx.organization_id).await?;
    organization.apply_update(payload);
    Ok(Json(repo.update(&state.pool, &organization).await?))
}

/// Installation-wide listing for system administrators.
pub async fn list_all_organizations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Organization>>> {
    Ok(Json(OrganizationRepository::new().find_all(&state.pool).await?))
}
