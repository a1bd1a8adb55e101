use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use std::collections::HashSet;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::common::{created, Created},
    middleware::OrgContext,
    models::{
        competency::{PositionCompetency, SetRequirementsRequest},
        position::{Position, PositionPayload},
        rbac::permissions,
    },
    repositories::{
        begin_transaction, commit_transaction, CompetencyRepository, DepartmentRepository,
        PositionRepository, TenantRepository,
    },
    state::AppState,
    types::{CompetencyId, DepartmentId, PositionId},
};

pub async fn list_positions(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> AppResult<Json<Vec<Position>>> {
    let positions = PositionRepository::new()
        .find_all(&state.pool, ctx.organization_id)
        .await?;
    Ok(Json(positions))
}

pub async fn get_position(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PositionId>,
) -> AppResult<Json<Position>> {
    let position = PositionRepository::new()
        .find_by_id(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(Json(position))
}

pub async fn create_position(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<PositionPayload>,
) -> AppResult<Created<Position>> {
    ctx.require(permissions::POSITIONS_WRITE)?;
    payload.validate()?;
    ensure_department(&state, &ctx, payload.department_id).await?;

    let position = Position::new(ctx.organization_id, payload);
    Ok(created(
        PositionRepository::new()
            .create(&state.pool, &position)
            .await?,
    ))
}

pub async fn update_position(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PositionId>,
    Json(payload): Json<PositionPayload>,
) -> AppResult<Json<Position>> {
    ctx.require(permissions::POSITIONS_WRITE)?;
    payload.validate()?;
    ensure_department(&state, &ctx, payload.department_id).await?;

    let repo = PositionRepository::new();
    let mut position = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    position.apply(payload);
    Ok(Json(repo.update(&state.pool, &position).await?))
}

pub async fn delete_position(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PositionId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::POSITIONS_WRITE)?;
    PositionRepository::new()
        .delete(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_requirements(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PositionId>,
) -> AppResult<Json<Vec<PositionCompetency>>> {
    let repo = PositionRepository::new();
    repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    Ok(Json(repo.requirements(&state.pool, id).await?))
}

/// Replaces the competency requirements of a position.
pub async fn set_requirements(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PositionId>,
    Json(payload): Json<SetRequirementsRequest>,
) -> AppResult<Json<Vec<PositionCompetency>>> {
    ctx.require(permissions::POSITIONS_WRITE)?;
    payload.validate()?;

    let repo = PositionRepository::new();
    repo.find_by_id(&state.pool, ctx.organization_id, id).await?;

    let ids: Vec<CompetencyId> = payload
        .requirements
        .iter()
        .map(|r| r.competency_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let owned = CompetencyRepository::new()
        .count_owned(&state.pool, ctx.organization_id, &ids)
        .await?;
    if owned != ids.len() as i64 {
        return Err(AppError::BadRequest(
            "Every competency must belong to this organization".into(),
        ));
    }

    let mut tx = begin_transaction(&state.pool).await?;
    repo.replace_requirements(&mut tx, id, &payload.requirements)
        .await?;
    commit_transaction(tx).await?;

    Ok(Json(repo.requirements(&state.pool, id).await?))
}

pub(crate) async fn ensure_department(
    state: &AppState,
    ctx: &OrgContext,
    department: Option<DepartmentId>,
) -> AppResult<()> {
    let Some(id) = department else {
        return Ok(());
    };
    if DepartmentRepository::new()
        .exists(&state.pool, ctx.organization_id, id)
        .await?
    {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Department must belong to this organization".into(),
        ))
    }
}
