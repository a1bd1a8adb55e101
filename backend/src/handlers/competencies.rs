use std::collections::HashSet;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::common::{created, require_self_or, Created},
    middleware::OrgContext,
    models::{
        competency::{
            compute_gaps, AssessCompetenciesRequest, Competency, CompetencyPayload,
            EmployeeCompetency, GapAnalysis,
        },
        rbac::permissions,
    },
    repositories::{
        begin_transaction, commit_transaction, CompetencyRepository, EmployeeRepository,
        PositionRepository, TenantRepository,
    },
    state::AppState,
    types::{CompetencyId, EmployeeId},
};

pub async fn list_competencies(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> AppResult<Json<Vec<Competency>>> {
    let competencies = CompetencyRepository::new()
        .find_all(&state.pool, ctx.organization_id)
        .await?;
    Ok(Json(competencies))
}

pub async fn get_competency(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<CompetencyId>,
) -> AppResult<Json<Competency>> {
    Ok(Json(
        CompetencyRepository::new()
            .find_by_id(&state.pool, ctx.organization_id, id)
            .await?,
    ))
}

pub async fn create_competency(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CompetencyPayload>,
) -> AppResult<Created<Competency>> {
    ctx.require(permissions::COMPETENCIES_WRITE)?;
    payload.validate()?;
    let competency = Competency::new(ctx.organization_id, payload);
    Ok(created(
        CompetencyRepository::new()
            .create(&state.pool, &competency)
            .await?,
    ))
}

pub async fn update_competency(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<CompetencyId>,
    Json(payload): Json<CompetencyPayload>,
) -> AppResult<Json<Competency>> {
    ctx.require(permissions::COMPETENCIES_WRITE)?;
    payload.validate()?;
    let repo = CompetencyRepository::new();
    let mut competency = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    competency.apply(payload);
    Ok(Json(repo.update(&state.pool, &competency).await?))
}

pub async fn delete_competency(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<CompetencyId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::COMPETENCIES_WRITE)?;
    CompetencyRepository::new()
        .delete(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn employee_competencies(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(employee_id): Path<EmployeeId>,
) -> AppResult<Json<Vec<EmployeeCompetency>>> {
    require_self_or(&state.pool, &ctx, employee_id, permissions::EMPLOYEES_READ).await?;
    Ok(Json(
        CompetencyRepository::new()
            .for_employee(&state.pool, employee_id)
            .await?,
    ))
}

/// Upserts assessed levels; competencies not listed keep their level.
pub async fn assess_competencies(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(employee_id): Path<EmployeeId>,
    Json(payload): Json<AssessCompetenciesRequest>,
) -> AppResult<Json<Vec<EmployeeCompetency>>> {
    ctx.require(permissions::COMPETENCIES_WRITE)?;
    payload.validate()?;
    EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, employee_id)
        .await?;

    let repo = CompetencyRepository::new();
    let ids: Vec<CompetencyId> = payload
        .assessments
        .iter()
        .map(|a| a.competency_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if repo
        .count_owned(&state.pool, ctx.organization_id, &ids)
        .await?
        != ids.len() as i64
    {
        return Err(AppError::BadRequest(
            "Every competency must belong to this organization".into(),
        ));
    }

    let mut tx = begin_transaction(&state.pool).await?;
    repo.upsert_assessments(&mut tx, employee_id, ctx.user.id, &payload.assessments)
        .await?;
    commit_transaction(tx).await?;

    Ok(Json(repo.for_employee(&state.pool, employee_id).await?))
}

pub async fn competency_gap(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(employee_id): Path<EmployeeId>,
) -> AppResult<Json<GapAnalysis>> {
    let employee =
        require_self_or(&state.pool, &ctx, employee_id, permissions::EMPLOYEES_READ).await?;

    let requirements = match employee.position_id {
        Some(position_id) => {
            PositionRepository::new()
                .requirements(&state.pool, position_id)
                .await?
        }
        None => Vec::new(),
    };
    let assessed = CompetencyRepository::new()
        .for_employee(&state.pool, employee_id)
        .await?;

    Ok(Json(GapAnalysis {
        employee_id,
        position_id: employee.position_id,
        gaps: compute_gaps(&requirements, &assessed),
    }))
}
