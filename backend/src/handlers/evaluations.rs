use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::common::{
        created, parse_optional, require_read_self_or, validate_date_range, Created,
    },
    middleware::OrgContext,
    models::{
        evaluation::{
            weighted_score, CreateEvaluationRequest, Evaluation, EvaluationCriteria,
            EvaluationDetail, EvaluationListQuery, EvaluationStatus, UpdateEvaluationRequest,
        },
        organization::trim_optional,
        rbac::permissions,
    },
    repositories::{begin_transaction, commit_transaction, EmployeeRepository, EvaluationRepository},
    state::AppState,
    types::{EmployeeId, EvaluationId},
};

pub async fn create_evaluation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateEvaluationRequest>,
) -> AppResult<Created<EvaluationDetail>> {
    ctx.require(permissions::EVALUATIONS_WRITE)?;
    payload.validate()?;
    validate_date_range(Some(payload.period_start), Some(payload.period_end))?;
    EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, payload.employee_id)
        .await?;

    let repo = EvaluationRepository::new();
    let evaluation = Evaluation::new(ctx.organization_id, ctx.user.id, &payload);
    let criteria: Vec<EvaluationCriteria> = payload
        .criteria
        .into_iter()
        .map(|input| EvaluationCriteria::new(evaluation.id, input))
        .collect();

    let mut tx = begin_transaction(&state.pool).await?;
    let evaluation = repo.insert(&mut tx, &evaluation).await?;
    repo.replace_criteria(&mut tx, evaluation.id, &criteria)
        .await?;
    commit_transaction(tx).await?;

    Ok(created(EvaluationDetail {
        evaluation,
        criteria,
    }))
}

pub async fn list_evaluations(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<EvaluationListQuery>,
) -> AppResult<Json<Vec<Evaluation>>> {
    let employee_id: Option<EmployeeId> =
        parse_optional(query.employee_id.as_deref(), "employee_id")?;
    let status: Option<EvaluationStatus> = parse_optional(query.status.as_deref(), "status")?;
    require_read_self_or(&state.pool, &ctx, employee_id, permissions::EVALUATIONS_READ).await?;

    let evaluations = EvaluationRepository::new()
        .list(&state.pool, ctx.organization_id, employee_id, status)
        .await?;
    Ok(Json(evaluations))
}

pub async fn get_evaluation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EvaluationId>,
) -> AppResult<Json<EvaluationDetail>> {
    let repo = EvaluationRepository::new();
    let evaluation = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    require_read_self_or(
        &state.pool,
        &ctx,
        Some(evaluation.employee_id),
        permissions::EVALUATIONS_READ,
    )
    .await?;
    let criteria = repo.criteria(&state.pool, id).await?;
    Ok(Json(EvaluationDetail {
        evaluation,
        criteria,
    }))
}

pub async fn update_evaluation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EvaluationId>,
    Json(payload): Json<UpdateEvaluationRequest>,
) -> AppResult<Json<EvaluationDetail>> {
    ctx.require(permissions::EVALUATIONS_WRITE)?;
    payload.validate()?;

    let repo = EvaluationRepository::new();
    let mut evaluation = editable(&state, &ctx, id).await?;
    if let Some(start) = payload.period_start {
        evaluation.period_start = start;
    }
    if let Some(end) = payload.period_end {
        evaluation.period_end = end;
    }
    validate_date_range(Some(evaluation.period_start), Some(evaluation.period_end))?;
    if payload.comments.is_some() {
        evaluation.comments = trim_optional(payload.comments);
    }
    evaluation.updated_at = Utc::now();

    let mut tx = begin_transaction(&state.pool).await?;
    let evaluation = repo.update(&mut tx, &evaluation).await?;
    let criteria = match payload.criteria {
        Some(inputs) => {
            let criteria: Vec<EvaluationCriteria> = inputs
                .into_iter()
                .map(|input| EvaluationCriteria::new(evaluation.id, input))
                .collect();
            repo.replace_criteria(&mut tx, evaluation.id, &criteria)
                .await?;
            Some(criteria)
        }
        None => None,
    };
    commit_transaction(tx).await?;

    let criteria = match criteria {
        Some(criteria) => criteria,
        None => repo.criteria(&state.pool, evaluation.id).await?,
    };
    Ok(Json(EvaluationDetail {
        evaluation,
        criteria,
    }))
}

pub async fn delete_evaluation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EvaluationId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::EVALUATIONS_WRITE)?;
    editable(&state, &ctx, id).await?;
    EvaluationRepository::new()
        .delete(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Computes the weighted overall score and freezes the evaluation.
pub async fn submit_evaluation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EvaluationId>,
) -> AppResult<Json<EvaluationDetail>> {
    ctx.require(permissions::EVALUATIONS_WRITE)?;
    let repo = EvaluationRepository::new();
    let mut evaluation = editable(&state, &ctx, id).await?;
    let criteria = repo.criteria(&state.pool, id).await?;

    let overall = weighted_score(&criteria).ok_or_else(|| {
        AppError::BadRequest("Every criterion must be scored before submitting".into())
    })?;
    let now = Utc::now();
    evaluation.overall_score = Some(overall);
    evaluation.status = EvaluationStatus::Submitted;
    evaluation.submitted_at = Some(now);
    evaluation.updated_at = now;

    let mut tx = begin_transaction(&state.pool).await?;
    let evaluation = repo.update(&mut tx, &evaluation).await?;
    commit_transaction(tx).await?;
    Ok(Json(EvaluationDetail {
        evaluation,
        criteria,
    }))
}

pub async fn complete_evaluation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EvaluationId>,
) -> AppResult<Json<Evaluation>> {
    ctx.require(permissions::EVALUATIONS_WRITE)?;
    let repo = EvaluationRepository::new();
    let mut evaluation = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    if evaluation.status != EvaluationStatus::Submitted {
        return Err(AppError::Conflict(format!(
            "Only submitted evaluations can be completed (current status: {})",
            evaluation.status
        )));
    }
    let now = Utc::now();
    evaluation.status = EvaluationStatus::Completed;
    evaluation.completed_at = Some(now);
    evaluation.updated_at = now;

    let mut tx = begin_transaction(&state.pool).await?;
    let evaluation = repo.update(&mut tx, &evaluation).await?;
    commit_transaction(tx).await?;
    Ok(Json(evaluation))
}

async fn editable(state: &AppState, ctx: &OrgContext, id: EvaluationId) -> AppResult<Evaluation> {
    let evaluation = EvaluationRepository::new()
        .find_by_id(&state.pool, ctx.organization_id, id)
        .await?;
    if !evaluation.is_editable() {
        return Err(AppError::Conflict(format!(
            "Evaluation is {} and can no longer change",
            evaluation.status
        )));
    }
    Ok(evaluation)
}
