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
        benefit::{
            Benefit, BenefitPayload, EmployeeBenefit, EmployeeBenefitDetail, EnrollRequest,
            EnrollmentStatus,
        },
        rbac::permissions,
    },
    repositories::{BenefitRepository, EmployeeRepository, TenantRepository},
    state::AppState,
    types::{BenefitId, EmployeeBenefitId, EmployeeId},
    utils::time::today_local,
};

pub async fn list_benefits(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> AppResult<Json<Vec<Benefit>>> {
    Ok(Json(
        BenefitRepository::new()
            .find_all(&state.pool, ctx.organization_id)
            .await?,
    ))
}

pub async fn get_benefit(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<BenefitId>,
) -> AppResult<Json<Benefit>> {
    Ok(Json(
        BenefitRepository::new()
            .find_by_id(&state.pool, ctx.organization_id, id)
            .await?,
    ))
}

pub async fn create_benefit(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<BenefitPayload>,
) -> AppResult<Created<Benefit>> {
    ctx.require(permissions::BENEFITS_WRITE)?;
    payload.validate()?;
    let benefit = Benefit::new(ctx.organization_id, payload);
    Ok(created(
        BenefitRepository::new()
            .create(&state.pool, &benefit)
            .await?,
    ))
}

pub async fn update_benefit(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<BenefitId>,
    Json(payload): Json<BenefitPayload>,
) -> AppResult<Json<Benefit>> {
    ctx.require(permissions::BENEFITS_WRITE)?;
    payload.validate()?;
    let repo = BenefitRepository::new();
    let mut benefit = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    benefit.apply(payload);
    Ok(Json(repo.update(&state.pool, &benefit).await?))
}

pub async fn delete_benefit(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<BenefitId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::BENEFITS_WRITE)?;
    BenefitRepository::new()
        .delete(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn enroll(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(benefit_id): Path<BenefitId>,
    Json(payload): Json<EnrollRequest>,
) -> AppResult<Created<EmployeeBenefit>> {
    ctx.require(permissions::BENEFITS_WRITE)?;
    let repo = BenefitRepository::new();
    let benefit = repo
        .find_by_id(&state.pool, ctx.organization_id, benefit_id)
        .await?;
    if !benefit.is_active {
        return Err(AppError::BadRequest("Benefit is not active".into()));
    }
    if payload.end_date.is_some_and(|end| end < payload.start_date) {
        return Err(AppError::BadRequest(
            "end_date must be on or after start_date".into(),
        ));
    }
    EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, payload.employee_id)
        .await?;
    if repo
        .has_active_enrollment(&state.pool, payload.employee_id, benefit_id)
        .await?
    {
        return Err(AppError::Conflict(
            "Employee is already enrolled in this benefit".into(),
        ));
    }

    let enrollment = EmployeeBenefit::new(ctx.organization_id, benefit_id, payload);
    Ok(created(repo.enroll(&state.pool, &enrollment).await?))
}

pub async fn employee_benefits(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(employee_id): Path<EmployeeId>,
) -> AppResult<Json<Vec<EmployeeBenefitDetail>>> {
    require_self_or(&state.pool, &ctx, employee_id, permissions::EMPLOYEES_READ).await?;
    Ok(Json(
        BenefitRepository::new()
            .for_employee(&state.pool, ctx.organization_id, employee_id)
            .await?,
    ))
}

pub async fn end_enrollment(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EmployeeBenefitId>,
) -> AppResult<Json<EmployeeBenefit>> {
    ctx.require(permissions::BENEFITS_WRITE)?;
    let repo = BenefitRepository::new();
    let mut enrollment = repo
        .find_enrollment(&state.pool, ctx.organization_id, id)
        .await?;
    if enrollment.status == EnrollmentStatus::Ended {
        return Err(AppError::Conflict("Enrollment already ended".into()));
    }
    enrollment.end(today_local(&state.config.time_zone));
    Ok(Json(repo.update_enrollment(&state.pool, &enrollment).await?))
}
