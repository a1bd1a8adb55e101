use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};

use crate::{
    error::{AppError, AppResult},
    handlers::common::{created, parse_optional, require_read_self_or, require_self_or, Created},
    middleware::OrgContext,
    models::{
        employee::Employee,
        rbac::permissions,
        vacation::{
            accrued_days, business_days, CreateVacationRequest, ReviewVacationRequest, Vacation,
            VacationBalance, VacationListQuery, VacationStatus, VacationType,
        },
    },
    repositories::{EmployeeRepository, VacationRepository},
    state::AppState,
    types::{EmployeeId, VacationId},
    utils::time::today_local,
};

pub async fn create_vacation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateVacationRequest>,
) -> AppResult<Created<Vacation>> {
    require_self_or(
        &state.pool,
        &ctx,
        payload.employee_id,
        permissions::VACATIONS_WRITE,
    )
    .await?;

    if payload.end_date < payload.start_date {
        return Err(AppError::BadRequest(
            "end_date must be on or after start_date".into(),
        ));
    }
    let days = business_days(payload.start_date, payload.end_date);
    if days == 0 {
        return Err(AppError::BadRequest(
            "The requested range contains no business days".into(),
        ));
    }

    let repo = VacationRepository::new();
    if repo
        .has_overlap(
            &state.pool,
            ctx.organization_id,
            payload.employee_id,
            payload.start_date,
            payload.end_date,
            None,
        )
        .await?
    {
        return Err(AppError::Conflict(
            "The range overlaps another pending or approved request".into(),
        ));
    }

    let vacation = Vacation::new(ctx.organization_id, payload, days);
    let vacation = repo.create(&state.pool, &vacation).await?;
    tracing::info!(
        vacation_id = %vacation.id,
        employee_id = %vacation.employee_id,
        days = vacation.days,
        "Vacation requested"
    );
    Ok(created(vacation))
}

pub async fn list_vacations(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<VacationListQuery>,
) -> AppResult<Json<Vec<Vacation>>> {
    let employee_id: Option<EmployeeId> =
        parse_optional(query.employee_id.as_deref(), "employee_id")?;
    let status: Option<VacationStatus> = parse_optional(query.status.as_deref(), "status")?;
    require_read_self_or(&state.pool, &ctx, employee_id, permissions::VACATIONS_READ).await?;

    let vacations = VacationRepository::new()
        .list(&state.pool, ctx.organization_id, employee_id, status)
        .await?;
    Ok(Json(vacations))
}

pub async fn get_vacation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<VacationId>,
) -> AppResult<Json<Vacation>> {
    let vacation = VacationRepository::new()
        .find_by_id(&state.pool, ctx.organization_id, id)
        .await?;
    require_read_self_or(
        &state.pool,
        &ctx,
        Some(vacation.employee_id),
        permissions::VACATIONS_READ,
    )
    .await?;
    Ok(Json(vacation))
}

pub async fn approve_vacation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<VacationId>,
    payload: Option<Json<ReviewVacationRequest>>,
) -> AppResult<Json<Vacation>> {
    ctx.require(permissions::VACATIONS_APPROVE)?;
    let repo = VacationRepository::new();
    let mut vacation = pending_vacation(&state, &ctx, id).await?;

    if vacation.vacation_type == VacationType::Annual {
        let employee = EmployeeRepository::new()
            .fetch(&state.pool, ctx.organization_id, vacation.employee_id)
            .await?;
        let balance = balance_for(&state, &ctx, &employee).await?;
        if f64::from(vacation.days) > balance.available {
            return Err(AppError::BadRequest(format!(
                "Insufficient vacation balance: {} days requested, {} available",
                vacation.days, balance.available
            )));
        }
    }

    let comment = payload.and_then(|Json(p)| p.comment);
    vacation.review(VacationStatus::Approved, ctx.user.id, comment);
    let vacation = repo
        .update_status(&state.pool, &vacation, VacationStatus::Pending)
        .await?;
    tracing::info!(vacation_id = %vacation.id, "Vacation approved");
    Ok(Json(vacation))
}

pub async fn reject_vacation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<VacationId>,
    payload: Option<Json<ReviewVacationRequest>>,
) -> AppResult<Json<Vacation>> {
    ctx.require(permissions::VACATIONS_APPROVE)?;
    let mut vacation = pending_vacation(&state, &ctx, id).await?;

    let comment = payload.and_then(|Json(p)| p.comment);
    vacation.review(VacationStatus::Rejected, ctx.user.id, comment);
    let vacation = VacationRepository::new()
        .update_status(&state.pool, &vacation, VacationStatus::Pending)
        .await?;
    Ok(Json(vacation))
}

pub async fn cancel_vacation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<VacationId>,
) -> AppResult<Json<Vacation>> {
    let repo = VacationRepository::new();
    let mut vacation = repo
        .find_by_id(&state.pool, ctx.organization_id, id)
        .await?;
    require_self_or(
        &state.pool,
        &ctx,
        vacation.employee_id,
        permissions::VACATIONS_WRITE,
    )
    .await?;

    if !vacation.can_cancel(today_local(&state.config.time_zone)) {
        return Err(AppError::Conflict(format!(
            "A {} request cannot be cancelled",
            vacation.status
        )));
    }
    let previous = vacation.status;
    vacation.review(VacationStatus::Cancelled, ctx.user.id, None);
    let vacation = repo.update_status(&state.pool, &vacation, previous).await?;
    Ok(Json(vacation))
}

pub async fn vacation_balance(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(employee_id): Path<EmployeeId>,
) -> AppResult<Json<VacationBalance>> {
    let employee = require_self_or(
        &state.pool,
        &ctx,
        employee_id,
        permissions::VACATIONS_READ,
    )
    .await?;
    Ok(Json(balance_for(&state, &ctx, &employee).await?))
}

async fn pending_vacation(
    state: &AppState,
    ctx: &OrgContext,
    id: VacationId,
) -> AppResult<Vacation> {
    let vacation = VacationRepository::new()
        .find_by_id(&state.pool, ctx.organization_id, id)
        .await?;
    if vacation.status != VacationStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Only pending requests can be reviewed (current status: {})",
            vacation.status
        )));
    }
    Ok(vacation)
}

async fn balance_for(
    state: &AppState,
    ctx: &OrgContext,
    employee: &Employee,
) -> AppResult<VacationBalance> {
    let repo = VacationRepository::new();
    let accrued = accrued_days(
        employee.hire_date,
        today_local(&state.config.time_zone),
        state.config.vacation_days_per_year,
    );
    let taken = repo
        .sum_days(
            &state.pool,
            ctx.organization_id,
            employee.id,
            VacationType::Annual,
            VacationStatus::Approved,
        )
        .await?;
    let pending = repo
        .sum_days(
            &state.pool,
            ctx.organization_id,
            employee.id,
            VacationType::Annual,
            VacationStatus::Pending,
        )
        .await?;
    Ok(VacationBalance::new(employee.id, accrued, taken, pending))
}
