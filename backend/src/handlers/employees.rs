use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::{
        common::{created, parse_optional, require_self_or, Created},
        positions::ensure_department,
    },
    middleware::OrgContext,
    models::{
        employee::{CreateEmployee, Employee, EmployeeFilters, EmployeeListQuery, UpdateEmployee},
        interview::{CreateInterview, Interview, UpdateInterview},
        observation::{CreateObservation, Observation},
        rbac::permissions,
        PaginatedResponse, PaginationQuery,
    },
    repositories::{
        EmployeeRepository, InterviewRepository, ObservationRepository, PositionRepository,
        TenantRepository,
    },
    state::AppState,
    types::{EmployeeId, InterviewId, PositionId},
    utils::time::today_local,
};

pub async fn list_employees(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<EmployeeListQuery>,
) -> AppResult<Json<PaginatedResponse<Employee>>> {
    ctx.require(permissions::EMPLOYEES_READ)?;
    let filters = parse_filters(&query)?;
    let paging = PaginationQuery {
        page: query.page,
        per_page: query.per_page,
    };

    let (items, total) = EmployeeRepository::new()
        .search(
            &state.pool,
            ctx.organization_id,
            &filters,
            paging.per_page(),
            paging.offset(),
        )
        .await?;
    Ok(Json(PaginatedResponse::new(
        items,
        total,
        paging.page(),
        paging.per_page(),
    )))
}

pub async fn create_employee(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateEmployee>,
) -> AppResult<Created<Employee>> {
    ctx.require(permissions::EMPLOYEES_WRITE)?;
    payload.validate()?;
    ensure_department(&state, &ctx, payload.department_id).await?;
    ensure_position(&state, &ctx, payload.position_id).await?;

    let employee = Employee::new(ctx.organization_id, payload);
    let employee = EmployeeRepository::new()
        .create(&state.pool, &employee)
        .await?;
    tracing::info!(
        organization_id = %ctx.organization_id,
        employee_id = %employee.id,
        "Employee created"
    );
    Ok(created(employee))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EmployeeId>,
) -> AppResult<Json<Employee>> {
    let employee = require_self_or(&state.pool, &ctx, id, permissions::EMPLOYEES_READ).await?;
    Ok(Json(employee))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EmployeeId>,
    Json(payload): Json<UpdateEmployee>,
) -> AppResult<Json<Employee>> {
    ctx.require(permissions::EMPLOYEES_WRITE)?;
    payload.validate()?;
    ensure_department(&state, &ctx, payload.department_id).await?;
    ensure_position(&state, &ctx, payload.position_id).await?;

    let repo = EmployeeRepository::new();
    let mut employee = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    employee.apply_update(payload);
    Ok(Json(repo.update(&state.pool, &employee).await?))
}

/// Soft delete: the record stays for payroll and audit history.
pub async fn terminate_employee(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EmployeeId>,
) -> AppResult<Json<Employee>> {
    ctx.require(permissions::EMPLOYEES_WRITE)?;
    let repo = EmployeeRepository::new();
    let mut employee = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    employee.terminate(today_local(&state.config.time_zone));
    let employee = repo.update(&state.pool, &employee).await?;
    tracing::info!(employee_id = %employee.id, "Employee terminated");
    Ok(Json(employee))
}

pub async fn list_observations(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EmployeeId>,
) -> AppResult<Json<Vec<Observation>>> {
    ctx.require(permissions::EMPLOYEES_READ)?;
    EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, id)
        .await?;
    let observations = ObservationRepository::new()
        .list_for_employee(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(Json(observations))
}

pub async fn create_observation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EmployeeId>,
    Json(payload): Json<CreateObservation>,
) -> AppResult<Created<Observation>> {
    ctx.require(permissions::EMPLOYEES_WRITE)?;
    payload.validate()?;
    EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, id)
        .await?;

    let observation = Observation::new(ctx.organization_id, id, ctx.user.id, payload);
    Ok(created(
        ObservationRepository::new()
            .create(&state.pool, &observation)
            .await?,
    ))
}

pub async fn list_interviews(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EmployeeId>,
) -> AppResult<Json<Vec<Interview>>> {
    ctx.require(permissions::EMPLOYEES_READ)?;
    EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, id)
        .await?;
    let interviews = InterviewRepository::new()
        .list_for_employee(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(Json(interviews))
}

pub async fn create_interview(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<EmployeeId>,
    Json(payload): Json<CreateInterview>,
) -> AppResult<Created<Interview>> {
    ctx.require(permissions::EMPLOYEES_WRITE)?;
    payload.validate()?;
    EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, id)
        .await?;

    let interview = Interview::new(ctx.organization_id, id, ctx.user.id, payload);
    Ok(created(
        InterviewRepository::new()
            .create(&state.pool, &interview)
            .await?,
    ))
}

pub async fn update_interview(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<InterviewId>,
    Json(payload): Json<UpdateInterview>,
) -> AppResult<Json<Interview>> {
    ctx.require(permissions::EMPLOYEES_WRITE)?;
    let repo = InterviewRepository::new();
    let mut interview = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    interview.apply_update(payload);
    Ok(Json(repo.update(&state.pool, &interview).await?))
}

fn parse_filters(query: &EmployeeListQuery) -> AppResult<EmployeeFilters> {
    Ok(EmployeeFilters {
        department_id: parse_optional(query.department_id.as_deref(), "department_id")?,
        position_id: parse_optional(query.position_id.as_deref(), "position_id")?,
        status: parse_optional(query.status.as_deref(), "status")?,
        search: query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

async fn ensure_position(
    state: &AppState,
    ctx: &OrgContext,
    position: Option<PositionId>,
) -> AppResult<()> {
    let Some(id) = position else {
        return Ok(());
    };
    if PositionRepository::new()
        .exists(&state.pool, ctx.organization_id, id)
        .await?
    {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Position must belong to this organization".into(),
        ))
    }
}
