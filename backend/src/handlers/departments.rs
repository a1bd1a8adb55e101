use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::common::{created, Created},
    middleware::OrgContext,
    models::{
        department::{Department, DepartmentPayload, DepartmentSummary},
        rbac::permissions,
    },
    repositories::{DepartmentRepository, EmployeeRepository, TenantRepository},
    state::AppState,
    types::{DepartmentId, EmployeeId},
};

pub async fn list_departments(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> AppResult<Json<Vec<DepartmentSummary>>> {
    let departments = DepartmentRepository::new()
        .find_all_with_counts(&state.pool, ctx.organization_id)
        .await?;
    Ok(Json(departments))
}

pub async fn get_department(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DepartmentId>,
) -> AppResult<Json<Department>> {
    let department = DepartmentRepository::new()
        .find_by_id(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(Json(department))
}

pub async fn create_department(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<DepartmentPayload>,
) -> AppResult<Created<Department>> {
    ctx.require(permissions::DEPARTMENTS_WRITE)?;
    payload.validate()?;
    ensure_manager(&state, &ctx, payload.manager_employee_id).await?;

    let department = Department::new(ctx.organization_id, payload);
    let department = DepartmentRepository::new()
        .create(&state.pool, &department)
        .await?;
    Ok(created(department))
}

pub async fn update_department(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DepartmentId>,
    Json(payload): Json<DepartmentPayload>,
) -> AppResult<Json<Department>> {
    ctx.require(permissions::DEPARTMENTS_WRITE)?;
    payload.validate()?;
    ensure_manager(&state, &ctx, payload.manager_employee_id).await?;

    let repo = DepartmentRepository::new();
    let mut department = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    department.apply(payload);
    Ok(Json(repo.update(&state.pool, &department).await?))
}

pub async fn delete_department(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DepartmentId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::DEPARTMENTS_WRITE)?;
    let repo = DepartmentRepository::new();
    repo.find_by_id(&state.pool, ctx.organization_id, id).await?;

    if repo.count_employees(&state.pool, ctx.organization_id, id).await? > 0 {
        return Err(AppError::Conflict(
            "Department still has employees assigned".into(),
        ));
    }
    repo.delete(&state.pool, ctx.organization_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_manager(
    state: &AppState,
    ctx: &OrgContext,
    manager: Option<EmployeeId>,
) -> AppResult<()> {
    let Some(manager) = manager else {
        return Ok(());
    };
    if EmployeeRepository::new()
        .exists(&state.pool, ctx.organization_id, manager)
        .await?
    {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Manager must be an employee of this organization".into(),
        ))
    }
}
