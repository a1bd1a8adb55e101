use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Datelike;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::common::{created, parse_optional, Created},
    middleware::OrgContext,
    models::{
        disciplinary::{
            case_number, CaseAction, CaseDetail, CaseListQuery, CaseNotification, CaseStatus,
            Charge, CloseCaseRequest, CreateCaseRequest, CreateChargeRequest,
            CreateDefenseRequest, CreateHearingRequest, CreateNotificationRequest,
            CreateSanctionRequest, CreateTerminationRequest, DefenseSubmission, DisciplinaryCase,
            Hearing, Sanction, Termination,
        },
        employee::EmployeeStatus,
        organization::trim_optional,
        rbac::permissions,
    },
    repositories::{
        begin_transaction, commit_transaction, DisciplinaryRepository, EmployeeRepository,
    },
    state::AppState,
    types::{DisciplinaryCaseId, EmployeeId},
    utils::time::today_local,
};

pub async fn create_case(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateCaseRequest>,
) -> AppResult<Created<DisciplinaryCase>> {
    ctx.require(permissions::DISCIPLINARY_WRITE)?;
    payload.validate()?;

    let repo = DisciplinaryRepository::new();
    let mut tx = begin_transaction(&state.pool).await?;
    EmployeeRepository::new()
        .fetch(&mut *tx, ctx.organization_id, payload.employee_id)
        .await?;
    let year = today_local(&state.config.time_zone).year();
    let sequence = repo
        .next_case_sequence(&mut tx, ctx.organization_id, year)
        .await?;
    let case = DisciplinaryCase::new(
        ctx.organization_id,
        ctx.user.id,
        case_number(year, sequence),
        payload,
    );
    let case = repo.insert(&mut tx, &case).await?;
    commit_transaction(tx).await?;

    tracing::info!(case_id = %case.id, case_number = %case.case_number, "Disciplinary case opened");
    Ok(created(case))
}

pub async fn list_cases(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<CaseListQuery>,
) -> AppResult<Json<Vec<DisciplinaryCase>>> {
    ctx.require(permissions::DISCIPLINARY_READ)?;
    let employee_id =
        parse_optional::<EmployeeId>(query.employee_id.as_deref(), "employee_id")?;
    let status = parse_optional::<CaseStatus>(query.status.as_deref(), "status")?;
    Ok(Json(
        DisciplinaryRepository::new()
            .list(&state.pool, ctx.organization_id, employee_id, status)
            .await?,
    ))
}

pub async fn get_case(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DisciplinaryCaseId>,
) -> AppResult<Json<CaseDetail>> {
    ctx.require(permissions::DISCIPLINARY_READ)?;
    Ok(Json(
        DisciplinaryRepository::new()
            .detail(&state.pool, ctx.organization_id, id)
            .await?,
    ))
}

pub async fn add_charge(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DisciplinaryCaseId>,
    Json(payload): Json<CreateChargeRequest>,
) -> AppResult<Created<Charge>> {
    ctx.require(permissions::DISCIPLINARY_WRITE)?;
    payload.validate()?;

    let repo = DisciplinaryRepository::new();
    let mut tx = begin_transaction(&state.pool).await?;
    let mut case = repo.find_for_update(&mut tx, ctx.organization_id, id).await?;
    case.advance(CaseAction::FileCharge).map_err(AppError::Conflict)?;
    let charge = repo.insert_charge(&mut tx, &Charge::new(case.id, payload)).await?;
    repo.update_status(&mut tx, &case).await?;
    commit_transaction(tx).await?;
    Ok(created(charge))
}

pub async fn add_notification(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DisciplinaryCaseId>,
    Json(payload): Json<CreateNotificationRequest>,
) -> AppResult<Created<CaseNotification>> {
    ctx.require(permissions::DISCIPLINARY_WRITE)?;
    payload.validate()?;

    let repo = DisciplinaryRepository::new();
    let mut tx = begin_transaction(&state.pool).await?;
    let mut case = repo.find_for_update(&mut tx, ctx.organization_id, id).await?;
    case.advance(CaseAction::Notify).map_err(AppError::Conflict)?;
    if repo.count_charges(&mut tx, case.id).await? == 0 {
        return Err(AppError::BadRequest(
            "At least one charge must be filed before notifying".into(),
        ));
    }
    let notification = repo
        .insert_notification(&mut tx, &CaseNotification::new(case.id, payload))
        .await?;
    repo.update_status(&mut tx, &case).await?;
    commit_transaction(tx).await?;
    Ok(created(notification))
}

pub async fn submit_defense(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DisciplinaryCaseId>,
    Json(payload): Json<CreateDefenseRequest>,
) -> AppResult<Created<DefenseSubmission>> {
    ctx.require(permissions::DISCIPLINARY_WRITE)?;
    payload.validate()?;

    let repo = DisciplinaryRepository::new();
    let mut tx = begin_transaction(&state.pool).await?;
    let mut case = repo.find_for_update(&mut tx, ctx.organization_id, id).await?;
    case.advance(CaseAction::SubmitDefense).map_err(AppError::Conflict)?;
    let defense = repo
        .insert_defense(&mut tx, &DefenseSubmission::new(case.id, payload))
        .await?;
    repo.update_status(&mut tx, &case).await?;
    commit_transaction(tx).await?;
    Ok(created(defense))
}

pub async fn schedule_hearing(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DisciplinaryCaseId>,
    Json(payload): Json<CreateHearingRequest>,
) -> AppResult<Created<Hearing>> {
    ctx.require(permissions::DISCIPLINARY_WRITE)?;
    payload.validate()?;

    let repo = DisciplinaryRepository::new();
    let mut tx = begin_transaction(&state.pool).await?;
    let mut case = repo.find_for_update(&mut tx, ctx.organization_id, id).await?;
    case.advance(CaseAction::ScheduleHearing).map_err(AppError::Conflict)?;
    let hearing = repo.insert_hearing(&mut tx, &Hearing::new(case.id, payload)).await?;
    repo.update_status(&mut tx, &case).await?;
    commit_transaction(tx).await?;
    Ok(created(hearing))
}

pub async fn impose_sanction(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DisciplinaryCaseId>,
    Json(payload): Json<CreateSanctionRequest>,
) -> AppResult<Created<Sanction>> {
    ctx.require(permissions::DISCIPLINARY_WRITE)?;
    payload.validate()?;

    let repo = DisciplinaryRepository::new();
    let mut tx = begin_transaction(&state.pool).await?;
    let mut case = repo.find_for_update(&mut tx, ctx.organization_id, id).await?;
    case.advance(CaseAction::Sanction).map_err(AppError::Conflict)?;
    let sanction = repo.insert_sanction(&mut tx, &Sanction::new(case.id, payload)).await?;
    repo.update_status(&mut tx, &case).await?;
    commit_transaction(tx).await?;
    Ok(created(sanction))
}

/// Records the dismissal and terminates the employee in the same transaction.
pub async fn terminate(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DisciplinaryCaseId>,
    Json(payload): Json<CreateTerminationRequest>,
) -> AppResult<Created<Termination>> {
    ctx.require(permissions::DISCIPLINARY_WRITE)?;
    payload.validate()?;

    let repo = DisciplinaryRepository::new();
    let mut tx = begin_transaction(&state.pool).await?;
    let mut case = repo.find_for_update(&mut tx, ctx.organization_id, id).await?;
    case.advance(CaseAction::Terminate).map_err(AppError::Conflict)?;
    let termination = repo
        .insert_termination(&mut tx, &Termination::new(case.id, payload))
        .await?;
    EmployeeRepository::new()
        .set_status(
            &mut *tx,
            ctx.organization_id,
            case.employee_id,
            EmployeeStatus::Terminated,
            Some(termination.termination_date),
        )
        .await?;
    repo.update_status(&mut tx, &case).await?;
    commit_transaction(tx).await?;

    tracing::info!(
        case_id = %case.id,
        employee_id = %case.employee_id,
        "Employee terminated through disciplinary process"
    );
    Ok(created(termination))
}

pub async fn close_case(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<DisciplinaryCaseId>,
    payload: Option<Json<CloseCaseRequest>>,
) -> AppResult<Json<DisciplinaryCase>> {
    ctx.require(permissions::DISCIPLINARY_WRITE)?;
    let Json(payload) = payload.unwrap_or_default();

    let repo = DisciplinaryRepository::new();
    let mut tx = begin_transaction(&state.pool).await?;
    let mut case = repo.find_for_update(&mut tx, ctx.organization_id, id).await?;
    case.advance(CaseAction::Close).map_err(AppError::Conflict)?;
    if let Some(resolution) = trim_optional(payload.resolution) {
        case.resolution = Some(resolution);
    }
    let case = repo.update_status(&mut tx, &case).await?;
    commit_transaction(tx).await?;
    Ok(Json(case))
}
