use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    handlers::common::{
        created, parse_optional, parse_required, require_read_self_or, require_self_or,
        validate_date_range, Created,
    },
    middleware::OrgContext,
    models::{
        attendance::{
            classify_arrival, Attendance, AttendanceListQuery, AttendanceStatus,
            AttendanceSummary, AttendanceSummaryQuery, CheckRequest, ManualAttendanceRequest,
            UpdateAttendanceRequest,
        },
        organization::trim_optional,
        rbac::permissions,
    },
    repositories::{AttendanceRepository, AttendanceRepositoryTrait, EmployeeRepository},
    services::attendance::{self as clock, ClockSettings},
    state::AppState,
    types::{AttendanceId, EmployeeId},
    utils::time::local_time,
};

/// Only callers holding `attendance:write` may clock at an explicit time;
/// self-service clocking always uses the server time.
fn clock_time(ctx: &OrgContext, at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match at {
        Some(at) if ctx.has(permissions::ATTENDANCE_WRITE) => at,
        _ => Utc::now(),
    }
}

pub async fn check_in(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CheckRequest>,
) -> AppResult<Created<Attendance>> {
    require_self_or(
        &state.pool,
        &ctx,
        payload.employee_id,
        permissions::ATTENDANCE_WRITE,
    )
    .await?;
    let record = clock::check_in(
        &AttendanceRepository::new(),
        &state.pool,
        ctx.organization_id,
        payload.employee_id,
        clock_time(&ctx, payload.at),
        &ClockSettings::from_config(&state.config),
    )
    .await?;
    Ok(created(record))
}

pub async fn check_out(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CheckRequest>,
) -> AppResult<Json<Attendance>> {
    require_self_or(
        &state.pool,
        &ctx,
        payload.employee_id,
        permissions::ATTENDANCE_WRITE,
    )
    .await?;
    let record = clock::check_out(
        &AttendanceRepository::new(),
        &state.pool,
        ctx.organization_id,
        payload.employee_id,
        clock_time(&ctx, payload.at),
        &ClockSettings::from_config(&state.config),
    )
    .await?;
    Ok(Json(record))
}

pub async fn list_attendance(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<AttendanceListQuery>,
) -> AppResult<Json<Vec<Attendance>>> {
    let employee_id: Option<EmployeeId> =
        parse_optional(query.employee_id.as_deref(), "employee_id")?;
    require_read_self_or(&state.pool, &ctx, employee_id, permissions::ATTENDANCE_READ).await?;
    validate_date_range(query.from, query.to)?;

    let records = AttendanceRepository::new()
        .list(&state.pool, ctx.organization_id, employee_id, query.from, query.to)
        .await?;
    Ok(Json(records))
}

/// Creates a record on behalf of an employee, e.g. an absence.
pub async fn create_attendance(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<ManualAttendanceRequest>,
) -> AppResult<Created<Attendance>> {
    ctx.require(permissions::ATTENDANCE_WRITE)?;
    EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, payload.employee_id)
        .await?;

    let settings = ClockSettings::from_config(&state.config);
    let mut record = Attendance::new(ctx.organization_id, payload.employee_id, payload.date);
    record.check_in = payload.check_in;
    record.check_out = payload.check_out;
    record.notes = trim_optional(payload.notes);
    record.status = match (payload.status, payload.check_in) {
        (Some(status), _) => status,
        (None, Some(at)) => classify_arrival(
            local_time(at, &settings.time_zone),
            settings.workday_start,
            settings.late_grace_minutes,
        ),
        (None, None) => {
            return Err(AppError::BadRequest(
                "Provide check-in time or a status".into(),
            ))
        }
    };
    finalize(&mut record, &settings)?;

    let record = AttendanceRepository::new()
        .create(&state.pool, &record)
        .await?;
    Ok(created(record))
}

pub async fn update_attendance(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<AttendanceId>,
    Json(payload): Json<UpdateAttendanceRequest>,
) -> AppResult<Json<Attendance>> {
    ctx.require(permissions::ATTENDANCE_WRITE)?;
    let repo = AttendanceRepository::new();
    let mut record = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;

    if payload.check_in.is_some() {
        record.check_in = payload.check_in;
    }
    if payload.check_out.is_some() {
        record.check_out = payload.check_out;
    }
    if let Some(status) = payload.status {
        record.status = status;
    }
    if payload.notes.is_some() {
        record.notes = trim_optional(payload.notes);
    }
    finalize(&mut record, &ClockSettings::from_config(&state.config))?;
    record.updated_at = Utc::now();

    Ok(Json(repo.update(&state.pool, &record).await?))
}

pub async fn delete_attendance(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<AttendanceId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::ATTENDANCE_WRITE)?;
    AttendanceRepository::new()
        .delete(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn attendance_summary(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<AttendanceSummaryQuery>,
) -> AppResult<Json<AttendanceSummary>> {
    let employee_id: EmployeeId = parse_required(&query.employee_id, "employee_id")?;
    require_read_self_or(
        &state.pool,
        &ctx,
        Some(employee_id),
        permissions::ATTENDANCE_READ,
    )
    .await?;
    validate_date_range(Some(query.from), Some(query.to))?;

    let records = AttendanceRepository::new()
        .list(
            &state.pool,
            ctx.organization_id,
            Some(employee_id),
            Some(query.from),
            Some(query.to),
        )
        .await?;

    let mut summary = AttendanceSummary::from_records(&records);
    summary.employee_id = Some(employee_id);
    summary.from = Some(query.from);
    summary.to = Some(query.to);
    Ok(Json(summary))
}

/// Absences carry no times; otherwise hours are derived from the clock times.
fn finalize(record: &mut Attendance, settings: &ClockSettings) -> AppResult<()> {
    if record.status == AttendanceStatus::Absent {
        record.check_in = None;
        record.check_out = None;
    }
    if let (Some(check_in), Some(check_out)) = (record.check_in, record.check_out) {
        if check_out < check_in {
            return Err(AppError::BadRequest(
                "Check-out time must be after check-in time".into(),
            ));
        }
    }
    if record.check_in.is_none() && record.check_out.is_some() {
        return Err(AppError::BadRequest(
            "Check-out requires a check-in time".into(),
        ));
    }
    record.calculate_work_hours(settings.standard_daily_hours);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrganizationId;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn settings() -> ClockSettings {
        ClockSettings {
            time_zone: chrono_tz::America::Bogota,
            workday_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            late_grace_minutes: 15,
            standard_daily_hours: 8.0,
        }
    }

    fn record() -> Attendance {
        Attendance::new(
            OrganizationId::new(),
            EmployeeId::new(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        )
    }

    #[test]
    fn finalize_computes_hours() {
        let mut r = record();
        r.check_in = Some(Utc.with_ymd_and_hms(2024, 3, 4, 13, 0, 0).unwrap());
        r.check_out = Some(Utc.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap());
        finalize(&mut r, &settings()).unwrap();
        assert_eq!(r.hours_worked, Some(10.5));
        assert_eq!(r.overtime_hours, 2.5);
    }

    #[test]
    fn finalize_clears_times_for_absence() {
        let mut r = record();
        r.status = AttendanceStatus::Absent;
        r.check_in = Some(Utc.with_ymd_and_hms(2024, 3, 4, 13, 0, 0).unwrap());
        finalize(&mut r, &settings()).unwrap();
        assert_eq!(r.check_in, None);
        assert_eq!(r.hours_worked, None);
    }

    #[test]
    fn finalize_rejects_inverted_times() {
        let mut r = record();
        r.check_in = Some(Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap());
        r.check_out = Some(Utc.with_ymd_and_hms(2024, 3, 4, 13, 0, 0).unwrap());
        assert!(matches!(finalize(&mut r, &settings()), Err(AppError::BadRequest(_))));
    }
}
