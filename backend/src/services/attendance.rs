//! Check-in and check-out over the attendance repository trait.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use sqlx::PgPool;

use crate::{
    config::Config,
    error::AppError,
    models::attendance::{classify_arrival, Attendance},
    repositories::attendance::AttendanceRepositoryTrait,
    types::{EmployeeId, OrganizationId},
    utils::time::{local_date, local_time},
};

/// Settings that decide the local day, lateness and overtime.
#[derive(Debug, Clone, Copy)]
pub struct ClockSettings {
    pub time_zone: Tz,
    pub workday_start: NaiveTime,
    pub late_grace_minutes: i64,
    pub standard_daily_hours: f64,
}

impl ClockSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            time_zone: config.time_zone,
            workday_start: config.workday_start,
            late_grace_minutes: config.late_grace_minutes,
            standard_daily_hours: config.payroll.standard_daily_hours,
        }
    }
}

pub async fn check_in(
    repo: &dyn AttendanceRepositoryTrait,
    db: &PgPool,
    org: OrganizationId,
    employee_id: EmployeeId,
    at: DateTime<Utc>,
    settings: &ClockSettings,
) -> Result<Attendance, AppError> {
    let date = local_date(at, &settings.time_zone);
    if repo
        .find_by_employee_and_date(db, org, employee_id, date)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Already checked in today".into()));
    }

    let mut record = Attendance::new(org, employee_id, date);
    record.check_in = Some(at);
    record.status = classify_arrival(
        local_time(at, &settings.time_zone),
        settings.workday_start,
        settings.late_grace_minutes,
    );
    let created = repo.create(db, &record).await?;
    tracing::info!(
        employee_id = %employee_id,
        date = %date,
        status = %created.status,
        "Employee checked in"
    );
    Ok(created)
}

pub async fn check_out(
    repo: &dyn AttendanceRepositoryTrait,
    db: &PgPool,
    org: OrganizationId,
    employee_id: EmployeeId,
    at: DateTime<Utc>,
    settings: &ClockSettings,
) -> Result<Attendance, AppError> {
    let date = local_date(at, &settings.time_zone);
    let mut record = repo
        .find_by_employee_and_date(db, org, employee_id, date)
        .await?
        .filter(|r| r.check_in.is_some())
        .ok_or_else(|| AppError::NotFound("No check-in found for today".into()))?;

    if record.is_checked_out() {
        return Err(AppError::Conflict("Already checked out today".into()));
    }
    if record.check_in.is_some_and(|check_in| at < check_in) {
        return Err(AppError::BadRequest(
            "Check-out time must be after check-in time".into(),
        ));
    }

    record.check_out = Some(at);
    record.calculate_work_hours(settings.standard_daily_hours);
    record.updated_at = Utc::now();
    let updated = repo.update(db, &record).await?;
    tracing::info!(
        employee_id = %employee_id,
        date = %date,
        hours_worked = ?updated.hours_worked,
        "Employee checked out"
    );
    Ok(updated)
}
