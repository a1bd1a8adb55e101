//! Helpers shared by the HTTP handlers.

use std::str::FromStr;

use axum::{http::StatusCode, Json};
use chrono::NaiveDate;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::OrgContext,
    models::employee::Employee,
    repositories::EmployeeRepository,
    types::EmployeeId,
};

pub type Created<T> = (StatusCode, Json<T>);

pub fn created<T>(value: T) -> Created<T> {
    (StatusCode::CREATED, Json(value))
}

/// Parses an optional query-string value; blank values count as absent.
pub fn parse_optional<T>(raw: Option<&str>, field: &str) -> AppResult<Option<T>>
where
    T: FromStr,
{
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("`{}` has an invalid value", field))),
        None => Ok(None),
    }
}

pub fn parse_required<T>(raw: &str, field: &str) -> AppResult<T>
where
    T: FromStr,
{
    parse_optional(Some(raw), field)?
        .ok_or_else(|| AppError::BadRequest(format!("`{}` is required", field)))
}

pub fn validate_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> AppResult<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(AppError::BadRequest(
            "`from` must be on or before `to`".into(),
        )),
        _ => Ok(()),
    }
}

pub fn validate_payload<T: Validate>(payload: &T) -> AppResult<()> {
    payload.validate().map_err(AppError::from)
}

/// Loads the employee and lets the call through when it is the caller's own
/// record; otherwise the permission is required.
pub async fn require_self_or(
    pool: &PgPool,
    ctx: &OrgContext,
    employee_id: EmployeeId,
    permission: &str,
) -> AppResult<Employee> {
    let employee = EmployeeRepository::new()
        .fetch(pool, ctx.organization_id, employee_id)
        .await?;
    if !employee.is_linked_to(ctx.user.id) {
        ctx.require(permission)?;
    }
    Ok(employee)
}

/// Permission check for reads of employee-scoped data: the linked employee
/// may read their own records without the permission.
pub async fn require_read_self_or(
    pool: &PgPool,
    ctx: &OrgContext,
    employee_id: Option<EmployeeId>,
    permission: &str,
) -> AppResult<()> {
    if ctx.has(permission) {
        return Ok(());
    }
    match employee_id {
        Some(employee_id) => require_self_or(pool, ctx, employee_id, permission)
            .await
            .map(|_| ()),
        None => ctx.require(permission),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::EmployeeStatus;

    #[test]
    fn parse_optional_treats_blank_as_absent() {
        assert_eq!(parse_optional::<EmployeeStatus>(Some("  "), "status").unwrap(), None);
        assert_eq!(
            parse_optional::<EmployeeStatus>(Some("on_leave"), "status").unwrap(),
            Some(EmployeeStatus::OnLeave)
        );
        assert!(matches!(
            parse_optional::<EmployeeId>(Some("nope"), "employee_id"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn parse_required_rejects_blank() {
        assert!(parse_required::<EmployeeId>("", "employee_id").is_err());
        let id = EmployeeId::new();
        assert_eq!(parse_required::<EmployeeId>(&id.to_string(), "employee_id").unwrap(), id);
    }

    #[test]
    fn date_range_must_be_ordered() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1);
        let b = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert!(validate_date_range(a, b).is_ok());
        assert!(validate_date_range(b, a).is_err());
        assert!(validate_date_range(None, a).is_ok());
    }
}
