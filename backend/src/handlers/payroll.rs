use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    handlers::common::{created, parse_optional, validate_date_range, Created},
    middleware::OrgContext,
    models::{
        employee::Employee,
        payroll::{
            GeneratePayrollRequest, GeneratePayrollResponse, Payroll, PayrollExportQuery,
            PayrollListQuery, PayrollStatus, SkippedPayroll,
        },
        rbac::permissions,
    },
    repositories::{
        begin_transaction, commit_transaction, payroll::PayrollExportRow, AttendanceRepository,
        EmployeeRepository, PayrollFilters, PayrollRepository,
    },
    services::payroll::{build_draft, period_days, Adjustments},
    state::AppState,
    types::PayrollId,
    utils::csv::write_csv,
};

const EXPORT_HEADER: &[&str] = &[
    "employee_number",
    "employee_name",
    "document_number",
    "period_start",
    "period_end",
    "worked_days",
    "overtime_hours",
    "base_pay",
    "overtime_pay",
    "transport_allowance",
    "bonuses",
    "gross_pay",
    "total_deductions",
    "net_pay",
    "status",
];

/// Generates draft payrolls for one employee or every active employee.
pub async fn generate_payroll(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<GeneratePayrollRequest>,
) -> AppResult<Created<GeneratePayrollResponse>> {
    ctx.require(permissions::PAYROLL_WRITE)?;
    period_days(payload.period_start, payload.period_end)?;
    let adjustments = Adjustments::new(payload.bonuses, payload.other_deductions)?;

    let employees = EmployeeRepository::new();
    let attendance = AttendanceRepository::new();
    let payrolls = PayrollRepository::new();
    let settings = &state.config.payroll;

    let mut tx = begin_transaction(&state.pool).await?;
    let targets: Vec<Employee> = match payload.employee_id {
        Some(employee_id) => {
            let employee = employees
                .fetch(&mut *tx, ctx.organization_id, employee_id)
                .await?;
            if !employee.is_active() {
                return Err(AppError::BadRequest(format!(
                    "Employee is {} and cannot be paid",
                    employee.status
                )));
            }
            vec![employee]
        }
        None => employees.find_active(&mut *tx, ctx.organization_id).await?,
    };
    let single = payload.employee_id.is_some();

    let mut response = GeneratePayrollResponse {
        generated: Vec::with_capacity(targets.len()),
        skipped: Vec::new(),
    };
    for employee in &targets {
        if payrolls
            .exists_for_period(
                &mut tx,
                ctx.organization_id,
                employee.id,
                payload.period_start,
                payload.period_end,
            )
            .await?
        {
            if single {
                return Err(AppError::Conflict(
                    "A payroll already exists for this employee and period".into(),
                ));
            }
            response.skipped.push(SkippedPayroll {
                employee_id: employee.id,
                reason: "A payroll already exists for this period".into(),
            });
            continue;
        }

        let records = attendance
            .find_for_period(
                &mut *tx,
                ctx.organization_id,
                employee.id,
                payload.period_start,
                payload.period_end,
            )
            .await?;
        let draft = match build_draft(
            employee,
            payload.period_start,
            payload.period_end,
            &records,
            adjustments,
            settings,
        ) {
            Ok(draft) => draft,
            Err(err) if !single => {
                response.skipped.push(SkippedPayroll {
                    employee_id: employee.id,
                    reason: err.to_string(),
                });
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        response.generated.push(payrolls.insert(&mut tx, &draft).await?);
    }
    commit_transaction(tx).await?;

    tracing::info!(
        organization_id = %ctx.organization_id,
        period_start = %payload.period_start,
        period_end = %payload.period_end,
        generated = response.generated.len(),
        skipped = response.skipped.len(),
        "Payroll generated"
    );
    Ok(created(response))
}

pub async fn list_payrolls(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<PayrollListQuery>,
) -> AppResult<Json<Vec<Payroll>>> {
    ctx.require(permissions::PAYROLL_READ)?;
    let filters = PayrollFilters {
        employee_id: parse_optional(query.employee_id.as_deref(), "employee_id")?,
        status: parse_optional(query.status.as_deref(), "status")?,
        period_start: query.period_start,
        period_end: query.period_end,
    };
    validate_date_range(filters.period_start, filters.period_end)?;

    let payrolls = PayrollRepository::new()
        .list(&state.pool, ctx.organization_id, &filters)
        .await?;
    Ok(Json(payrolls))
}

pub async fn get_payroll(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PayrollId>,
) -> AppResult<Json<Payroll>> {
    ctx.require(permissions::PAYROLL_READ)?;
    Ok(Json(
        PayrollRepository::new()
            .find_by_id(&state.pool, ctx.organization_id, id)
            .await?,
    ))
}

pub async fn approve_payroll(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PayrollId>,
) -> AppResult<Json<Payroll>> {
    ctx.require(permissions::PAYROLL_APPROVE)?;
    let payroll = transition(&state, &ctx, id, PayrollStatus::Approved).await?;
    tracing::info!(payroll_id = %payroll.id, approved_by = %ctx.user.id, "Payroll approved");
    Ok(Json(payroll))
}

pub async fn pay_payroll(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PayrollId>,
) -> AppResult<Json<Payroll>> {
    ctx.require(permissions::PAYROLL_APPROVE)?;
    Ok(Json(transition(&state, &ctx, id, PayrollStatus::Paid).await?))
}

pub async fn delete_payroll(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PayrollId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::PAYROLL_WRITE)?;
    let repo = PayrollRepository::new();
    let payroll = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    if payroll.status != PayrollStatus::Draft {
        return Err(AppError::Conflict(format!(
            "Only draft payrolls can be deleted (current status: {})",
            payroll.status
        )));
    }
    repo.delete_draft(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export_payrolls(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<PayrollExportQuery>,
) -> AppResult<impl IntoResponse> {
    ctx.require(permissions::PAYROLL_READ)?;
    validate_date_range(query.period_start, query.period_end)?;

    let rows = PayrollRepository::new()
        .export_rows(
            &state.pool,
            ctx.organization_id,
            query.period_start,
            query.period_end,
        )
        .await?;
    let body = write_csv(EXPORT_HEADER, &rows.iter().map(export_cells).collect::<Vec<_>>())?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"payroll.csv\"",
            ),
        ],
        body,
    ))
}

async fn transition(
    state: &AppState,
    ctx: &OrgContext,
    id: PayrollId,
    next: PayrollStatus,
) -> AppResult<Payroll> {
    let repo = PayrollRepository::new();
    let mut tx = begin_transaction(&state.pool).await?;
    let mut payroll = repo
        .find_for_update(&mut tx, ctx.organization_id, id)
        .await?;
    payroll.transition(next).map_err(AppError::Conflict)?;
    if next == PayrollStatus::Approved {
        payroll.approved_by = Some(ctx.user.id);
        payroll.approved_at = Some(Utc::now());
    }
    let payroll = repo.update_state(&mut *tx, &payroll).await?;
    commit_transaction(tx).await?;
    Ok(payroll)
}

fn export_cells(row: &PayrollExportRow) -> Vec<String> {
    vec![
        row.employee_number.clone(),
        row.employee_name.clone(),
        row.document_number.clone(),
        row.period_start.to_string(),
        row.period_end.to_string(),
        row.worked_days.to_string(),
        format!("{:.2}", row.overtime_hours),
        format!("{:.2}", row.base_pay),
        format!("{:.2}", row.overtime_pay),
        format!("{:.2}", row.transport_allowance),
        format!("{:.2}", row.bonuses),
        format!("{:.2}", row.gross_pay),
        format!("{:.2}", row.total_deductions),
        format!("{:.2}", row.net_pay),
        row.status.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn export_cells_follow_header_order() {
        let row = PayrollExportRow {
            employee_number: "EMP-001".into(),
            employee_name: "=Ana Gómez".into(),
            document_number: "1020304050".into(),
            period_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            worked_days: 30,
            overtime_hours: 0.0,
            base_pay: 1_300_000.0,
            overtime_pay: 0.0,
            transport_allowance: 162_000.0,
            bonuses: 0.0,
            gross_pay: 1_462_000.0,
            total_deductions: 104_000.0,
            net_pay: 1_358_000.0,
            status: PayrollStatus::Approved,
        };
        let cells = export_cells(&row);
        assert_eq!(cells.len(), EXPORT_HEADER.len());
        assert_eq!(cells[13], "1358000.00");
        assert_eq!(cells[14], "approved");

        let csv = write_csv(EXPORT_HEADER, &[cells]).unwrap();
        assert!(csv.contains("\"'=Ana Gómez\""));
    }
}
