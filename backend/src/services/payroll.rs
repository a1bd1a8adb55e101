//! Payroll calculation.
//!
//! Pure functions over an employee, the attendance rows of the period and the
//! configured rates. Persistence lives in the payroll handler.

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::{
    config::PayrollSettings,
    error::AppError,
    models::{
        attendance::Attendance,
        employee::Employee,
        payroll::{Payroll, PayrollStatus},
    },
    types::PayrollId,
    utils::numbers::round2,
};

/// Days in a payroll month under the commercial calendar.
pub const COMMERCIAL_MONTH_DAYS: i64 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum PayrollError {
    #[error("period_end must not be before period_start")]
    InvalidPeriod,
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),
    #[error("Employee base salary must not be negative")]
    NegativeSalary,
}

impl From<PayrollError> for AppError {
    fn from(err: PayrollError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Extra amounts applied on top of the computed payroll.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Adjustments {
    pub bonuses: f64,
    pub other_deductions: f64,
}

impl Adjustments {
    pub fn new(bonuses: Option<f64>, other_deductions: Option<f64>) -> Result<Self, PayrollError> {
        let bonuses = bonuses.unwrap_or(0.0);
        let other_deductions = other_deductions.unwrap_or(0.0);
        if bonuses < 0.0 {
            return Err(PayrollError::NegativeAmount("bonuses"));
        }
        if other_deductions < 0.0 {
            return Err(PayrollError::NegativeAmount("other_deductions"));
        }
        Ok(Self {
            bonuses,
            other_deductions,
        })
    }
}

/// Line items of one payroll before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollBreakdown {
    pub worked_days: i32,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub base_pay: f64,
    pub overtime_pay: f64,
    pub transport_allowance: f64,
    pub bonuses: f64,
    pub gross_pay: f64,
    pub health_deduction: f64,
    pub pension_deduction: f64,
    pub other_deductions: f64,
    pub total_deductions: f64,
    pub net_pay: f64,
}

pub fn period_days(start: NaiveDate, end: NaiveDate) -> Result<i64, PayrollError> {
    if end < start {
        return Err(PayrollError::InvalidPeriod);
    }
    Ok(((end - start).num_days() + 1).min(COMMERCIAL_MONTH_DAYS))
}

pub fn calculate(
    base_salary: f64,
    period_start: NaiveDate,
    period_end: NaiveDate,
    attendance: &[Attendance],
    adjustments: Adjustments,
    settings: &PayrollSettings,
) -> Result<PayrollBreakdown, PayrollError> {
    if base_salary < 0.0 {
        return Err(PayrollError::NegativeSalary);
    }
    let days = period_days(period_start, period_end)?;
    let fraction = days as f64 / COMMERCIAL_MONTH_DAYS as f64;

    let total_hours: f64 = attendance.iter().filter_map(|a| a.hours_worked).sum();
    let overtime_hours: f64 = attendance.iter().map(|a| a.overtime_hours).sum();
    let regular_hours = (total_hours - overtime_hours).max(0.0);

    let base_pay = base_salary * fraction;
    let hourly_rate = if settings.monthly_hours > 0.0 {
        base_salary / settings.monthly_hours
    } else {
        0.0
    };
    let overtime_pay = overtime_hours * hourly_rate * settings.overtime_multiplier;
    let transport_allowance = if base_salary <= 2.0 * settings.minimum_wage {
        settings.transport_allowance * fraction
    } else {
        0.0
    };

    let gross_pay = round2(base_pay + overtime_pay + transport_allowance + adjustments.bonuses);
    let contribution_base = gross_pay - round2(transport_allowance);
    let health_deduction = round2(contribution_base * settings.health_rate);
    let pension_deduction = round2(contribution_base * settings.pension_rate);
    let other_deductions = round2(adjustments.other_deductions);
    let total_deductions = round2(health_deduction + pension_deduction + other_deductions);

    Ok(PayrollBreakdown {
        worked_days: days as i32,
        regular_hours: round2(regular_hours),
        overtime_hours: round2(overtime_hours),
        base_pay: round2(base_pay),
        overtime_pay: round2(overtime_pay),
        transport_allowance: round2(transport_allowance),
        bonuses: round2(adjustments.bonuses),
        gross_pay,
        health_deduction,
        pension_deduction,
        other_deductions,
        total_deductions,
        net_pay: round2(gross_pay - total_deductions),
    })
}

/// Builds a draft payroll for `employee` over the period.
pub fn build_draft(
    employee: &Employee,
    period_start: NaiveDate,
    period_end: NaiveDate,
    attendance: &[Attendance],
    adjustments: Adjustments,
    settings: &PayrollSettings,
) -> Result<Payroll, PayrollError> {
    let b = calculate(
        employee.base_salary,
        period_start,
        period_end,
        attendance,
        adjustments,
        settings,
    )?;
    let now = Utc::now();
    Ok(Payroll {
        id: PayrollId::new(),
        organization_id: employee.organization_id,
        employee_id: employee.id,
        period_start,
        period_end,
        base_salary: employee.base_salary,
        worked_days: b.worked_days,
        regular_hours: b.regular_hours,
        overtime_hours: b.overtime_hours,
        base_pay: b.base_pay,
        overtime_pay: b.overtime_pay,
        transport_allowance: b.transport_allowance,
        bonuses: b.bonuses,
        gross_pay: b.gross_pay,
        health_deduction: b.health_deduction,
        pension_deduction: b.pension_deduction,
        other_deductions: b.other_deductions,
        total_deductions: b.total_deductions,
        net_pay: b.net_pay,
        status: PayrollStatus::Draft,
        dian_document_number: None,
        cune: None,
        approved_by: None,
        approved_at: None,
        paid_at: None,
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::Attendance;
    use crate::types::{EmployeeId, OrganizationId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn worked(hours: f64, overtime: f64) -> Attendance {
        let mut record = Attendance::new(OrganizationId::new(), EmployeeId::new(), date(2024, 3, 4));
        record.hours_worked = Some(hours);
        record.overtime_hours = overtime;
        record
    }

    #[test]
    fn full_month_with_transport_allowance() {
        let settings = PayrollSettings::default();
        let b = calculate(
            1_300_000.0,
            date(2024, 3, 1),
            date(2024, 3, 31),
            &[],
            Adjustments::default(),
            &settings,
        )
        .unwrap();
        assert_eq!(b.worked_days, 30);
        assert_eq!(b.base_pay, 1_300_000.0);
        assert_eq!(b.transport_allowance, 162_000.0);
        assert_eq!(b.gross_pay, 1_462_000.0);
        assert_eq!(b.health_deduction, 52_000.0);
        assert_eq!(b.pension_deduction, 52_000.0);
        assert_eq!(b.total_deductions, 104_000.0);
        assert_eq!(b.net_pay, 1_358_000.0);
    }

    #[test]
    fn overtime_and_adjustments() {
        let settings = PayrollSettings::default();
        let attendance = vec![worked(10.0, 2.0), worked(8.0, 0.0)];
        let adjustments = Adjustments::new(Some(100_000.0), Some(50_000.0)).unwrap();
        let b = calculate(
            4_800_000.0,
            date(2024, 3, 1),
            date(2024, 3, 15),
            &attendance,
            adjustments,
            &settings,
        )
        .unwrap();
        // hourly = 4_800_000 / 240 = 20_000; overtime = 2h * 20_000 * 1.25
        assert_eq!(b.worked_days, 15);
        assert_eq!(b.base_pay, 2_400_000.0);
        assert_eq!(b.overtime_pay, 50_000.0);
        assert_eq!(b.regular_hours, 16.0);
        assert_eq!(b.transport_allowance, 0.0);
        assert_eq!(b.gross_pay, 2_550_000.0);
        assert_eq!(b.health_deduction, 102_000.0);
        assert_eq!(b.total_deductions, 254_000.0);
        assert_eq!(b.net_pay, 2_296_000.0);
    }

    #[test]
    fn period_is_capped_at_thirty_days() {
        assert_eq!(period_days(date(2024, 1, 1), date(2024, 1, 31)).unwrap(), 30);
        assert_eq!(period_days(date(2024, 2, 1), date(2024, 2, 1)).unwrap(), 1);
        assert_eq!(
            period_days(date(2024, 2, 2), date(2024, 2, 1)),
            Err(PayrollError::InvalidPeriod)
        );
    }

    #[test]
    fn negative_adjustments_are_rejected() {
        assert_eq!(
            Adjustments::new(Some(-1.0), None),
            Err(PayrollError::NegativeAmount("bonuses"))
        );
        assert_eq!(
            Adjustments::new(None, Some(-0.5)),
            Err(PayrollError::NegativeAmount("other_deductions"))
        );
    }
}
