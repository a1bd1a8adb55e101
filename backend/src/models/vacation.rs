use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::{
    models::organization::trim_optional,
    types::{EmployeeId, OrganizationId, UserId, VacationId},
    utils::numbers::round2,
};

text_enum! {
    pub enum VacationType {
        Annual => "annual",
        Sick => "sick",
        Maternity => "maternity",
        Paternity => "paternity",
        Unpaid => "unpaid",
        Other => "other",
    }
}

text_enum! {
    pub enum VacationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Cancelled => "cancelled",
    }
}

impl VacationStatus {
    /// Pending and approved requests block overlapping ones.
    pub fn is_blocking(&self) -> bool {
        matches!(self, VacationStatus::Pending | VacationStatus::Approved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Vacation {
    pub id: VacationId,
    pub organization_id: OrganizationId,
    pub employee_id: EmployeeId,
    pub vacation_type: VacationType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Business days covered by the request.
    pub days: i32,
    pub reason: Option<String>,
    pub status: VacationStatus,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vacation {
    pub fn new(organization_id: OrganizationId, payload: CreateVacationRequest, days: i32) -> Self {
        let now = Utc::now();
        Self {
            id: VacationId::new(),
            organization_id,
            employee_id: payload.employee_id,
            vacation_type: payload.vacation_type,
            start_date: payload.start_date,
            end_date: payload.end_date,
            days,
            reason: trim_optional(payload.reason),
            status: VacationStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    /// Cancellation is allowed while pending, or once approved but not yet started.
    pub fn can_cancel(&self, today: NaiveDate) -> bool {
        match self.status {
            VacationStatus::Pending => true,
            VacationStatus::Approved => self.start_date > today,
            _ => false,
        }
    }

    pub fn review(&mut self, status: VacationStatus, reviewer: UserId, comment: Option<String>) {
        let now = Utc::now();
        self.status = status;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.review_comment = trim_optional(comment);
        self.updated_at = now;
    }
}

/// Counts Monday to Friday days in `[start, end]`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> i32 {
    if end < start {
        return 0;
    }
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as i32
}

/// Vacation days earned between `hire_date` and `as_of`, on a 360-day year.
pub fn accrued_days(hire_date: NaiveDate, as_of: NaiveDate, days_per_year: f64) -> f64 {
    let service_days = (as_of - hire_date).num_days().max(0) as f64;
    round2(service_days * days_per_year / 360.0)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVacationRequest {
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub vacation_type: VacationType,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReviewVacationRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct VacationListQuery {
    pub employee_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VacationBalance {
    pub employee_id: EmployeeId,
    pub accrued: f64,
    pub taken: f64,
    pub pending: f64,
    pub available: f64,
}

impl VacationBalance {
    pub fn new(employee_id: EmployeeId, accrued: f64, taken: i64, pending: i64) -> Self {
        let taken = taken as f64;
        Self {
            employee_id,
            accrued,
            taken,
            pending: pending as f64,
            available: round2(accrued - taken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn business_days_skip_weekends() {
        // 2024-03-04 is a Monday.
        assert_eq!(business_days(date(2024, 3, 4), date(2024, 3, 8)), 5);
        assert_eq!(business_days(date(2024, 3, 4), date(2024, 3, 11)), 6);
        assert_eq!(business_days(date(2024, 3, 9), date(2024, 3, 10)), 0);
        assert_eq!(business_days(date(2024, 3, 8), date(2024, 3, 4)), 0);
    }

    #[test]
    fn accrual_uses_commercial_year() {
        assert_eq!(accrued_days(date(2023, 1, 1), date(2023, 12, 27), 15.0), 15.0);
        assert_eq!(accrued_days(date(2024, 1, 1), date(2024, 1, 31), 15.0), 1.25);
        assert_eq!(accrued_days(date(2024, 2, 1), date(2024, 1, 1), 15.0), 0.0);
    }

    #[test]
    fn cancel_rules() {
        let mut vacation = Vacation::new(
            OrganizationId::new(),
            CreateVacationRequest {
                employee_id: EmployeeId::new(),
                start_date: date(2024, 5, 6),
                end_date: date(2024, 5, 10),
                vacation_type: VacationType::Annual,
                reason: None,
            },
            5,
        );
        assert!(vacation.can_cancel(date(2024, 5, 20)));
        vacation.review(VacationStatus::Approved, UserId::new(), None);
        assert!(vacation.can_cancel(date(2024, 5, 1)));
        assert!(!vacation.can_cancel(date(2024, 5, 6)));
        assert!(vacation.overlaps(date(2024, 5, 10), date(2024, 5, 12)));
        assert!(!vacation.overlaps(date(2024, 5, 11), date(2024, 5, 12)));
    }

    #[test]
    fn balance_subtracts_taken_days() {
        let balance = VacationBalance::new(EmployeeId::new(), 12.5, 5, 2);
        assert_eq!(balance.available, 7.5);
        assert_eq!(balance.pending, 2.0);
    }
}
