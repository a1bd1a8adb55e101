use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::{
    types::{AttendanceId, EmployeeId, OrganizationId},
    utils::numbers::round2,
};

text_enum! {
    pub enum AttendanceStatus {
        Present => "present",
        Late => "late",
        Absent => "absent",
        Excused => "excused",
    }
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        AttendanceStatus::Present
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Attendance {
    pub id: AttendanceId,
    pub organization_id: OrganizationId,
    pub employee_id: EmployeeId,
    /// Calendar day in the configured time zone.
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub hours_worked: Option<f64>,
    pub overtime_hours: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    pub fn new(organization_id: OrganizationId, employee_id: EmployeeId, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: AttendanceId::new(),
            organization_id,
            employee_id,
            date,
            check_in: None,
            check_out: None,
            status: AttendanceStatus::Present,
            hours_worked: None,
            overtime_hours: 0.0,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recomputes worked and overtime hours from the recorded times.
    pub fn calculate_work_hours(&mut self, standard_daily_hours: f64) {
        match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => {
                let (worked, overtime) = compute_hours(check_in, check_out, standard_daily_hours);
                self.hours_worked = Some(worked);
                self.overtime_hours = overtime;
            }
            _ => {
                self.hours_worked = None;
                self.overtime_hours = 0.0;
            }
        }
    }

    pub fn is_checked_in(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_none()
    }

    pub fn is_checked_out(&self) -> bool {
        self.check_out.is_some()
    }
}

/// Returns `(hours_worked, overtime_hours)` rounded to 2 decimals.
pub fn compute_hours(
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    standard_daily_hours: f64,
) -> (f64, f64) {
    let minutes = (check_out - check_in).num_minutes().max(0);
    let worked = round2(minutes as f64 / 60.0);
    let overtime = round2((worked - standard_daily_hours).max(0.0));
    (worked, overtime)
}

/// Late once the local arrival is past the workday start plus the grace period.
pub fn classify_arrival(local_time: NaiveTime, workday_start: NaiveTime, grace_minutes: i64) -> AttendanceStatus {
    let (deadline, wrapped) = workday_start.overflowing_add_signed(Duration::minutes(grace_minutes));
    if wrapped == 0 && local_time > deadline {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckRequest {
    pub employee_id: EmployeeId,
    /// Defaults to the current instant.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ManualAttendanceRequest {
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    #[serde(default)]
    pub check_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_out: Option<DateTime<Utc>>,
    /// Derived from the check-in time when omitted.
    #[serde(default)]
    pub status: Option<AttendanceStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateAttendanceRequest {
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AttendanceListQuery {
    pub employee_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AttendanceSummaryQuery {
    pub employee_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub employee_id: Option<EmployeeId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub days_present: i64,
    pub days_late: i64,
    pub days_absent: i64,
    pub total_hours: f64,
    pub overtime_hours: f64,
    pub average_daily_hours: f64,
}

impl AttendanceSummary {
    /// Aggregates attendance rows. Late days also count as present.
    pub fn from_records(records: &[Attendance]) -> Self {
        let mut summary = AttendanceSummary::default();
        let mut worked_days = 0i64;
        for record in records {
            match record.status {
                AttendanceStatus::Present => summary.days_present += 1,
                AttendanceStatus::Late => {
                    summary.days_present += 1;
                    summary.days_late += 1;
                }
                AttendanceStatus::Absent => summary.days_absent += 1,
                AttendanceStatus::Excused => {}
            }
            if let Some(hours) = record.hours_worked {
                summary.total_hours += hours;
                worked_days += 1;
            }
            summary.overtime_hours += record.overtime_hours;
        }
        summary.total_hours = round2(summary.total_hours);
        summary.overtime_hours = round2(summary.overtime_hours);
        summary.average_daily_hours = if worked_days > 0 {
            round2(summary.total_hours / worked_days as f64)
        } else {
            0.0
        };
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    #[test]
    fn compute_hours_splits_overtime() {
        assert_eq!(compute_hours(at(8, 0), at(18, 30), 8.0), (10.5, 2.5));
        assert_eq!(compute_hours(at(8, 0), at(12, 20), 8.0), (4.33, 0.0));
    }

    #[test]
    fn classify_arrival_respects_grace_period() {
        let start = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let on_time = NaiveTime::from_hms_opt(8, 15, 0).unwrap();
        let late = NaiveTime::from_hms_opt(8, 16, 0).unwrap();
        assert_eq!(classify_arrival(on_time, start, 15), AttendanceStatus::Present);
        assert_eq!(classify_arrival(late, start, 15), AttendanceStatus::Late);
    }

    #[test]
    fn summary_counts_late_as_present() {
        let org = OrganizationId::new();
        let employee = EmployeeId::new();
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        let mut first = Attendance::new(org, employee, day);
        first.check_in = Some(at(8, 0));
        first.check_out = Some(at(18, 0));
        first.calculate_work_hours(8.0);

        let mut second = Attendance::new(org, employee, day.succ_opt().unwrap());
        second.status = AttendanceStatus::Late;
        second.check_in = Some(at(9, 0));
        second.check_out = Some(at(15, 0));
        second.calculate_work_hours(8.0);

        let mut third = Attendance::new(org, employee, day + Duration::days(2));
        third.status = AttendanceStatus::Absent;

        let summary = AttendanceSummary::from_records(&[first, second, third]);
        assert_eq!(summary.days_present, 2);
        assert_eq!(summary.days_late, 1);
        assert_eq!(summary.days_absent, 1);
        assert_eq!(summary.total_hours, 16.0);
        assert_eq!(summary.overtime_hours, 2.0);
        assert_eq!(summary.average_daily_hours, 8.0);
    }

    #[test]
    fn open_record_has_no_hours() {
        let mut record = Attendance::new(OrganizationId::new(), EmployeeId::new(), at(0, 0).date_naive());
        record.check_in = Some(at(8, 0));
        record.calculate_work_hours(8.0);
        assert!(record.is_checked_in());
        assert!(!record.is_checked_out());
        assert_eq!(record.hours_worked, None);
    }
}
