//! Disciplinary process: a case moves forward through charges, notification,
//! defense or hearing, and ends in a sanction, a termination or a closure.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    models::organization::trim_optional,
    types::{
        ChargeId, DefenseId, DisciplinaryCaseId, EmployeeId, HearingId, NotificationId,
        OrganizationId, SanctionId, TerminationId, UserId,
    },
};

/// Longest suspension accepted by the labor code, in calendar days.
pub const MAX_SUSPENSION_DAYS: i64 = 60;

text_enum! {
    pub enum CaseStatus {
        Opened => "opened",
        ChargesFiled => "charges_filed",
        Notified => "notified",
        DefenseSubmitted => "defense_submitted",
        HearingScheduled => "hearing_scheduled",
        Sanctioned => "sanctioned",
        Terminated => "terminated",
        Closed => "closed",
    }
}

/// Process step attempted on a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseAction {
    FileCharge,
    Notify,
    SubmitDefense,
    ScheduleHearing,
    Sanction,
    Terminate,
    Close,
}

impl CaseStatus {
    /// Status reached after `action`, or `None` when the step is not allowed.
    pub fn after(&self, action: CaseAction) -> Option<CaseStatus> {
        use CaseAction as A;
        use CaseStatus::*;
        match (self, action) {
            (Closed, _) => None,
            (_, A::Close) => Some(Closed),
            (Opened | ChargesFiled, A::FileCharge) => Some(ChargesFiled),
            (ChargesFiled | Notified, A::Notify) => Some(Notified),
            (Notified | HearingScheduled, A::SubmitDefense) => Some(DefenseSubmitted),
            (Notified | DefenseSubmitted | HearingScheduled, A::ScheduleHearing) => {
                Some(HearingScheduled)
            }
            (DefenseSubmitted | HearingScheduled, A::Sanction) => Some(Sanctioned),
            (DefenseSubmitted | HearingScheduled, A::Terminate) => Some(Terminated),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        *self == CaseStatus::Closed
    }
}

text_enum! {
    pub enum ChargeSeverity {
        Minor => "minor",
        Serious => "serious",
        VerySerious => "very_serious",
    }
}

text_enum! {
    pub enum NotificationMethod {
        InPerson => "in_person",
        Email => "email",
        CertifiedMail => "certified_mail",
    }
}

text_enum! {
    pub enum SanctionType {
        VerbalWarning => "verbal_warning",
        WrittenWarning => "written_warning",
        Suspension => "suspension",
        Fine => "fine",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DisciplinaryCase {
    pub id: DisciplinaryCaseId,
    pub organization_id: OrganizationId,
    pub employee_id: EmployeeId,
    pub case_number: String,
    pub title: String,
    pub description: String,
    pub incident_date: NaiveDate,
    pub status: CaseStatus,
    pub resolution: Option<String>,
    pub opened_by: UserId,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DisciplinaryCase {
    pub fn new(
        organization_id: OrganizationId,
        opened_by: UserId,
        case_number: String,
        payload: CreateCaseRequest,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DisciplinaryCaseId::new(),
            organization_id,
            employee_id: payload.employee_id,
            case_number,
            title: payload.title.trim().to_string(),
            description: payload.description.trim().to_string(),
            incident_date: payload.incident_date,
            status: CaseStatus::Opened,
            resolution: None,
            opened_by,
            closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the case forward, returning the rejected transition as an error message.
    pub fn advance(&mut self, action: CaseAction) -> Result<(), String> {
        let next = self.status.after(action).ok_or_else(|| {
            if self.status.is_closed() {
                "Case is closed".to_string()
            } else {
                format!("Action not allowed while case is {}", self.status)
            }
        })?;
        let now = Utc::now();
        self.status = next;
        self.updated_at = now;
        if next == CaseStatus::Closed {
            self.closed_at = Some(now);
        }
        Ok(())
    }
}

/// Formats the per-organization case number, e.g. `DC-2024-0007`.
pub fn case_number(year: i32, sequence: i64) -> String {
    format!("DC-{}-{:04}", year, sequence)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Charge {
    pub id: ChargeId,
    pub case_id: DisciplinaryCaseId,
    pub description: String,
    pub regulation_reference: Option<String>,
    pub severity: ChargeSeverity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CaseNotification {
    pub id: NotificationId,
    pub case_id: DisciplinaryCaseId,
    pub method: NotificationMethod,
    pub recipient: String,
    pub content: String,
    pub notified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DefenseSubmission {
    pub id: DefenseId,
    pub case_id: DisciplinaryCaseId,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Hearing {
    pub id: HearingId,
    pub case_id: DisciplinaryCaseId,
    pub scheduled_at: DateTime<Utc>,
    pub location: String,
    pub attendees: Option<String>,
    pub minutes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sanction {
    pub id: SanctionId,
    pub case_id: DisciplinaryCaseId,
    pub sanction_type: SanctionType,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Termination {
    pub id: TerminationId,
    pub case_id: DisciplinaryCaseId,
    pub termination_date: NaiveDate,
    pub reason: String,
    pub with_just_cause: bool,
    pub severance_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub case: DisciplinaryCase,
    pub charges: Vec<Charge>,
    pub notifications: Vec<CaseNotification>,
    pub defenses: Vec<DefenseSubmission>,
    pub hearings: Vec<Hearing>,
    pub sanction: Option<Sanction>,
    pub termination: Option<Termination>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCaseRequest {
    pub employee_id: EmployeeId,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    pub incident_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateChargeRequest {
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[serde(default)]
    pub regulation_reference: Option<String>,
    pub severity: ChargeSeverity,
}

impl Charge {
    pub fn new(case_id: DisciplinaryCaseId, payload: CreateChargeRequest) -> Self {
        Self {
            id: ChargeId::new(),
            case_id,
            description: payload.description.trim().to_string(),
            regulation_reference: trim_optional(payload.regulation_reference),
            severity: payload.severity,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationRequest {
    pub method: NotificationMethod,
    #[validate(length(min = 1, max = 200))]
    pub recipient: String,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

impl CaseNotification {
    pub fn new(case_id: DisciplinaryCaseId, payload: CreateNotificationRequest) -> Self {
        Self {
            id: NotificationId::new(),
            case_id,
            method: payload.method,
            recipient: payload.recipient.trim().to_string(),
            content: payload.content.trim().to_string(),
            notified_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDefenseRequest {
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

impl DefenseSubmission {
    pub fn new(case_id: DisciplinaryCaseId, payload: CreateDefenseRequest) -> Self {
        Self {
            id: DefenseId::new(),
            case_id,
            content: payload.content.trim().to_string(),
            submitted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateHearingRequest {
    pub scheduled_at: DateTime<Utc>,
    #[validate(length(min = 1, max = 300))]
    pub location: String,
    #[serde(default)]
    pub attendees: Option<String>,
    #[serde(default)]
    pub minutes: Option<String>,
}

impl Hearing {
    pub fn new(case_id: DisciplinaryCaseId, payload: CreateHearingRequest) -> Self {
        Self {
            id: HearingId::new(),
            case_id,
            scheduled_at: payload.scheduled_at,
            location: payload.location.trim().to_string(),
            attendees: trim_optional(payload.attendees),
            minutes: trim_optional(payload.minutes),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_sanction_dates"))]
pub struct CreateSanctionRequest {
    pub sanction_type: SanctionType,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

fn validate_sanction_dates(payload: &CreateSanctionRequest) -> Result<(), ValidationError> {
    match (payload.start_date, payload.end_date) {
        (Some(start), Some(end)) => {
            if end < start {
                return Err(ValidationError::new("end_before_start"));
            }
            if payload.sanction_type == SanctionType::Suspension
                && (end - start).num_days() + 1 > MAX_SUSPENSION_DAYS
            {
                return Err(ValidationError::new("suspension_too_long"));
            }
            Ok(())
        }
        _ if payload.sanction_type == SanctionType::Suspension => {
            Err(ValidationError::new("suspension_dates_required"))
        }
        _ => Ok(()),
    }
}

impl Sanction {
    pub fn new(case_id: DisciplinaryCaseId, payload: CreateSanctionRequest) -> Self {
        Self {
            id: SanctionId::new(),
            case_id,
            sanction_type: payload.sanction_type,
            description: payload.description.trim().to_string(),
            start_date: payload.start_date,
            end_date: payload.end_date,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTerminationRequest {
    pub termination_date: NaiveDate,
    #[validate(length(min = 1, max = 5000))]
    pub reason: String,
    pub with_just_cause: bool,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub severance_amount: Option<f64>,
}

impl Termination {
    pub fn new(case_id: DisciplinaryCaseId, payload: CreateTerminationRequest) -> Self {
        Self {
            id: TerminationId::new(),
            case_id,
            termination_date: payload.termination_date,
            reason: payload.reason.trim().to_string(),
            with_just_cause: payload.with_just_cause,
            severance_amount: payload.severance_amount,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CloseCaseRequest {
    #[serde(default)]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CaseListQuery {
    pub employee_id: Option<String>,
    pub status: Option<String>,
}
