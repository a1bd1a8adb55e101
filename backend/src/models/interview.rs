use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    models::organization::trim_optional,
    types::{EmployeeId, InterviewId, OrganizationId, UserId},
};

text_enum! {
    pub enum InterviewStatus {
        Scheduled => "scheduled",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Interview {
    pub id: InterviewId,
    pub organization_id: OrganizationId,
    pub employee_id: EmployeeId,
    pub interviewer_id: UserId,
    /// Free text such as `follow_up`, `exit` or `performance`.
    pub interview_type: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: InterviewStatus,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    pub fn new(
        organization_id: OrganizationId,
        employee_id: EmployeeId,
        interviewer_id: UserId,
        payload: CreateInterview,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: InterviewId::new(),
            organization_id,
            employee_id,
            interviewer_id,
            interview_type: payload.interview_type.trim().to_string(),
            scheduled_at: payload.scheduled_at,
            status: InterviewStatus::Scheduled,
            notes: trim_optional(payload.notes),
            outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, payload: UpdateInterview) {
        if let Some(status) = payload.status {
            self.status = status;
        }
        if let Some(at) = payload.scheduled_at {
            self.scheduled_at = at;
        }
        if payload.notes.is_some() {
            self.notes = trim_optional(payload.notes);
        }
        if payload.outcome.is_some() {
            self.outcome = trim_optional(payload.outcome);
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInterview {
    #[validate(length(min = 1, max = 100))]
    pub interview_type: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateInterview {
    pub status: Option<InterviewStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_completes_interview_with_outcome() {
        let mut interview = Interview::new(
            OrganizationId::new(),
            EmployeeId::new(),
            UserId::new(),
            CreateInterview {
                interview_type: "follow_up".into(),
                scheduled_at: Utc::now(),
                notes: None,
            },
        );
        assert_eq!(interview.status, InterviewStatus::Scheduled);

        interview.apply_update(UpdateInterview {
            status: Some(InterviewStatus::Completed),
            outcome: Some("Agreed on training plan".into()),
            ..Default::default()
        });
        assert_eq!(interview.status, InterviewStatus::Completed);
        assert_eq!(interview.outcome.as_deref(), Some("Agreed on training plan"));
        assert_eq!(interview.notes, None);
    }
}
