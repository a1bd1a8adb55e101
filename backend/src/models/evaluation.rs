use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    models::organization::trim_optional,
    types::{CriteriaId, EmployeeId, EvaluationId, OrganizationId, UserId},
    utils::numbers::round2,
};

text_enum! {
    pub enum EvaluationStatus {
        Draft => "draft",
        Submitted => "submitted",
        Completed => "completed",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub organization_id: OrganizationId,
    pub employee_id: EmployeeId,
    pub evaluator_id: UserId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: EvaluationStatus,
    pub overall_score: Option<f64>,
    pub comments: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn new(organization_id: OrganizationId, evaluator_id: UserId, payload: &CreateEvaluationRequest) -> Self {
        let now = Utc::now();
        Self {
            id: EvaluationId::new(),
            organization_id,
            employee_id: payload.employee_id,
            evaluator_id,
            period_start: payload.period_start,
            period_end: payload.period_end,
            status: EvaluationStatus::Draft,
            overall_score: None,
            comments: trim_optional(payload.comments.clone()),
            submitted_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_editable(&self) -> bool {
        self.status == EvaluationStatus::Draft
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EvaluationCriteria {
    pub id: CriteriaId,
    pub evaluation_id: EvaluationId,
    pub name: String,
    pub weight: f64,
    pub score: Option<f64>,
    pub comments: Option<String>,
}

impl EvaluationCriteria {
    pub fn new(evaluation_id: EvaluationId, input: CriteriaInput) -> Self {
        Self {
            id: CriteriaId::new(),
            evaluation_id,
            name: input.name.trim().to_string(),
            weight: input.weight,
            score: input.score,
            comments: trim_optional(input.comments),
        }
    }
}

/// Weighted average of the criteria scores, or `None` while any score is missing.
pub fn weighted_score(criteria: &[EvaluationCriteria]) -> Option<f64> {
    let total_weight: f64 = criteria.iter().map(|c| c.weight).sum();
    if criteria.is_empty() || total_weight <= 0.0 {
        return None;
    }
    let mut weighted = 0.0;
    for c in criteria {
        weighted += c.score? * c.weight;
    }
    Some(round2(weighted / total_weight))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluationDetail {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub criteria: Vec<EvaluationCriteria>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CriteriaInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub score: Option<f64>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEvaluationRequest {
    pub employee_id: EmployeeId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(default)]
    pub comments: Option<String>,
    #[validate(length(min = 1), nested)]
    pub criteria: Vec<CriteriaInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEvaluationRequest {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub comments: Option<String>,
    /// Replaces the whole criteria list when present.
    #[validate(length(min = 1), nested)]
    pub criteria: Option<Vec<CriteriaInput>>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct EvaluationListQuery {
    pub employee_id: Option<String>,
    pub status: Option<String>,
}
