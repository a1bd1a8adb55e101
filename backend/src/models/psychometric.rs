//! Psychometric tests, their questions, assignments and scored results.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    models::organization::trim_optional,
    validation::rules::validate_not_blank,
    types::{
        AssignmentId, EmployeeId, OrganizationId, PsychometricTestId, QuestionId, TestResultId,
        UserId,
    },
};

text_enum! {
    pub enum TestCategory {
        Personality => "personality",
        Aptitude => "aptitude",
        Cognitive => "cognitive",
        Technical => "technical",
    }
}

text_enum! {
    pub enum QuestionType {
        MultipleChoice => "multiple_choice",
        TrueFalse => "true_false",
        Likert => "likert",
    }
}

text_enum! {
    pub enum AssignmentStatus {
        Pending => "pending",
        Completed => "completed",
        Expired => "expired",
    }
}

text_enum! {
    pub enum ScoreLevel {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl ScoreLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            ScoreLevel::High
        } else if percentage >= 60.0 {
            ScoreLevel::Medium
        } else {
            ScoreLevel::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PsychometricTest {
    pub id: PsychometricTestId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub category: TestCategory,
    pub time_limit_minutes: Option<i32>,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PsychometricTest {
    pub fn new(organization_id: OrganizationId, created_by: UserId, payload: CreateTestRequest) -> Self {
        let now = Utc::now();
        Self {
            id: PsychometricTestId::new(),
            organization_id,
            name: payload.name.trim().to_string(),
            description: trim_optional(payload.description),
            category: payload.category,
            time_limit_minutes: payload.time_limit_minutes,
            is_active: payload.is_active.unwrap_or(true),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, payload: UpdateTestRequest) {
        if let Some(name) = payload.name {
            self.name = name.trim().to_string();
        }
        if payload.description.is_some() {
            self.description = trim_optional(payload.description);
        }
        if let Some(category) = payload.category {
            self.category = category;
        }
        if payload.time_limit_minutes.is_some() {
            self.time_limit_minutes = payload.time_limit_minutes;
        }
        if let Some(active) = payload.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Question {
    pub id: QuestionId,
    pub organization_id: OrganizationId,
    pub test_id: PsychometricTestId,
    pub text: String,
    pub question_type: QuestionType,
    /// JSON array of answer options.
    #[schema(value_type = Vec<String>)]
    pub options: sqlx::types::Json<Vec<String>>,
    /// Hidden from respondents; returned to test editors only.
    pub correct_answer: Option<String>,
    pub weight: f64,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn new(
        organization_id: OrganizationId,
        test_id: PsychometricTestId,
        position: i32,
        payload: CreateQuestionRequest,
    ) -> Self {
        let options = match payload.question_type {
            QuestionType::TrueFalse if payload.options.is_empty() => {
                vec!["true".to_string(), "false".to_string()]
            }
            QuestionType::Likert if payload.options.is_empty() => {
                (1..=5).map(|v| v.to_string()).collect()
            }
            _ => payload
                .options
                .iter()
                .map(|o| o.trim().to_string())
                .collect(),
        };
        Self {
            id: QuestionId::new(),
            organization_id,
            test_id,
            text: payload.text.trim().to_string(),
            question_type: payload.question_type,
            options: sqlx::types::Json(options),
            correct_answer: trim_optional(payload.correct_answer),
            weight: payload.weight.unwrap_or(1.0),
            position,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TestWithQuestions {
    #[serde(flatten)]
    pub test: PsychometricTest,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Assignment {
    pub id: AssignmentId,
    pub organization_id: OrganizationId,
    pub test_id: PsychometricTestId,
    pub employee_id: EmployeeId,
    pub assigned_by: UserId,
    pub due_date: Option<NaiveDate>,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn new(organization_id: OrganizationId, assigned_by: UserId, payload: CreateAssignmentRequest) -> Self {
        Self {
            id: AssignmentId::new(),
            organization_id,
            test_id: payload.test_id,
            employee_id: payload.employee_id,
            assigned_by,
            due_date: payload.due_date,
            status: AssignmentStatus::Pending,
            assigned_at: Utc::now(),
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TestResult {
    pub id: TestResultId,
    pub organization_id: OrganizationId,
    pub assignment_id: AssignmentId,
    pub test_id: PsychometricTestId,
    pub employee_id: EmployeeId,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub interpretation: ScoreLevel,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StoredAnswer {
    pub result_id: TestResultId,
    pub question_id: QuestionId,
    pub answer: String,
    pub points: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitTestResponse {
    pub result: TestResult,
    pub answers: Vec<StoredAnswer>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTestRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: TestCategory,
    #[serde(default)]
    #[validate(range(min = 1, max = 600))]
    pub time_limit_minutes: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTestRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<TestCategory>,
    #[validate(range(min = 1, max = 600))]
    pub time_limit_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_question_shape"))]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub weight: Option<f64>,
}

fn validate_question_shape(payload: &CreateQuestionRequest) -> Result<(), ValidationError> {
    match payload.question_type {
        QuestionType::MultipleChoice => {
            if payload.options.iter().filter(|o| !o.trim().is_empty()).count() < 2 {
                return Err(ValidationError::new("options_required"));
            }
            let correct = payload
                .correct_answer
                .as_deref()
                .map(str::trim)
                .ok_or_else(|| ValidationError::new("correct_answer_required"))?;
            if !payload
                .options
                .iter()
                .any(|o| o.trim().eq_ignore_ascii_case(correct))
            {
                return Err(ValidationError::new("correct_answer_not_in_options"));
            }
        }
        QuestionType::TrueFalse => {
            let correct = payload
                .correct_answer
                .as_deref()
                .map(|v| v.trim().to_ascii_lowercase())
                .ok_or_else(|| ValidationError::new("correct_answer_required"))?;
            if correct != "true" && correct != "false" {
                return Err(ValidationError::new("correct_answer_not_boolean"));
            }
        }
        QuestionType::Likert => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAssignmentRequest {
    pub test_id: PsychometricTestId,
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnswerInput {
    pub question_id: QuestionId,
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AssignmentListQuery {
    pub employee_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ResultListQuery {
    pub employee_id: Option<String>,
    pub test_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(question_type: QuestionType, options: &[&str], correct: Option<&str>) -> CreateQuestionRequest {
        CreateQuestionRequest {
            text: "Pick one".into(),
            question_type,
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.map(str::to_string),
            weight: Some(2.0),
        }
    }

    #[test]
    fn multiple_choice_requires_options_and_matching_answer() {
        assert!(question(QuestionType::MultipleChoice, &["a"], Some("a")).validate().is_err());
        assert!(question(QuestionType::MultipleChoice, &["a", "b"], Some("c")).validate().is_err());
        assert!(question(QuestionType::MultipleChoice, &["a", "b"], None).validate().is_err());
        assert!(question(QuestionType::MultipleChoice, &["a", "B"], Some("b")).validate().is_ok());
    }

    #[test]
    fn true_false_and_likert_get_default_options() {
        let org = OrganizationId::new();
        let test_id = PsychometricTestId::new();
        let tf = Question::new(org, test_id, 1, question(QuestionType::TrueFalse, &[], Some("TRUE")));
        assert_eq!(tf.options.0, vec!["true", "false"]);
        let likert = Question::new(org, test_id, 2, question(QuestionType::Likert, &[], None));
        assert_eq!(likert.options.0.len(), 5);
        assert!(question(QuestionType::TrueFalse, &[], Some("maybe")).validate().is_err());
    }

    #[test]
    fn score_levels() {
        assert_eq!(ScoreLevel::from_percentage(80.0), ScoreLevel::High);
        assert_eq!(ScoreLevel::from_percentage(79.99), ScoreLevel::Medium);
        assert_eq!(ScoreLevel::from_percentage(60.0), ScoreLevel::Medium);
        assert_eq!(ScoreLevel::from_percentage(12.0), ScoreLevel::Low);
    }
}
