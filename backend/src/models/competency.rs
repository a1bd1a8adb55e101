use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    models::organization::trim_optional,
    types::{CompetencyId, EmployeeId, OrganizationId, PositionId, UserId},
};

text_enum! {
    pub enum CompetencyCategory {
        Technical => "technical",
        Behavioral => "behavioral",
        Leadership => "leadership",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Competency {
    pub id: CompetencyId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub category: CompetencyCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Competency {
    pub fn new(organization_id: OrganizationId, payload: CompetencyPayload) -> Self {
        let now = Utc::now();
        Self {
            id: CompetencyId::new(),
            organization_id,
            name: payload.name.trim().to_string(),
            description: trim_optional(payload.description),
            category: payload.category,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, payload: CompetencyPayload) {
        self.name = payload.name.trim().to_string();
        self.description = trim_optional(payload.description);
        self.category = payload.category;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CompetencyPayload {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: CompetencyCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PositionCompetency {
    pub position_id: PositionId,
    pub competency_id: CompetencyId,
    pub competency_name: String,
    pub required_level: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EmployeeCompetency {
    pub employee_id: EmployeeId,
    pub competency_id: CompetencyId,
    pub competency_name: String,
    pub level: i32,
    pub assessed_by: UserId,
    pub assessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RequirementInput {
    pub competency_id: CompetencyId,
    #[validate(range(min = 1, max = 5))]
    pub required_level: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetRequirementsRequest {
    #[validate(nested)]
    pub requirements: Vec<RequirementInput>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssessmentInput {
    pub competency_id: CompetencyId,
    #[validate(range(min = 1, max = 5))]
    pub level: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssessCompetenciesRequest {
    #[validate(nested)]
    pub assessments: Vec<AssessmentInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CompetencyGap {
    pub competency_id: CompetencyId,
    pub competency_name: String,
    pub required_level: i32,
    pub current_level: i32,
    pub gap: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GapAnalysis {
    pub employee_id: EmployeeId,
    pub position_id: Option<PositionId>,
    pub gaps: Vec<CompetencyGap>,
}

/// Compares position requirements with the employee's assessed levels.
pub fn compute_gaps(
    requirements: &[PositionCompetency],
    assessed: &[EmployeeCompetency],
) -> Vec<CompetencyGap> {
    requirements
        .iter()
        .map(|req| {
            let current_level = assessed
                .iter()
                .find(|a| a.competency_id == req.competency_id)
                .map(|a| a.level)
                .unwrap_or(0);
            CompetencyGap {
                competency_id: req.competency_id,
                competency_name: req.competency_name.clone(),
                required_level: req.required_level,
                current_level,
                gap: (req.required_level - current_level).max(0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_default_missing_levels_to_zero() {
        let position_id = PositionId::new();
        let rust = CompetencyId::new();
        let sql = CompetencyId::new();
        let requirements = vec![
            PositionCompetency {
                position_id,
                competency_id: rust,
                competency_name: "Rust".into(),
                required_level: 4,
            },
            PositionCompetency {
                position_id,
                competency_id: sql,
                competency_name: "SQL".into(),
                required_level: 3,
            },
        ];
        let assessed = vec![EmployeeCompetency {
            employee_id: EmployeeId::new(),
            competency_id: sql,
            competency_name: "SQL".into(),
            level: 5,
            assessed_by: UserId::new(),
            assessed_at: Utc::now(),
        }];

        let gaps = compute_gaps(&requirements, &assessed);
        assert_eq!(gaps[0].current_level, 0);
        assert_eq!(gaps[0].gap, 4);
        assert_eq!(gaps[1].current_level, 5);
        assert_eq!(gaps[1].gap, 0);
    }
}
