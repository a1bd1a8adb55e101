//! Scoring of submitted psychometric answers.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{
    error::AppError,
    models::psychometric::{AnswerInput, Question, QuestionType, ScoreLevel},
    types::QuestionId,
    utils::numbers::round2,
};

pub const LIKERT_MAX: u8 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("Question {0} does not belong to this test")]
    UnknownQuestion(QuestionId),
    #[error("Question {0} was answered more than once")]
    DuplicateAnswer(QuestionId),
    #[error("Likert answers must be integers between 1 and 5")]
    InvalidLikert,
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAnswer {
    pub question_id: QuestionId,
    pub answer: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub interpretation: ScoreLevel,
    pub answers: Vec<ScoredAnswer>,
}

/// Points earned by one answer.
pub fn points_for(question: &Question, answer: &str) -> Result<f64, ScoringError> {
    let answer = answer.trim();
    match question.question_type {
        QuestionType::MultipleChoice | QuestionType::TrueFalse => Ok(question
            .correct_answer
            .as_deref()
            .filter(|correct| correct.trim().eq_ignore_ascii_case(answer))
            .map(|_| question.weight)
            .unwrap_or(0.0)),
        QuestionType::Likert => {
            let value: u8 = answer.parse().map_err(|_| ScoringError::InvalidLikert)?;
            if !(1..=LIKERT_MAX).contains(&value) {
                return Err(ScoringError::InvalidLikert);
            }
            Ok(question.weight * f64::from(value) / f64::from(LIKERT_MAX))
        }
    }
}

/// Scores answers against the questions of a test. Unanswered questions earn
/// nothing but still count toward the maximum.
pub fn score(questions: &[Question], answers: &[AnswerInput]) -> Result<Score, ScoringError> {
    let by_id: HashMap<QuestionId, &Question> = questions.iter().map(|q| (q.id, q)).collect();
    let mut seen = HashSet::new();
    let mut scored = Vec::with_capacity(answers.len());
    let mut total = 0.0;

    for input in answers {
        let question = by_id
            .get(&input.question_id)
            .ok_or(ScoringError::UnknownQuestion(input.question_id))?;
        if !seen.insert(input.question_id) {
            return Err(ScoringError::DuplicateAnswer(input.question_id));
        }
        let points = points_for(question, &input.answer)?;
        total += points;
        scored.push(ScoredAnswer {
            question_id: input.question_id,
            answer: input.answer.trim().to_string(),
            points: round2(points),
        });
    }

    let max_score: f64 = questions.iter().map(|q| q.weight).sum();
    let percentage = if max_score > 0.0 {
        round2(total / max_score * 100.0)
    } else {
        0.0
    };
    Ok(Score {
        score: round2(total),
        max_score: round2(max_score),
        percentage,
        interpretation: ScoreLevel::from_percentage(percentage),
        answers: scored,
    })
}
