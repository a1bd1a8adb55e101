//! Psychometric tests: catalogue, assignments and scoring.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::common::{created, parse_optional, require_read_self_or, require_self_or, Created},
    middleware::OrgContext,
    models::{
        psychometric::{
            Assignment, AssignmentListQuery, AssignmentStatus, CreateAssignmentRequest,
            CreateQuestionRequest, CreateTestRequest, PsychometricTest, Question,
            ResultListQuery, StoredAnswer, SubmitAnswersRequest, SubmitTestResponse, TestResult,
            TestWithQuestions, UpdateTestRequest,
        },
        rbac::permissions,
    },
    repositories::{
        begin_transaction, commit_transaction, EmployeeRepository, PsychometricRepository,
        TenantRepository,
    },
    services::psychometric::score,
    state::AppState,
    types::{AssignmentId, EmployeeId, PsychometricTestId, QuestionId, TestResultId},
};

pub async fn list_tests(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> AppResult<Json<Vec<PsychometricTest>>> {
    ctx.require(permissions::TRAINING_READ)?;
    let tests = PsychometricRepository::new()
        .find_all(&state.pool, ctx.organization_id)
        .await?;
    Ok(Json(tests))
}

pub async fn create_test(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateTestRequest>,
) -> AppResult<Created<PsychometricTest>> {
    ctx.require(permissions::TRAINING_WRITE)?;
    payload.validate()?;
    let test = PsychometricTest::new(ctx.organization_id, ctx.user.id, payload);
    Ok(created(
        PsychometricRepository::new()
            .create(&state.pool, &test)
            .await?,
    ))
}

pub async fn get_test(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PsychometricTestId>,
) -> AppResult<Json<TestWithQuestions>> {
    ctx.require(permissions::TRAINING_READ)?;
    let repo = PsychometricRepository::new();
    let test = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    let questions = repo.questions(&state.pool, ctx.organization_id, id).await?;
    Ok(Json(TestWithQuestions { test, questions }))
}

pub async fn update_test(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PsychometricTestId>,
    Json(payload): Json<UpdateTestRequest>,
) -> AppResult<Json<PsychometricTest>> {
    ctx.require(permissions::TRAINING_WRITE)?;
    payload.validate()?;
    let repo = PsychometricRepository::new();
    let mut test = repo.find_by_id(&state.pool, ctx.organization_id, id).await?;
    test.apply_update(payload);
    Ok(Json(repo.update(&state.pool, &test).await?))
}

pub async fn delete_test(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PsychometricTestId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::TRAINING_WRITE)?;
    PsychometricRepository::new()
        .delete(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_question(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(test_id): Path<PsychometricTestId>,
    Json(payload): Json<CreateQuestionRequest>,
) -> AppResult<Created<Question>> {
    ctx.require(permissions::TRAINING_WRITE)?;
    payload.validate()?;
    let repo = PsychometricRepository::new();
    repo.find_by_id(&state.pool, ctx.organization_id, test_id)
        .await?;

    let position = repo.next_question_position(&state.pool, test_id).await?;
    let question = Question::new(ctx.organization_id, test_id, position, payload);
    Ok(created(repo.insert_question(&state.pool, &question).await?))
}

pub async fn delete_question(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<QuestionId>,
) -> AppResult<StatusCode> {
    ctx.require(permissions::TRAINING_WRITE)?;
    PsychometricRepository::new()
        .delete_question(&state.pool, ctx.organization_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_assignment(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> AppResult<Created<Assignment>> {
    ctx.require(permissions::TRAINING_WRITE)?;
    let repo = PsychometricRepository::new();
    let test = repo
        .find_by_id(&state.pool, ctx.organization_id, payload.test_id)
        .await?;
    if !test.is_active {
        return Err(AppError::BadRequest("Test is not active".into()));
    }
    EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, payload.employee_id)
        .await?;
    if repo
        .has_pending_assignment(
            &state.pool,
            ctx.organization_id,
            payload.test_id,
            payload.employee_id,
        )
        .await?
    {
        return Err(AppError::Conflict(
            "The employee already has this test pending".into(),
        ));
    }

    let assignment = Assignment::new(ctx.organization_id, ctx.user.id, payload);
    Ok(created(repo.insert_assignment(&state.pool, &assignment).await?))
}

pub async fn list_assignments(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<AssignmentListQuery>,
) -> AppResult<Json<Vec<Assignment>>> {
    let employee_id: Option<EmployeeId> =
        parse_optional(query.employee_id.as_deref(), "employee_id")?;
    let status: Option<AssignmentStatus> = parse_optional(query.status.as_deref(), "status")?;
    require_read_self_or(&state.pool, &ctx, employee_id, permissions::TRAINING_READ).await?;

    let assignments = PsychometricRepository::new()
        .list_assignments(&state.pool, ctx.organization_id, employee_id, status)
        .await?;
    Ok(Json(assignments))
}

/// Scores the answers and closes the assignment in one transaction.
pub async fn submit_assignment(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<AssignmentId>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> AppResult<Created<SubmitTestResponse>> {
    let repo = PsychometricRepository::new();
    let assignment = repo
        .find_assignment(&state.pool, ctx.organization_id, id)
        .await?;
    require_self_or(
        &state.pool,
        &ctx,
        assignment.employee_id,
        permissions::TRAINING_WRITE,
    )
    .await?;
    if assignment.status != AssignmentStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Assignment is already {}",
            assignment.status
        )));
    }

    let questions = repo
        .questions(&state.pool, ctx.organization_id, assignment.test_id)
        .await?;
    let scored = score(&questions, &payload.answers)?;

    let now = Utc::now();
    let result = TestResult {
        id: TestResultId::new(),
        organization_id: ctx.organization_id,
        assignment_id: assignment.id,
        test_id: assignment.test_id,
        employee_id: assignment.employee_id,
        score: scored.score,
        max_score: scored.max_score,
        percentage: scored.percentage,
        interpretation: scored.interpretation,
        completed_at: now,
    };

    let mut tx = begin_transaction(&state.pool).await?;
    if !repo.complete_assignment(&mut tx, assignment.id, now).await? {
        return Err(AppError::Conflict("Assignment was already submitted".into()));
    }
    let result = repo.insert_result(&mut tx, &result).await?;
    let mut answers = Vec::with_capacity(scored.answers.len());
    for answer in scored.answers {
        let stored = StoredAnswer {
            result_id: result.id,
            question_id: answer.question_id,
            answer: answer.answer,
            points: answer.points,
        };
        repo.insert_answer(&mut tx, &stored).await?;
        answers.push(stored);
    }
    commit_transaction(tx).await?;

    tracing::info!(
        assignment_id = %assignment.id,
        percentage = result.percentage,
        interpretation = %result.interpretation,
        "Psychometric test submitted"
    );
    Ok(created(SubmitTestResponse { result, answers }))
}

pub async fn list_results(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<ResultListQuery>,
) -> AppResult<Json<Vec<TestResult>>> {
    let employee_id: Option<EmployeeId> =
        parse_optional(query.employee_id.as_deref(), "employee_id")?;
    let test_id: Option<PsychometricTestId> = parse_optional(query.test_id.as_deref(), "test_id")?;
    require_read_self_or(&state.pool, &ctx, employee_id, permissions::TRAINING_READ).await?;

    let results = PsychometricRepository::new()
        .list_results(&state.pool, ctx.organization_id, employee_id, test_id)
        .await?;
    Ok(Json(results))
}
