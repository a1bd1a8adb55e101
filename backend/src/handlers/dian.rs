//! DIAN electronic payroll: validation, submission and XML export.

use axum::{
    extract::{Extension, Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    handlers::common::parse_optional,
    middleware::OrgContext,
    models::{
        dian::{
            DianSubmission, DianSubmissionQuery, DianSubmissionStatus, DianSubmitResponse,
            DianValidationResponse,
        },
        payroll::PayrollStatus,
        rbac::permissions,
    },
    repositories::{
        begin_transaction, commit_transaction, DianSubmissionRepository, EmployeeRepository,
        OrganizationRepository, PayrollRepository,
    },
    services::dian::{document_number, validate_document, PayrollDocument, PREVIEW_NUMBER},
    state::AppState,
    types::{DianSubmissionId, PayrollId},
};

pub async fn validate_payroll(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PayrollId>,
) -> AppResult<Json<DianValidationResponse>> {
    ctx.require(permissions::PAYROLL_READ)?;
    let payroll = PayrollRepository::new()
        .find_by_id(&state.pool, ctx.organization_id, id)
        .await?;
    let organization = OrganizationRepository::new()
        .find_by_id(&state.pool, ctx.organization_id)
        .await?;
    let employee = EmployeeRepository::new()
        .fetch(&state.pool, ctx.organization_id, payroll.employee_id)
        .await?;

    Ok(Json(DianValidationResponse::from_errors(validate_document(
        &organization,
        &employee,
        &payroll,
    ))))
}

/// Numbers, signs and sends the payroll; the outcome is stored atomically.
pub async fn submit_payroll(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PayrollId>,
) -> AppResult<Json<DianSubmitResponse>> {
    ctx.require(permissions::DIAN_SUBMIT)?;
    let settings = &state.config.dian;
    let payrolls = PayrollRepository::new();

    let mut tx = begin_transaction(&state.pool).await?;
    let mut payroll = payrolls
        .find_for_update(&mut tx, ctx.organization_id, id)
        .await?;
    let organization = OrganizationRepository::new()
        .find_by_id(&mut *tx, ctx.organization_id)
        .await?;
    let employee = EmployeeRepository::new()
        .fetch(&mut *tx, ctx.organization_id, payroll.employee_id)
        .await?;

    let errors = validate_document(&organization, &employee, &payroll);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    payroll
        .transition(PayrollStatus::Submitted)
        .map_err(AppError::Conflict)?;

    let sequence = payrolls.next_document_sequence(&mut tx).await?;
    let number = document_number(&settings.document_prefix, sequence);
    let document = PayrollDocument::new(
        &organization,
        &employee,
        &payroll,
        number,
        Utc::now(),
        &state.config.time_zone,
    );
    let request = document.to_request(settings);

    let response = state.dian_client.submit(&request).await?;
    let accepted = response.is_accepted();
    tracing::info!(
        payroll_id = %payroll.id,
        document_number = %request.document_number,
        code = %response.code,
        accepted,
        "DIAN submission answered"
    );

    let submission = DianSubmission {
        id: DianSubmissionId::new(),
        organization_id: ctx.organization_id,
        payroll_id: payroll.id,
        document_number: request.document_number.clone(),
        cune: request.cune.clone(),
        status: if accepted {
            DianSubmissionStatus::Accepted
        } else {
            DianSubmissionStatus::Rejected
        },
        response_code: response.code,
        response_message: response.message,
        tracking_id: response.tracking_id,
        xml_document: request.xml,
        submitted_at: Utc::now(),
    };
    let submission = DianSubmissionRepository::new()
        .insert(&mut *tx, &submission)
        .await?;

    let outcome = if accepted {
        PayrollStatus::Accepted
    } else {
        PayrollStatus::Rejected
    };
    payroll.transition(outcome).map_err(AppError::Conflict)?;
    payroll.dian_document_number = Some(request.document_number);
    payroll.cune = accepted.then_some(request.cune);
    let payroll = payrolls.update_state(&mut *tx, &payroll).await?;
    commit_transaction(tx).await?;

    Ok(Json(DianSubmitResponse {
        submission,
        payroll_status: payroll.status,
    }))
}

/// Returns the last submitted document, or renders a preview when the payroll
/// was never submitted.
pub async fn payroll_xml(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<PayrollId>,
) -> AppResult<impl IntoResponse> {
    ctx.require(permissions::PAYROLL_READ)?;
    let payroll = PayrollRepository::new()
        .find_by_id(&state.pool, ctx.organization_id, id)
        .await?;

    let submitted = DianSubmissionRepository::new()
        .latest_for_payroll(&state.pool, ctx.organization_id, payroll.id)
        .await?;
    let xml = match submitted {
        Some(submission) => submission.xml_document,
        None => {
            let organization = OrganizationRepository::new()
                .find_by_id(&state.pool, ctx.organization_id)
                .await?;
            let employee = EmployeeRepository::new()
                .fetch(&state.pool, ctx.organization_id, payroll.employee_id)
                .await?;
            PayrollDocument::new(
                &organization,
                &employee,
                &payroll,
                PREVIEW_NUMBER.to_string(),
                Utc::now(),
                &state.config.time_zone,
            )
            .to_request(&state.config.dian)
            .xml
        }
    };

    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<DianSubmissionQuery>,
) -> AppResult<Json<Vec<DianSubmission>>> {
    ctx.require(permissions::PAYROLL_READ)?;
    let payroll_id: Option<PayrollId> = parse_optional(query.payroll_id.as_deref(), "payroll_id")?;
    let submissions = DianSubmissionRepository::new()
        .list(&state.pool, ctx.organization_id, payroll_id)
        .await?;
    Ok(Json(submissions))
}
