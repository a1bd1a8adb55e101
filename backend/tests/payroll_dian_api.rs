use axum::http::{header, Method, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;

mod support;

use support::{
    add_member, body_text, create_employee, employee_payload, register, send, send_raw, str_field,
    test_app, Session, EMPLOYEE_ROLE_ID,
};

async fn generate(app: &axum::Router, session: &Session, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/payroll/generate", Some(session), Some(body)).await
}

async fn put(app: &axum::Router, session: &Session, uri: &str) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(session), None).await
}

#[sqlx::test(migrations = "./migrations")]
async fn generate_single_payroll_computes_colombian_deductions(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let employee = create_employee(&app, &session, "EMP-001", 1_300_000.0).await;
    let employee_id = str_field(&employee, "id");

    let body = json!({
        "period_start": "2024-03-01",
        "period_end": "2024-03-31",
        "employee_id": employee_id,
    });
    let (status, response) = generate(&app, &session, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    let payroll = &response["generated"][0];
    assert_eq!(payroll["status"], "draft");
    assert_eq!(payroll["worked_days"], 30);
    assert_eq!(payroll["base_pay"], 1_300_000.0);
    assert_eq!(payroll["transport_allowance"], 162_000.0);
    assert_eq!(payroll["gross_pay"], 1_462_000.0);
    assert_eq!(payroll["health_deduction"], 52_000.0);
    assert_eq!(payroll["pension_deduction"], 52_000.0);
    assert_eq!(payroll["net_pay"], 1_358_000.0);

    let (status, _) = generate(&app, &session, body).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = generate(
        &app,
        &session,
        json!({ "period_start": "2024-03-31", "period_end": "2024-03-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn batch_generation_skips_existing_and_ignores_terminated(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let first = create_employee(&app, &session, "EMP-001", 4_000_000.0).await;
    create_employee(&app, &session, "EMP-002", 2_000_000.0).await;
    let leaver = create_employee(&app, &session, "EMP-003", 2_000_000.0).await;
    send(
        &app,
        Method::DELETE,
        &format!("/api/employees/{}", str_field(&leaver, "id")),
        Some(&session),
        None,
    )
    .await;

    generate(
        &app,
        &session,
        json!({
            "period_start": "2024-04-01",
            "period_end": "2024-04-30",
            "employee_id": str_field(&first, "id"),
        }),
    )
    .await;

    let (status, response) = generate(
        &app,
        &session,
        json!({ "period_start": "2024-04-01", "period_end": "2024-04-30" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    assert_eq!(response["generated"].as_array().map(Vec::len), Some(1));
    assert_eq!(response["skipped"].as_array().map(Vec::len), Some(1));
    assert_eq!(response["skipped"][0]["employee_id"], str_field(&first, "id"));

    let (_, payrolls) = send(&app, Method::GET, "/api/payroll?period_start=2024-04-01", Some(&session), None).await;
    assert_eq!(payrolls.as_array().map(Vec::len), Some(2));
}

#[sqlx::test(migrations = "./migrations")]
async fn approval_and_dian_submission_lifecycle(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456-7").await;
    let employee = create_employee(&app, &session, "EMP-001", 4_000_000.0).await;

    let (_, response) = generate(
        &app,
        &session,
        json!({
            "period_start": "2024-05-01",
            "period_end": "2024-05-31",
            "employee_id": str_field(&employee, "id"),
        }),
    )
    .await;
    let payroll_id = str_field(&response["generated"][0], "id").to_string();

    let preview = send_raw(
        &app,
        Method::GET,
        &format!("/api/dian/payroll/{payroll_id}/xml"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(preview.status(), StatusCode::OK);
    assert!(body_text(preview).await.contains("PREVIEW"));

    // Drafts are not submittable.
    let (status, validation) = send(
        &app,
        Method::POST,
        &format!("/api/dian/payroll/{payroll_id}/validate"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["valid"], false);
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/dian/payroll/{payroll_id}/submit"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, approved) = put(&app, &session, &format!("/api/payroll/{payroll_id}/approve")).await;
    assert_eq!(status, StatusCode::OK, "{approved}");
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by"], session.user_id.as_str());

    let (status, _) = put(&app, &session, &format!("/api/payroll/{payroll_id}/approve")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, submitted) = send(
        &app,
        Method::POST,
        &format!("/api/dian/payroll/{payroll_id}/submit"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{submitted}");
    assert_eq!(submitted["payroll_status"], "accepted");
    assert_eq!(submitted["submission"]["status"], "accepted");
    let document_number = str_field(&submitted["submission"], "document_number").to_string();
    assert!(document_number.starts_with("NE"));
    assert_eq!(str_field(&submitted["submission"], "cune").len(), 96);

    let (_, payroll) = send(&app, Method::GET, &format!("/api/payroll/{payroll_id}"), Some(&session), None).await;
    assert_eq!(payroll["dian_document_number"], document_number.as_str());
    assert_eq!(payroll["cune"], submitted["submission"]["cune"]);

    let response = send_raw(
        &app,
        Method::GET,
        &format!("/api/dian/payroll/{payroll_id}/xml"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/xml"));
    let xml = body_text(response).await;
    assert!(xml.contains("<NominaIndividual"));
    assert!(xml.contains(&document_number));
    let cune = str_field(&submitted["submission"], "cune");
    assert!(xml.contains(&format!("<CUNE>{cune}</CUNE>")));

    // Exporting again returns the same stored document.
    let again = send_raw(
        &app,
        Method::GET,
        &format!("/api/dian/payroll/{payroll_id}/xml"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(body_text(again).await, xml);

    let (_, submissions) = send(
        &app,
        Method::GET,
        &format!("/api/dian/submissions?payroll_id={payroll_id}"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(submissions.as_array().map(Vec::len), Some(1));

    let (status, paid) = put(&app, &session, &format!("/api/payroll/{payroll_id}/pay")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
    assert!(paid["paid_at"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn only_drafts_can_be_deleted(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let employee = create_employee(&app, &session, "EMP-001", 2_000_000.0).await;
    let employee_id = str_field(&employee, "id");

    let mut ids = Vec::new();
    for (start, end) in [("2024-06-01", "2024-06-30"), ("2024-07-01", "2024-07-31")] {
        let (_, response) = generate(
            &app,
            &session,
            json!({ "period_start": start, "period_end": end, "employee_id": employee_id }),
        )
        .await;
        ids.push(str_field(&response["generated"][0], "id").to_string());
    }
    put(&app, &session, &format!("/api/payroll/{}/approve", ids[1])).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/api/payroll/{}", ids[0]), Some(&session), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/payroll/{}", ids[1]), Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn export_returns_csv_for_period(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let employee = create_employee(&app, &session, "EMP-001", 1_300_000.0).await;
    generate(
        &app,
        &session,
        json!({
            "period_start": "2024-03-01",
            "period_end": "2024-03-31",
            "employee_id": str_field(&employee, "id"),
        }),
    )
    .await;

    let response = send_raw(
        &app,
        Method::GET,
        "/api/payroll/export?period_start=2024-03-01&period_end=2024-03-31",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    let csv = body_text(response).await;
    let mut lines = csv.lines();
    assert!(lines.next().unwrap_or_default().starts_with("\"employee_number\""));
    let row = lines.next().expect("one data row");
    assert!(row.contains("\"EMP-001\""));
    assert!(row.contains("\"1358000.00\""));
    assert_eq!(lines.next(), None);
}

#[sqlx::test(migrations = "./migrations")]
async fn linked_employee_needs_payroll_read_for_own_payroll(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let member = add_member(&app, &session, "camilo@acme.co", EMPLOYEE_ROLE_ID).await;

    let mut payload = employee_payload("EMP-010", 2_000_000.0);
    payload["user_id"] = json!(member.user_id);
    let (_, own) = send(&app, Method::POST, "/api/employees", Some(&session), Some(payload)).await;
    let employee_id = str_field(&own, "id");
    let (_, response) = generate(
        &app,
        &session,
        json!({ "period_start": "2024-03-01", "period_end": "2024-03-31", "employee_id": employee_id }),
    )
    .await;
    let payroll_id = str_field(&response["generated"][0], "id");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/payroll?employee_id={employee_id}"),
        Some(&member),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/payroll/{payroll_id}");
    let (status, _) = send(&app, Method::GET, &uri, Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
}
