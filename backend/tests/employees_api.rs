use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

mod support;

use support::{
    add_member, create_employee, employee_payload, register, send, str_field, test_app,
    EMPLOYEE_ROLE_ID,
};

#[sqlx::test(migrations = "./migrations")]
async fn create_employee_normalizes_and_rejects_duplicates(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;

    let mut payload = employee_payload("EMP-001", 3_200_000.0);
    payload["email"] = json!("  Andres.Mejia@Empresa.CO ");
    let (status, employee) = send(&app, Method::POST, "/api/employees", Some(&session), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{employee}");
    assert_eq!(employee["email"], "andres.mejia@empresa.co");
    assert_eq!(employee["status"], "active");
    assert_eq!(employee["organization_id"], session.organization_id.as_str());

    let mut duplicate = employee_payload("EMP-001", 1_000_000.0);
    duplicate["email"] = json!("otro@empresa.co");
    let (status, body) = send(&app, Method::POST, "/api/employees", Some(&session), Some(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Employee number already exists");
}

#[sqlx::test(migrations = "./migrations")]
async fn create_employee_validates_payload(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;

    let mut payload = employee_payload("EMP-001", -5.0);
    payload["document_number"] = json!("12.3");
    let (status, body) = send(&app, Method::POST, "/api/employees", Some(&session), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let mut payload = employee_payload("EMP-002", 2_000_000.0);
    payload["department_id"] = json!(uuid::Uuid::new_v4().to_string());
    let (status, _) = send(&app, Method::POST, "/api/employees", Some(&session), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn list_employees_filters_by_department_and_search(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;

    let (status, department) = send(
        &app,
        Method::POST,
        "/api/departments",
        Some(&session),
        Some(json!({ "name": "Talento Humano" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let department_id = str_field(&department, "id").to_string();

    let mut payload = employee_payload("EMP-001", 2_500_000.0);
    payload["department_id"] = json!(department_id);
    payload["first_name"] = json!("Valentina");
    send(&app, Method::POST, "/api/employees", Some(&session), Some(payload)).await;
    create_employee(&app, &session, "EMP-002", 2_500_000.0).await;

    let (_, all) = send(&app, Method::GET, "/api/employees", Some(&session), None).await;
    assert_eq!(all["total"], 2);

    let uri = format!("/api/employees?department_id={department_id}");
    let (_, filtered) = send(&app, Method::GET, &uri, Some(&session), None).await;
    assert_eq!(filtered["total"], 1);
    assert_eq!(filtered["items"][0]["first_name"], "Valentina");

    let (_, searched) = send(&app, Method::GET, "/api/employees?search=valen", Some(&session), None).await;
    assert_eq!(searched["total"], 1);

    let (status, _) = send(&app, Method::GET, "/api/employees?status=retired", Some(&session), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/departments/{department_id}");
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_terminates_but_keeps_employee(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let employee = create_employee(&app, &session, "EMP-001", 2_500_000.0).await;
    let uri = format!("/api/employees/{}", str_field(&employee, "id"));

    let (status, terminated) = send(&app, Method::DELETE, &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(terminated["status"], "terminated");
    assert!(terminated["termination_date"].is_string());

    let (status, fetched) = send(&app, Method::GET, &uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "terminated");

    let (_, active) = send(&app, Method::GET, "/api/employees?status=active", Some(&session), None).await;
    assert_eq!(active["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn observations_and_interviews_belong_to_employee(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let employee = create_employee(&app, &session, "EMP-001", 2_500_000.0).await;
    let employee_id = str_field(&employee, "id");

    let uri = format!("/api/employees/{employee_id}/observations");
    let (status, observation) = send(
        &app,
        Method::POST,
        &uri,
        Some(&session),
        Some(json!({ "category": "positive", "content": "Lideró el cierre contable" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{observation}");
    assert_eq!(observation["author_id"], session.user_id.as_str());

    let (_, observations) = send(&app, Method::GET, &uri, Some(&session), None).await;
    assert_eq!(observations.as_array().map(Vec::len), Some(1));

    let uri = format!("/api/employees/{employee_id}/interviews");
    let (status, interview) = send(
        &app,
        Method::POST,
        &uri,
        Some(&session),
        Some(json!({ "interview_type": "seguimiento", "scheduled_at": "2024-05-10T15:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{interview}");
    assert_eq!(interview["status"], "scheduled");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/interviews/{}", str_field(&interview, "id")),
        Some(&session),
        Some(json!({ "status": "completed", "outcome": "Plan de carrera acordado" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");
}

#[sqlx::test(migrations = "./migrations")]
async fn interview_updates_are_scoped_and_permissioned(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let other = register(&app, "pedro@globex.co", "800111222").await;
    let member = add_member(&app, &session, "camilo@acme.co", EMPLOYEE_ROLE_ID).await;
    let employee = create_employee(&app, &session, "EMP-001", 2_500_000.0).await;

    let (_, interview) = send(
        &app,
        Method::POST,
        &format!("/api/employees/{}/interviews", str_field(&employee, "id")),
        Some(&session),
        Some(json!({ "interview_type": "retiro", "scheduled_at": "2024-06-03T14:00:00Z" })),
    )
    .await;
    let uri = format!("/api/interviews/{}", str_field(&interview, "id"));
    let cancel = json!({ "status": "cancelled", "notes": "El colaborador reprogramó" });

    let (status, _) = send(&app, Method::PUT, &uri, Some(&other), Some(cancel.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, &uri, Some(&member), Some(cancel.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(&app, Method::PUT, &uri, Some(&session), Some(cancel)).await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["status"], "cancelled");
    assert_eq!(updated["notes"], "El colaborador reprogramó");
}
