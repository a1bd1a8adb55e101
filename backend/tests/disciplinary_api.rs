use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;

mod support;

use support::{create_employee, register, send, str_field, test_app, Session};

async fn open_case(app: &axum::Router, session: &Session, employee_id: &str) -> Value {
    let (status, case) = send(
        app,
        Method::POST,
        "/api/disciplinary",
        Some(session),
        Some(json!({
            "employee_id": employee_id,
            "title": "Inasistencia injustificada",
            "description": "No se presentó a laborar durante tres días consecutivos",
            "incident_date": "2024-02-12",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{case}");
    case
}

async fn step(app: &axum::Router, session: &Session, case_id: &str, action: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/api/disciplinary/{case_id}/{action}"),
        Some(session),
        Some(body),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn case_numbers_are_sequential_per_organization(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let employee = create_employee(&app, &session, "EMP-001", 2_000_000.0).await;
    let employee_id = str_field(&employee, "id");

    let first = open_case(&app, &session, employee_id).await;
    let second = open_case(&app, &session, employee_id).await;
    let first_number = str_field(&first, "case_number");
    assert!(first_number.starts_with("DC-"));
    assert!(first_number.ends_with("-0001"));
    assert!(str_field(&second, "case_number").ends_with("-0002"));
    assert_eq!(first["status"], "opened");

    let other = register(&app, "pedro@globex.co", "800111222").await;
    let foreign = create_employee(&app, &other, "EMP-001", 2_000_000.0).await;
    let case = open_case(&app, &other, str_field(&foreign, "id")).await;
    assert!(str_field(&case, "case_number").ends_with("-0001"));
}

#[sqlx::test(migrations = "./migrations")]
async fn due_process_leads_to_termination(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let employee = create_employee(&app, &session, "EMP-001", 2_000_000.0).await;
    let employee_id = str_field(&employee, "id");
    let case = open_case(&app, &session, employee_id).await;
    let case_id = str_field(&case, "id");

    let notification = json!({
        "method": "certified_mail",
        "recipient": "Calle 10 # 20-30, Medellín",
        "content": "Citación a descargos",
    });
    let (status, _) = step(&app, &session, case_id, "notifications", notification.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, charge) = step(
        &app,
        &session,
        case_id,
        "charges",
        json!({
            "description": "Abandono del cargo",
            "regulation_reference": "Reglamento interno, artículo 52",
            "severity": "very_serious",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{charge}");

    let (status, _) = step(&app, &session, case_id, "notifications", notification).await;
    assert_eq!(status, StatusCode::CREATED);

    // Sanctions wait for the employee's defense.
    let (status, _) = step(
        &app,
        &session,
        case_id,
        "sanctions",
        json!({ "sanction_type": "written_warning", "description": "Llamado de atención" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = step(
        &app,
        &session,
        case_id,
        "defense",
        json!({ "content": "Estuve incapacitado, adjunto soporte" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, termination) = step(
        &app,
        &session,
        case_id,
        "termination",
        json!({
            "termination_date": "2024-03-01",
            "reason": "Abandono del cargo comprobado",
            "with_just_cause": true,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{termination}");

    let (status, detail) = send(
        &app,
        Method::GET,
        &format!("/api/disciplinary/{case_id}"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "terminated");
    assert_eq!(detail["charges"].as_array().map(Vec::len), Some(1));
    assert_eq!(detail["notifications"].as_array().map(Vec::len), Some(1));
    assert_eq!(detail["defenses"].as_array().map(Vec::len), Some(1));
    assert_eq!(detail["termination"]["with_just_cause"], true);

    let (_, fetched) = send(
        &app,
        Method::GET,
        &format!("/api/employees/{employee_id}"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(fetched["status"], "terminated");
    assert_eq!(fetched["termination_date"], "2024-03-01");
}

#[sqlx::test(migrations = "./migrations")]
async fn closed_cases_reject_further_steps(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;
    let employee = create_employee(&app, &session, "EMP-001", 2_000_000.0).await;
    let employee_id = str_field(&employee, "id");
    let closed = open_case(&app, &session, employee_id).await;
    let open = open_case(&app, &session, employee_id).await;
    let case_id = str_field(&closed, "id");

    let close_uri = format!("/api/disciplinary/{case_id}/close");
    let (status, body) = send(
        &app,
        Method::PUT,
        &close_uri,
        Some(&session),
        Some(json!({ "resolution": "Se archiva por falta de mérito" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "closed");
    assert_eq!(body["resolution"], "Se archiva por falta de mérito");

    let (status, _) = send(&app, Method::PUT, &close_uri, Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = step(
        &app,
        &session,
        case_id,
        "charges",
        json!({ "description": "Falta leve", "severity": "minor" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Case is closed");

    let (_, listed) = send(&app, Method::GET, "/api/disciplinary?status=closed", Some(&session), None).await;
    let listed = listed.as_array().expect("cases");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], case_id);

    let (_, opened) = send(&app, Method::GET, "/api/disciplinary?status=opened", Some(&session), None).await;
    assert_eq!(opened[0]["id"], open["id"]);

    let (status, _) = send(&app, Method::GET, "/api/disciplinary?status=archived", Some(&session), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
