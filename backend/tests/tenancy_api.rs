use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

mod support;

use support::{
    add_member, create_employee, register, send, send_raw, str_field, test_app, EMPLOYEE_ROLE_ID,
};

#[sqlx::test(migrations = "./migrations")]
async fn tenant_routes_require_bearer_token(pool: PgPool) {
    let app = test_app(pool);

    let (status, body) = send(&app, Method::GET, "/api/employees", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "./migrations")]
async fn tenant_routes_require_organization_header(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;

    let request = axum::http::Request::builder()
        .uri("/api/employees")
        .header("Authorization", format!("Bearer {}", session.token))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let malformed = session.in_organization("not-a-uuid");
    let (status, _) = send(&app, Method::GET, "/api/employees", Some(&malformed), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn foreign_organization_is_forbidden(pool: PgPool) {
    let app = test_app(pool);
    let acme = register(&app, "laura@acme.co", "900123456").await;
    let globex = register(&app, "pedro@globex.co", "800111222").await;

    let intruder = acme.in_organization(&globex.organization_id);
    let (status, body) = send(&app, Method::GET, "/api/employees", Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "./migrations")]
async fn records_of_other_tenants_are_not_found(pool: PgPool) {
    let app = test_app(pool);
    let acme = register(&app, "laura@acme.co", "900123456").await;
    let globex = register(&app, "pedro@globex.co", "800111222").await;

    let employee = create_employee(&app, &acme, "EMP-001", 3_000_000.0).await;
    let uri = format!("/api/employees/{}", str_field(&employee, "id"));

    let (status, _) = send(&app, Method::GET, &uri, Some(&acme), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &uri, Some(&globex), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&globex),
        Some(json!({ "first_name": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = send(&app, Method::GET, "/api/employees", Some(&globex), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn same_employee_number_is_allowed_in_different_tenants(pool: PgPool) {
    let app = test_app(pool);
    let acme = register(&app, "laura@acme.co", "900123456").await;
    let globex = register(&app, "pedro@globex.co", "800111222").await;

    create_employee(&app, &acme, "EMP-001", 3_000_000.0).await;
    create_employee(&app, &globex, "EMP-001", 3_000_000.0).await;
}

#[sqlx::test(migrations = "./migrations")]
async fn employee_role_lacks_write_permissions(pool: PgPool) {
    let app = test_app(pool);
    let owner = register(&app, "laura@acme.co", "900123456").await;
    let member = add_member(&app, &owner, "camilo@acme.co", EMPLOYEE_ROLE_ID).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/employees",
        Some(&member),
        Some(support::employee_payload("EMP-002", 2_000_000.0)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let response = send_raw(&app, Method::GET, "/api/payroll", Some(&member), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn custom_roles_are_scoped_to_their_organization(pool: PgPool) {
    let app = test_app(pool);
    let acme = register(&app, "laura@acme.co", "900123456").await;
    let globex = register(&app, "pedro@globex.co", "800111222").await;

    let (status, role) = send(
        &app,
        Method::POST,
        "/api/admin/roles",
        Some(&acme),
        Some(json!({ "name": "auditor", "permissions": ["payroll:read"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{role}");
    assert_eq!(role["builtin"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/roles",
        Some(&acme),
        Some(json!({ "name": "broken", "permissions": ["payroll:delete"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, roles) = send(&app, Method::GET, "/api/admin/roles", Some(&globex), None).await;
    let names: Vec<&str> = roles
        .as_array()
        .expect("roles")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert!(names.contains(&"admin"));
    assert!(!names.contains(&"auditor"));
}

const ADMIN_ROLE_ID: &str = "00000000-0000-4000-8000-000000000001";

#[sqlx::test(migrations = "./migrations")]
async fn builtin_roles_are_read_only(pool: PgPool) {
    let app = test_app(pool);
    let acme = register(&app, "laura@acme.co", "900123456").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/roles/{ADMIN_ROLE_ID}/permissions"),
        Some(&acme),
        Some(json!({ "permissions": ["payroll:read"] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (_, role) = send(
        &app,
        Method::POST,
        "/api/admin/roles",
        Some(&acme),
        Some(json!({ "name": "nomina", "permissions": ["payroll:read"] })),
    )
    .await;
    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/roles/{}/permissions", str_field(&role, "id")),
        Some(&acme),
        Some(json!({ "permissions": ["payroll:read", "payroll:write"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
}

#[sqlx::test(migrations = "./migrations")]
async fn membership_rules_are_enforced(pool: PgPool) {
    let app = test_app(pool);
    let acme = register(&app, "laura@acme.co", "900123456").await;
    let member = add_member(&app, &acme, "camilo@acme.co", EMPLOYEE_ROLE_ID).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/members",
        Some(&acme),
        Some(json!({ "email": "CAMILO@acme.co", "role_id": EMPLOYEE_ROLE_ID })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/members",
        Some(&acme),
        Some(json!({ "email": "nadie@acme.co", "role_id": EMPLOYEE_ROLE_ID })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, members) = send(&app, Method::GET, "/api/admin/members", Some(&acme), None).await;
    let members = members.as_array().expect("members");
    assert_eq!(members.len(), 2);
    let membership_of = |user_id: &str| {
        members
            .iter()
            .find(|m| m["user_id"] == user_id)
            .map(|m| str_field(m, "membership_id").to_string())
            .expect("membership")
    };

    let owner_uri = format!("/api/admin/members/{}", membership_of(&acme.user_id));
    let (status, _) = send(&app, Method::DELETE, &owner_uri, Some(&acme), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let member_uri = format!("/api/admin/members/{}", membership_of(&member.user_id));
    let (status, _) = send(&app, Method::DELETE, &member_uri, Some(&acme), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/api/employees", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn users_manage_their_organizations(pool: PgPool) {
    let app = test_app(pool);
    let acme = register(&app, "laura@acme.co", "900123456").await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/organizations",
        Some(&acme),
        Some(json!({ "name": "Acme Logística", "nit": "901555444-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/organizations",
        Some(&acme),
        Some(json!({ "name": "Copia", "nit": "901555444-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, mine) = send(&app, Method::GET, "/api/organizations", Some(&acme), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().map(Vec::len), Some(2));

    // The creator owns the new organization and can work in it.
    let logistics = acme.in_organization(str_field(&created, "id"));
    let (status, current) = send(&app, Method::GET, "/api/organizations/current", Some(&logistics), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["nit"], "901555444-1");

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/api/organizations/current",
        Some(&logistics),
        Some(json!({ "name": "Acme Logística S.A.S.", "phone": "6045551234" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["name"], "Acme Logística S.A.S.");
}

#[sqlx::test(migrations = "./migrations")]
async fn only_owners_and_admins_update_current_organization(pool: PgPool) {
    let app = test_app(pool);
    let acme = register(&app, "laura@acme.co", "900123456").await;
    let member = add_member(&app, &acme, "camilo@acme.co", EMPLOYEE_ROLE_ID).await;

    let (status, current) = send(&app, Method::GET, "/api/organizations/current", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["id"], acme.organization_id.as_str());

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/organizations/current",
        Some(&member),
        Some(json!({ "name": "Tomada" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn system_listing_requires_system_admin(pool: PgPool) {
    let app = test_app(pool.clone());
    let acme = register(&app, "laura@acme.co", "900123456").await;
    register(&app, "pedro@globex.co", "800111222").await;

    let (status, body) = send(&app, Method::GET, "/api/system/organizations", Some(&acme), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    sqlx::query("UPDATE users SET is_system_admin = TRUE WHERE id = $1")
        .bind(&acme.user_id)
        .execute(&pool)
        .await
        .expect("promote to system admin");

    let (status, all) = send(&app, Method::GET, "/api/system/organizations", Some(&acme), None).await;
    assert_eq!(status, StatusCode::OK, "{all}");
    assert_eq!(all.as_array().map(Vec::len), Some(2));
}
