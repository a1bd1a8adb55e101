use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

mod support;

use support::{login, register, send, str_field, test_app, TEST_PASSWORD};

#[sqlx::test(migrations = "./migrations")]
async fn register_creates_owner_membership(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;

    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "laura@acme.co");
    assert!(me["user"].get("password_hash").is_none());
    let memberships = me["memberships"].as_array().expect("memberships");
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0]["organization_id"], session.organization_id.as_str());
    assert_eq!(memberships[0]["role_name"], "admin");
    assert_eq!(memberships[0]["is_owner"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn register_rejects_duplicate_email_and_nit(pool: PgPool) {
    let app = test_app(pool);
    register(&app, "laura@acme.co", "900123456").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "LAURA@acme.co",
            "password": TEST_PASSWORD,
            "full_name": "Laura Duplicada",
            "organization": { "name": "Otra", "nit": "800999888" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "pedro@acme.co",
            "password": TEST_PASSWORD,
            "full_name": "Pedro",
            "organization": { "name": "Acme bis", "nit": "900123456" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn register_validates_nit_and_password(pool: PgPool) {
    let app = test_app(pool);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "ana@acme.co",
            "password": TEST_PASSWORD,
            "full_name": "Ana",
            "organization": { "name": "Acme", "nit": "ABC" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "ana@acme.co",
            "password": "short",
            "full_name": "Ana",
            "organization": { "name": "Acme", "nit": "900123456" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn login_rejects_wrong_password(pool: PgPool) {
    let app = test_app(pool);
    register(&app, "laura@acme.co", "900123456").await;

    let (status, _) = login(&app, "laura@acme.co", "not-the-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = login(&app, "Laura@Acme.co", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["expires_in"].as_u64().unwrap_or_default() > 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn logout_revokes_access_token(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&session), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn refresh_token_is_single_use(pool: PgPool) {
    let app = test_app(pool);
    register(&app, "laura@acme.co", "900123456").await;
    let (_, auth) = login(&app, "laura@acme.co", TEST_PASSWORD).await;
    let refresh_token = str_field(&auth, "refresh_token").to_string();

    let (status, rotated) = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(str_field(&rotated, "refresh_token"), refresh_token);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn change_password_requires_current_password(pool: PgPool) {
    let app = test_app(pool);
    let session = register(&app, "laura@acme.co", "900123456").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/auth/change-password",
        Some(&session),
        Some(json!({ "current_password": "wrong-password", "new_password": "brand-new-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/auth/change-password",
        Some(&session),
        Some(json!({ "current_password": TEST_PASSWORD, "new_password": "brand-new-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&app, "laura@acme.co", "brand-new-secret").await;
    assert_eq!(status, StatusCode::OK);
}
