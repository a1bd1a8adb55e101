use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::get,
    Extension, Router,
};
use hrm_backend::middleware::request_id::{request_id, RequestId};
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    Router::new()
        .route(
            "/test",
            get(|Extension(id): Extension<RequestId>| async move { id.0 }),
        )
        .layer(from_fn(request_id))
}

async fn call(header: Option<(&str, &str)>) -> axum::response::Response {
    let mut builder = Request::builder().uri("/test");
    if let Some((name, value)) = header {
        builder = builder.header(name, value);
    }
    app()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn generated_request_id_is_a_uuid() {
    let response = call(None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn client_request_id_is_echoed_and_exposed_to_handlers() {
    let response = call(Some(("x-request-id", "client-req-123"))).await;

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "client-req-123"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"client-req-123");
}

#[tokio::test]
async fn correlation_id_is_used_when_request_id_missing() {
    let response = call(Some(("x-correlation-id", "corr-req-456"))).await;

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "corr-req-456"
    );
}

#[tokio::test]
async fn oversized_request_id_is_replaced() {
    let long = "a".repeat(200);
    let response = call(Some(("x-request-id", long.as_str()))).await;

    let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_ne!(id, long);
    assert!(Uuid::parse_str(id).is_ok());
}
