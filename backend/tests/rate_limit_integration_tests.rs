use axum::{http::StatusCode, routing::post, Router};
use chrono::NaiveTime;
use hrm_backend::{
    config::{Config, DianSettings, PayrollSettings},
    middleware::rate_limit::create_auth_rate_limiter,
};
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;

fn test_config(rate_limit_ip_max_requests: u32, rate_limit_ip_window_seconds: u64) -> Config {
    Config {
        database_url: "test://".to_string(),
        database_max_connections: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        jwt_secret: "test-jwt-secret-32-chars-minimum!".to_string(),
        jwt_expiration_hours: 1,
        refresh_token_expiration_days: 7,
        time_zone: chrono_tz::America::Bogota,
        cors_allow_origins: vec!["http://localhost:3000".to_string()],
        rate_limit_enabled: true,
        rate_limit_ip_max_requests,
        rate_limit_ip_window_seconds,
        password_min_length: 8,
        workday_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        late_grace_minutes: 15,
        vacation_days_per_year: 15.0,
        payroll: PayrollSettings::default(),
        dian: DianSettings::default(),
    }
}

async fn spawn_rate_limited_app(config: Config) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let limiter = create_auth_rate_limiter(&config).expect("valid limiter config");

    let app = Router::new()
        .route("/api/auth/login", post(|| async { StatusCode::OK }))
        .route_layer(limiter);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );
    let handle = tokio::spawn(async move {
        server.await.expect("server should run");
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, handle)
}

#[tokio::test]
async fn rate_limit_blocks_after_burst() {
    let (addr, handle) = spawn_rate_limited_app(test_config(2, 2)).await;

    let client = reqwest::Client::new();
    let url = format!("http://{}/api/auth/login", addr);

    for _ in 0..2 {
        let resp = client.post(&url).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = client.post(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "RATE_LIMITED");

    handle.abort();
}

#[tokio::test]
async fn rate_limit_includes_headers() {
    let (addr, handle) = spawn_rate_limited_app(test_config(1, 2)).await;

    let client = reqwest::Client::new();
    let url = format!("http://{}/api/auth/login", addr);

    let _ = client.post(&url).send().await.unwrap();
    let resp = client.post(&url).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key("x-ratelimit-after"));
    assert!(resp.headers().contains_key("retry-after"));

    handle.abort();
}
