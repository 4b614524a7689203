#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use dairy_api::config::AppConfig;
use dairy_api::db::{self, DbConfig};
use dairy_api::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Builds the full application router over a fresh in-memory SQLite
/// database. A single connection keeps the in-memory database alive and
/// shared for the whole test.
pub async fn test_app() -> Router {
    let db_cfg = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        connect_timeout: Duration::from_secs(5),
        idle_timeout: Duration::from_secs(600),
        acquire_timeout: Duration::from_secs(5),
    };
    let pool = db::establish_connection_with_config(&db_cfg)
        .await
        .expect("connect to in-memory sqlite");
    db::run_migrations(&pool).await.expect("run migrations");

    let config = AppConfig::new(
        "sqlite::memory:".to_string(),
        "integration_test_signing_secret_0123456789".to_string(),
        3600,
        "127.0.0.1".to_string(),
        0,
        "development".to_string(),
    );
    dairy_api::app_router(AppState::new(Arc::new(pool), config))
}

/// Sends one request through the router and returns status plus parsed
/// JSON body (Null for empty bodies).
pub async fn request(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON body")
    };
    (status, value)
}

pub async fn register(
    app: &Router,
    username: &str,
    password: &str,
    role: Option<&str>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut payload = json!({ "username": username, "password": password });
    if let Some(role) = role {
        payload["role"] = json!(role);
    }
    request(app, "POST", "/api/auth/register", token, Some(payload)).await
}

pub async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

/// Registers the first account, which bootstraps as ADMIN, and returns
/// its bearer token.
pub async fn bootstrap_admin(app: &Router) -> String {
    let (status, body) = register(app, "admin", "admin-secret", None, None).await;
    assert_eq!(status, StatusCode::CREATED, "bootstrap register: {}", body);
    assert_eq!(body["user"]["role"], "ADMIN");
    body["token"].as_str().expect("token in response").to_string()
}

/// Registers an extra account with the given role using an admin token
/// and returns its bearer token.
pub async fn create_user_with_role(
    app: &Router,
    admin_token: &str,
    username: &str,
    role: &str,
) -> String {
    let (status, body) = register(app, username, "password1", Some(role), Some(admin_token)).await;
    assert_eq!(status, StatusCode::CREATED, "register {}: {}", username, body);
    assert_eq!(body["user"]["role"], role);
    body["token"].as_str().expect("token in response").to_string()
}
