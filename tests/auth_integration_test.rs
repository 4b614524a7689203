mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn first_registered_user_becomes_admin() {
    let app = test_app().await;
    let (status, body) = register(&app, "boss", "admin-secret", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "ADMIN");
    assert_eq!(body["user"]["username"], "boss");
    assert!(body["token"].is_string());
    // the password hash must never appear on the wire
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn later_registrations_default_to_user_role() {
    let app = test_app().await;
    bootstrap_admin(&app).await;

    let (status, body) = register(&app, "clerk", "password1", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "USER");
}

#[tokio::test]
async fn elevated_role_without_admin_token_is_downgraded() {
    let app = test_app().await;
    bootstrap_admin(&app).await;

    let (status, body) = register(&app, "sneaky", "password1", Some("MANAGER"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "USER");
}

#[tokio::test]
async fn admin_can_register_manager() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (status, body) =
        register(&app, "manager", "password1", Some("MANAGER"), Some(&admin)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "MANAGER");
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let app = test_app().await;
    bootstrap_admin(&app).await;

    let (status, body) = register(&app, "admin", "other-password", None, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("taken"));
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = test_app().await;
    bootstrap_admin(&app).await;

    let (status, body) = login(&app, "admin", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = login(&app, "nobody", "admin-secret").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_token_grants_access_to_me() {
    let app = test_app().await;
    bootstrap_admin(&app).await;

    let (status, body) = login(&app, "admin", "admin-secret").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = request(&app, "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "ADMIN");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app().await;
    bootstrap_admin(&app).await;

    let (status, body) = request(&app, "GET", "/api/suppliers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = request(&app, "GET", "/api/suppliers", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_role_cannot_write_but_manager_can() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;
    let user = create_user_with_role(&app, &admin, "clerk", "USER").await;
    let manager = create_user_with_role(&app, &admin, "manager", "MANAGER").await;

    let supplier = json!({ "name": "Karim", "phone": "+998901234567" });

    let (status, _) = request(
        &app,
        "POST",
        "/api/suppliers",
        Some(&user),
        Some(supplier.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &app,
        "POST",
        "/api/suppliers",
        Some(&manager),
        Some(supplier),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Karim");

    // reads stay open to plain users
    let (status, body) = request(&app, "GET", "/api/suppliers", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn user_administration_is_admin_only() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;
    let manager = create_user_with_role(&app, &admin, "manager", "MANAGER").await;

    let (status, _) = request(&app, "GET", "/api/users", Some(&manager), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(&app, "GET", "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn role_change_revokes_existing_sessions() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;
    let manager = create_user_with_role(&app, &admin, "manager", "MANAGER").await;

    let (_, users) = request(&app, "GET", "/api/users", Some(&admin), None).await;
    let manager_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "manager")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/users/{}/role", manager_id),
        Some(&admin),
        Some(json!({ "role": "USER" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "USER");

    // the old token carried a stale MANAGER claim and is now revoked
    let (status, _) = request(&app, "GET", "/api/users/me", Some(&manager), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_self_and_admin_rules() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;
    let user = create_user_with_role(&app, &admin, "clerk", "USER").await;

    let (_, users) = request(&app, "GET", "/api/users", Some(&admin), None).await;
    let users = users.as_array().unwrap().clone();
    let clerk_id = users.iter().find(|u| u["username"] == "clerk").unwrap()["id"]
        .as_i64()
        .unwrap();
    let admin_id = users.iter().find(|u| u["username"] == "admin").unwrap()["id"]
        .as_i64()
        .unwrap();

    // a plain user cannot change someone else's password
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/users/{}/password", admin_id),
        Some(&user),
        Some(json!({ "password": "hijacked1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // but may change their own
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/users/{}/password", clerk_id),
        Some(&user),
        Some(json!({ "password": "new-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = login(&app, "clerk", "password1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "clerk", "new-password").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_cannot_delete_own_account() {
    let app = test_app().await;
    let admin = bootstrap_admin(&app).await;

    let (_, body) = request(&app, "GET", "/api/users/me", Some(&admin), None).await;
    let admin_id = body["user"]["id"].as_i64().unwrap();

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/users/{}", admin_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn status_and_health_are_public() {
    let app = test_app().await;

    let (status, body) = request(&app, "GET", "/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
}
