use crate::auth::AuthUser;
use crate::entities::{user, Role};
use crate::errors::ApiError;
use crate::handlers::{client_ip, user_agent};
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: user::Model,
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let (token, user) = state
        .auth
        .login(
            &payload.username,
            &payload.password,
            &client_ip(&headers),
            &user_agent(&headers),
        )
        .await?;
    Ok(Json(AuthResponse { token, user }))
}

/// Registers an account and logs it straight in. Requesting an elevated
/// role only works with a valid ADMIN bearer token on the request.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let acting = acting_user(&state, &headers).await;
    let user = state
        .auth
        .register(
            &payload.username,
            &payload.password,
            payload.role,
            acting.as_ref(),
        )
        .await?;
    let token = state
        .auth
        .issue_session(&user, &client_ip(&headers), &user_agent(&headers))
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// This endpoint is public; a bearer token is optional and only consulted
/// for role elevation. Invalid tokens are treated as absent.
async fn acting_user(state: &AppState, headers: &HeaderMap) -> Option<AuthUser> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))?;
    state.auth.validate_token(token.trim()).await.ok()
}
