use crate::auth::AuthUser;
use crate::entities::Role;
use crate::errors::ApiError;
use crate::handlers::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct RoleUpdateRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordUpdateRequest {
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: crate::entities::user::Model,
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.users.list().await?))
}

/// Current account, re-read from the database so role or profile changes
/// made since login are reflected.
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.get(auth.user_id).await?;
    Ok(Json(MeResponse { user }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.users.get(id).await?))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.users.update_role(id, payload.role).await?))
}

/// ADMINs may reset anyone's password; everyone may change their own.
pub async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<PasswordUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    if auth.role != Role::Admin && auth.user_id != id {
        return Err(ApiError::ServiceError(crate::errors::ServiceError::Forbidden(
            "You may only change your own password".to_string(),
        )));
    }
    let hash = state.auth.hash_password(&payload.password)?;
    state.services.users.set_password_hash(id, hash).await?;
    Ok(Json(json!({ "message": "Password updated" })))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.users.delete(id, auth.user_id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
