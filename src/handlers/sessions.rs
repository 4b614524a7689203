use crate::errors::ApiError;
use crate::handlers::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.sessions.list().await?))
}

/// Deleting a session immediately revokes its token (forced logout).
pub async fn delete(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.sessions.delete_by_token(&token).await?;
    Ok(Json(MessageResponse::new("Session revoked")))
}
