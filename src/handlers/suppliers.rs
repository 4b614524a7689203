use crate::errors::ApiError;
use crate::handlers::MessageResponse;
use crate::services::suppliers::SupplierInput;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.suppliers.list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.suppliers.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<SupplierInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.services.suppliers.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<SupplierInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.suppliers.update(id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.suppliers.delete(id).await?;
    Ok(Json(MessageResponse::new("Supplier deleted")))
}
