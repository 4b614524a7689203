use crate::errors::ApiError;
use crate::handlers::MessageResponse;
use crate::services::milk_purchases::MilkPurchaseInput;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.milk_purchases.list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.milk_purchases.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<MilkPurchaseInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.services.milk_purchases.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<MilkPurchaseInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.milk_purchases.update(id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.milk_purchases.delete(id).await?;
    Ok(Json(MessageResponse::new("Milk purchase deleted")))
}
