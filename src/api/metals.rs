use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation;
use super::{ApiError, ApiResponse, AppState, JsonBody, MetalRequest};
use crate::models::metal::Metal;

/// `POST /api/metals`
pub async fn create_metal(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<MetalRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Metal>>), ApiError> {
    let name = validation::metal_name(&payload)?;
    let metal = state.metals().create(&name).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(metal, "Metal created successfully")),
    ))
}

/// `GET /api/metals`
pub async fn list_metals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Metal>>>, ApiError> {
    let metals = state.metals().get_all().await?;

    Ok(Json(ApiResponse::with_message(
        metals,
        "Metals retrieved successfully",
    )))
}

/// `GET /api/metals/{id}`
pub async fn get_metal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Metal>>, ApiError> {
    let id = validation::parse_id(&id)?;
    let metal = state.metals().get_by_id(id).await?;

    Ok(Json(ApiResponse::with_message(
        metal,
        "Metal retrieved successfully",
    )))
}

/// `PUT /api/metals/{id}`
pub async fn update_metal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<MetalRequest>,
) -> Result<Json<ApiResponse<Metal>>, ApiError> {
    let id = validation::parse_id(&id)?;
    let name = validation::metal_name(&payload)?;
    let metal = state.metals().update(id, &name).await?;

    Ok(Json(ApiResponse::with_message(
        metal,
        "Metal updated successfully",
    )))
}

/// `DELETE /api/metals/{id}`
pub async fn delete_metal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validation::parse_id(&id)?;
    state.metals().delete(id).await?;

    Ok(Json(ApiResponse::with_message((), "Metal deleted successfully")))
}
