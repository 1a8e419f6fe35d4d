use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation;
use super::{
    ApiError, ApiResponse, AppState, CompatibilityRequest, IosMatrixResponse, JsonBody,
    VersionResponse,
};
use crate::models::compatibility::{CompatibilityEntry, MatrixView};

type EntryResponse = Result<Json<ApiResponse<CompatibilityEntry>>, ApiError>;
type EntriesResponse = Result<Json<ApiResponse<Vec<CompatibilityEntry>>>, ApiError>;

/// `POST /api/compatibilities`
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<CompatibilityRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CompatibilityEntry>>), ApiError> {
    let entry = validation::new_compatibility(&payload)?;
    let created = state.compatibility().create(entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            created,
            "Compatibility entry created successfully",
        )),
    ))
}

/// `GET /api/compatibilities`
pub async fn list_entries(State(state): State<Arc<AppState>>) -> EntriesResponse {
    let entries = state.compatibility().get_all().await?;

    Ok(Json(ApiResponse::with_message(
        entries,
        "All compatibility entries retrieved successfully",
    )))
}

/// `GET /api/compatibilities/web-app`
pub async fn web_app(State(state): State<Arc<AppState>>) -> EntriesResponse {
    let entries = state.compatibility().get_all().await?;

    Ok(Json(ApiResponse::with_message(
        entries,
        "Compatibility data retrieved successfully",
    )))
}

/// `GET /api/compatibilities/ios-app`
///
/// Same listing as the web variant plus the matrix version, read in one
/// transaction so the two always agree.
pub async fn ios_app(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IosMatrixResponse>, ApiError> {
    let matrix = state.compatibility().get_all_with_version().await?;

    Ok(Json(IosMatrixResponse {
        success: true,
        message: "Compatibility data retrieved successfully".to_string(),
        version: matrix.version,
        data: matrix.data,
    }))
}

/// `GET /api/compatibilities/version`
pub async fn version(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<VersionResponse>>, ApiError> {
    let version = state.compatibility().get_version().await?;

    Ok(Json(ApiResponse::with_message(
        VersionResponse { version },
        "Version retrieved successfully",
    )))
}

/// `GET /api/compatibilities/matrix`
pub async fn matrix_view(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<MatrixView>>, ApiError> {
    let view = state.compatibility().get_matrix_view().await?;

    Ok(Json(ApiResponse::with_message(
        view,
        "Compatibility matrix retrieved successfully",
    )))
}

/// `GET /api/compatibilities/metals`
pub async fn referenced_metals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let metals = state.compatibility().get_unique_metals().await?;

    Ok(Json(ApiResponse::with_message(
        metals,
        "Unique metals retrieved successfully",
    )))
}

/// `GET /api/compatibilities/{id}`
pub async fn get_entry(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> EntryResponse {
    let id = validation::parse_id(&id)?;
    let entry = state.compatibility().get_by_id(id).await?;

    Ok(Json(ApiResponse::with_message(
        entry,
        "Compatibility entry retrieved successfully",
    )))
}

/// `PUT /api/compatibilities/{id}`
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<CompatibilityRequest>,
) -> EntryResponse {
    let id = validation::parse_id(&id)?;
    let patch = validation::compatibility_patch(&payload)?;
    let entry = state.compatibility().update(id, patch).await?;

    Ok(Json(ApiResponse::with_message(
        entry,
        "Compatibility entry updated successfully",
    )))
}

/// `DELETE /api/compatibilities/{id}`
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validation::parse_id(&id)?;
    state.compatibility().delete(id).await?;

    Ok(Json(ApiResponse::with_message(
        (),
        "Compatibility entry deleted successfully",
    )))
}
