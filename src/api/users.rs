use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation;
use super::{
    ApiError, ApiResponse, AppState, ChangePasswordRequest, ConfirmResetRequest, JsonBody,
    LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest, UpdateUserRequest,
    UserListParams,
};
use crate::models::user::User;

type UserResponse = Result<Json<ApiResponse<User>>, ApiError>;

/// `POST /api/users/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let new_user = validation::register(&payload)?;
    let user = state.users().register(new_user).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(user, "User registered successfully")),
    ))
}

/// `POST /api/users/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let (email, password) = validation::login(&payload)?;
    let result = state.users().login(&email, &password).await?;

    Ok(Json(ApiResponse::with_message(
        LoginResponse {
            user: result.user,
            token: result.token,
        },
        "Login successful",
    )))
}

/// `POST /api/users/reset-password`
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let email = validation::reset_request(&payload)?;
    state.users().reset_password(&email).await?;

    Ok(Json(ApiResponse::with_message(
        (),
        "Password reset email sent successfully",
    )))
}

/// `POST /api/users/reset-password/confirm`
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<ConfirmResetRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let (token, new_password) = validation::confirm_reset(&payload)?;
    state
        .users()
        .confirm_password_reset(&token, &new_password)
        .await?;

    Ok(Json(ApiResponse::with_message(
        (),
        "Password has been reset successfully",
    )))
}

/// `GET /api/users/profile`
pub async fn get_profile(CurrentUser(user): CurrentUser) -> UserResponse {
    Ok(Json(ApiResponse::with_message(
        user,
        "Profile retrieved successfully",
    )))
}

/// `PUT /api/users/profile`
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> UserResponse {
    let patch = validation::user_update(&payload)?;
    let updated = state.users().update_profile(user.id, patch).await?;

    Ok(Json(ApiResponse::with_message(
        updated,
        "Profile updated successfully",
    )))
}

/// `PUT /api/users/change-password`
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let (old_password, new_password) = validation::change_password(&payload)?;
    state
        .users()
        .change_password(user.id, &old_password, &new_password)
        .await?;

    Ok(Json(ApiResponse::with_message(
        (),
        "Password changed successfully",
    )))
}

/// `GET /api/users`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserListParams>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let query = validation::user_query(&params)?;
    let page = state.users().list(query).await?;

    Ok(Json(ApiResponse::paginated(
        page,
        "Users retrieved successfully",
    )))
}

/// `GET /api/users/{id}`
pub async fn get_user(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> UserResponse {
    let id = validation::parse_id(&id)?;
    let user = state.users().get_by_id(id).await?;

    Ok(Json(ApiResponse::with_message(
        user,
        "User retrieved successfully",
    )))
}

/// `PUT /api/users/{id}`
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> UserResponse {
    let id = validation::parse_id(&id)?;
    let patch = validation::user_update(&payload)?;
    let user = state.users().update(id, patch).await?;

    Ok(Json(ApiResponse::with_message(
        user,
        "User updated successfully",
    )))
}

/// `DELETE /api/users/{id}`
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validation::parse_id(&id)?;
    state.users().delete(id).await?;

    Ok(Json(ApiResponse::with_message((), "User deleted successfully")))
}

/// `PUT /api/users/{id}/deactivate`
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> UserResponse {
    let id = validation::parse_id(&id)?;
    let user = state.users().deactivate(id).await?;

    Ok(Json(ApiResponse::with_message(
        user,
        "User deactivated successfully",
    )))
}

/// `PUT /api/users/{id}/activate`
pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> UserResponse {
    let id = validation::parse_id(&id)?;
    let user = state.users().activate(id).await?;

    Ok(Json(ApiResponse::with_message(
        user,
        "User activated successfully",
    )))
}
