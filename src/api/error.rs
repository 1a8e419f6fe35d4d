use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::services::{
    AuthError, CompatibilityError, MetalError, ProductError, UserError,
};

/// Field name to the messages collected for it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub enum ApiError {
    Validation(FieldErrors),

    BadRequest(String),

    Unauthorized(String),

    Forbidden(String),

    NotFound(String),

    Conflict(String),

    DatabaseError(String),

    InternalError(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    message: String,
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "Validation failed: {errors:?}"),
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(errors),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    None,
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            status_code: status.as_u16(),
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn field(field: &str, msg: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::from([(field.to_string(), vec![msg.into()])]))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired | AuthError::InvalidToken => Self::Unauthorized(err.to_string()),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(msg) => Self::NotFound(msg),
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::BadRequest(msg) => Self::BadRequest(msg),
            UserError::Unauthorized(msg) => Self::Unauthorized(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(msg) => Self::NotFound(msg),
            ProductError::Conflict(msg) => Self::Conflict(msg),
            ProductError::BadRequest(msg) => Self::BadRequest(msg),
            ProductError::Database(msg) => Self::DatabaseError(msg),
            ProductError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<MetalError> for ApiError {
    fn from(err: MetalError) -> Self {
        match err {
            MetalError::NotFound(msg) => Self::NotFound(msg),
            MetalError::Conflict(msg) => Self::Conflict(msg),
            MetalError::Database(msg) => Self::DatabaseError(msg),
            MetalError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<CompatibilityError> for ApiError {
    fn from(err: CompatibilityError) -> Self {
        match err {
            CompatibilityError::NotFound(msg) => Self::NotFound(msg),
            CompatibilityError::Conflict(msg) => Self::Conflict(msg),
            CompatibilityError::Database(msg) => Self::DatabaseError(msg),
            CompatibilityError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let (status, json) = body_json(ApiError::Conflict("taken".to_string())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "taken");
        assert_eq!(json["statusCode"], 409);
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_validation_envelope_lists_fields() {
        let (status, json) = body_json(ApiError::field("email", "Invalid email format")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(json["errors"]["email"][0], "Invalid email format");
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let (status, json) = body_json(ApiError::internal("disk on fire")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Internal Server Error");
    }
}
