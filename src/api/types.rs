use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::models::Page;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            pagination: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn paginated(page: Page<T>, message: impl Into<String>) -> Self {
        let pagination = Pagination::of(&page);
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(page.items),
            pagination: Some(pagination),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub const fn of<T>(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages(),
            has_next: page.has_next(),
            has_prev: page.has_prev(),
        }
    }
}

/// JSON body extractor whose rejections use the API error envelope.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Shared listing parameters, kept as raw strings so bad values surface as
/// field errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

// Users

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResetRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    #[serde(flatten)]
    pub page: PageParams,
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: crate::models::user::User,
    pub token: String,
}

// Products

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub stock: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StockItemRequest {
    pub id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkStockRequest {
    pub updates: Option<Vec<StockItemRequest>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    #[serde(flatten)]
    pub page: PageParams,
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub in_stock: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(flatten)]
    pub page: PageParams,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeParams {
    #[serde(flatten)]
    pub page: PageParams,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
    #[serde(flatten)]
    pub page: PageParams,
    pub threshold: Option<String>,
}

// Metals

#[derive(Debug, Deserialize)]
pub struct MetalRequest {
    pub name: Option<String>,
}

// Compatibility matrix

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRequest {
    /// Metal id as sent by clients.
    pub metal: String,
    pub is_compatible: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityRequest {
    pub chemical_name: Option<String>,
    pub compatibilities: Option<Vec<PairRequest>>,
}

#[derive(Debug, Serialize)]
pub struct IosMatrixResponse {
    pub success: bool,
    pub message: String,
    pub version: i64,
    pub data: Vec<crate::models::compatibility::CompatibilityEntry>,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: i64,
}
