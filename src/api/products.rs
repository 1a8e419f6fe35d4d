use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation;
use super::{
    ApiError, ApiResponse, AppState, BulkStockRequest, CreateProductRequest, JsonBody,
    LowStockParams, PageParams, PriceRangeParams, ProductListParams, SearchParams, StockRequest,
    UpdateProductRequest,
};
use crate::constants::products::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::models::product::{BulkStockReport, Product, ProductSortField, ProductStats};

type ProductResponse = Result<Json<ApiResponse<Product>>, ApiError>;
type ProductPageResponse = Result<Json<ApiResponse<Vec<Product>>>, ApiError>;

/// `POST /api/products`
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let product = validation::new_product(&payload)?;
    let created = state.products().create(product, user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            created,
            "Product created successfully",
        )),
    ))
}

/// `GET /api/products`
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProductListParams>,
) -> ProductPageResponse {
    let query = validation::product_query(&params)?;
    let page = state.products().list(query).await?;

    Ok(Json(ApiResponse::paginated(
        page,
        "Products retrieved successfully",
    )))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ProductResponse {
    let id = validation::parse_id(&id)?;
    let product = state.products().get_by_id(id).await?;

    Ok(Json(ApiResponse::with_message(
        product,
        "Product retrieved successfully",
    )))
}

/// `PUT /api/products/{id}`
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateProductRequest>,
) -> ProductResponse {
    let id = validation::parse_id(&id)?;
    let patch = validation::product_update(&payload)?;
    let product = state.products().update(id, patch).await?;

    Ok(Json(ApiResponse::with_message(
        product,
        "Product updated successfully",
    )))
}

/// `DELETE /api/products/{id}`
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validation::parse_id(&id)?;
    state.products().delete(id).await?;

    Ok(Json(ApiResponse::with_message(
        (),
        "Product deleted successfully",
    )))
}

/// `PUT /api/products/{id}/stock`
///
/// `quantity` is a signed delta; the stock may never go below zero.
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StockRequest>,
) -> ProductResponse {
    let id = validation::parse_id(&id)?;
    let quantity = validation::stock_quantity(payload.quantity)?;
    let product = state.products().update_stock(id, quantity).await?;

    Ok(Json(ApiResponse::with_message(
        product,
        "Product stock updated successfully",
    )))
}

/// `POST /api/products/bulk-update-stock`
pub async fn bulk_update_stock(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<BulkStockRequest>,
) -> Result<Json<ApiResponse<BulkStockReport>>, ApiError> {
    let updates = validation::bulk_stock(&payload)?;
    let report = state.products().bulk_update_stock(updates).await;

    Ok(Json(ApiResponse::with_message(
        report,
        "Bulk stock update completed",
    )))
}

/// `GET /api/products/search?q=`
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ProductPageResponse {
    let term = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Search term is required"))?;
    let page = validation::page_request::<ProductSortField>(&params.page)?;

    let results = state.products().search(term, page).await?;
    let message = format!("Search results for '{term}'");

    Ok(Json(ApiResponse::paginated(results, message)))
}

/// `GET /api/products/category/{category}`
pub async fn products_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> ProductPageResponse {
    let page = validation::page_request::<ProductSortField>(&params)?;
    let results = state.products().get_by_category(&category, page).await?;

    Ok(Json(ApiResponse::paginated(
        results,
        format!("Products in category '{category}' retrieved successfully"),
    )))
}

/// `GET /api/products/in-stock`
pub async fn in_stock_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> ProductPageResponse {
    let page = validation::page_request::<ProductSortField>(&params)?;
    let results = state.products().get_in_stock(page).await?;

    Ok(Json(ApiResponse::paginated(
        results,
        "In-stock products retrieved successfully",
    )))
}

/// `GET /api/products/price-range?minPrice=&maxPrice=`
pub async fn products_by_price_range(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceRangeParams>,
) -> ProductPageResponse {
    let (min_price, max_price) =
        validation::price_bounds(params.min_price.as_deref(), params.max_price.as_deref())?;
    let page = validation::page_request::<ProductSortField>(&params.page)?;

    let results = state
        .products()
        .get_by_price_range(min_price, max_price, page)
        .await?;

    Ok(Json(ApiResponse::paginated(
        results,
        format!("Products in price range {min_price} - {max_price} retrieved successfully"),
    )))
}

/// `GET /api/products/low-stock?threshold=`
pub async fn low_stock_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LowStockParams>,
) -> ProductPageResponse {
    let threshold =
        validation::threshold(params.threshold.as_deref(), DEFAULT_LOW_STOCK_THRESHOLD)?;
    let page = validation::page_request::<ProductSortField>(&params.page)?;

    let results = state.products().get_low_stock(threshold, page).await?;

    Ok(Json(ApiResponse::paginated(
        results,
        format!("Products with stock <= {threshold} retrieved successfully"),
    )))
}

/// `GET /api/products/categories`
pub async fn categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let categories = state.products().get_categories().await?;

    Ok(Json(ApiResponse::with_message(
        categories,
        "Categories retrieved successfully",
    )))
}

/// `GET /api/products/stats/overview`
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ProductStats>>, ApiError> {
    let stats = state.products().get_stats().await?;

    Ok(Json(ApiResponse::with_message(
        stats,
        "Product statistics retrieved successfully",
    )))
}
