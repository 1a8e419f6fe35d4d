//! Domain service for the product catalog and its stock levels.

use thiserror::Error;

use crate::models::product::{
    BulkStockReport, NewProduct, Product, ProductPatch, ProductQuery, ProductSortField,
    ProductStats, StockUpdate,
};
use crate::models::{Page, PageRequest};

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProductError {
    pub(crate) fn not_found() -> Self {
        Self::NotFound("Product not found".to_string())
    }

    pub(crate) fn name_taken() -> Self {
        Self::Conflict("Product with this name already exists".to_string())
    }
}

impl From<sea_orm::DbErr> for ProductError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProductError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            return Self::name_taken();
        }
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait ProductService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ProductError::Conflict`] when the name is taken (any case).
    async fn create(&self, product: NewProduct, created_by: i32) -> Result<Product, ProductError>;

    async fn get_by_id(&self, id: i32) -> Result<Product, ProductError>;

    async fn list(&self, query: ProductQuery) -> Result<Page<Product>, ProductError>;

    async fn update(&self, id: i32, patch: ProductPatch) -> Result<Product, ProductError>;

    async fn delete(&self, id: i32) -> Result<(), ProductError>;

    /// Applies a signed delta to the stock level.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::BadRequest`] if the result would be negative.
    async fn update_stock(&self, id: i32, quantity: i64) -> Result<Product, ProductError>;

    /// Best effort: every item is attempted and failures are reported, not
    /// rolled back.
    async fn bulk_update_stock(&self, updates: Vec<StockUpdate>) -> BulkStockReport;

    async fn search(
        &self,
        term: &str,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError>;

    async fn get_by_category(
        &self,
        category: &str,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError>;

    async fn get_in_stock(
        &self,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError>;

    async fn get_by_price_range(
        &self,
        min_price: f64,
        max_price: f64,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError>;

    /// In-stock products at or below `threshold`. The page metadata describes
    /// the in-stock listing the items were filtered from.
    async fn get_low_stock(
        &self,
        threshold: i64,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError>;

    async fn get_categories(&self) -> Result<Vec<String>, ProductError>;

    async fn get_stats(&self) -> Result<ProductStats, ProductError>;
}
