use serde::Serialize;

use super::{PageRequest, SortField};

/// Public profile of the account that created a product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: i64,
    pub is_active: bool,
    pub created_by: Option<Creator>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSortField {
    Name,
    Price,
    Category,
    #[default]
    CreatedAt,
    Stock,
}

impl SortField for ProductSortField {
    const ALLOWED: &'static [&'static str] = &["name", "price", "category", "createdAt", "stock"];

    fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "category" => Some(Self::Category),
            "createdAt" => Some(Self::CreatedAt),
            "stock" => Some(Self::Stock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Substring match over name, description and category.
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// `true` keeps stock > 0, `false` keeps stock <= 0.
    pub in_stock: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub page: PageRequest<ProductSortField>,
    pub filter: ProductFilter,
}

#[derive(Debug, Clone, Copy)]
pub struct StockUpdate {
    pub id: i32,
    /// Signed delta applied to the current stock.
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkStockFailure {
    pub id: i32,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkStockReport {
    pub success: u64,
    pub failed: u64,
    pub errors: Vec<BulkStockFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub total_products: u64,
    pub active_products: u64,
    pub out_of_stock: u64,
    pub total_value: f64,
}
