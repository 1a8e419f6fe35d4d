//! `SeaORM` implementation of the `ProductService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::constants::products::MIN_SEARCH_LENGTH;
use crate::db::Store;
use crate::models::product::{
    BulkStockFailure, BulkStockReport, NewProduct, Product, ProductFilter, ProductPatch,
    ProductQuery, ProductSortField, ProductStats, StockUpdate,
};
use crate::models::{Page, PageRequest};
use crate::services::product_service::{ProductError, ProductService};

pub struct SeaOrmProductService {
    store: Store,
}

impl SeaOrmProductService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn require(&self, id: i32) -> Result<Product, ProductError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(ProductError::not_found)
    }

    async fn list_active(
        &self,
        filter: ProductFilter,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError> {
        let filter = ProductFilter {
            is_active: Some(true),
            ..filter
        };
        Ok(self.store.list_products(&filter, &page).await?)
    }
}

#[async_trait]
impl ProductService for SeaOrmProductService {
    async fn create(&self, product: NewProduct, created_by: i32) -> Result<Product, ProductError> {
        if self.store.product_name_taken(&product.name, None).await? {
            return Err(ProductError::name_taken());
        }

        let created = self.store.create_product(&product, created_by).await?;

        info!(product_id = created.id, "Product created: {}", created.name);
        Ok(created)
    }

    async fn get_by_id(&self, id: i32) -> Result<Product, ProductError> {
        self.require(id).await
    }

    async fn list(&self, query: ProductQuery) -> Result<Page<Product>, ProductError> {
        Ok(self.store.list_products(&query.filter, &query.page).await?)
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> Result<Product, ProductError> {
        let existing = self.require(id).await?;

        if let Some(name) = &patch.name
            && name != &existing.name
            && self.store.product_name_taken(name, Some(id)).await?
        {
            return Err(ProductError::name_taken());
        }

        let updated = self
            .store
            .update_product(id, &patch)
            .await?
            .ok_or_else(ProductError::not_found)?;

        info!(product_id = id, "Product updated: {}", updated.name);
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<(), ProductError> {
        let product = self.require(id).await?;

        if !self.store.delete_product(id).await? {
            return Err(ProductError::not_found());
        }

        info!(product_id = id, "Product deleted: {}", product.name);
        Ok(())
    }

    async fn update_stock(&self, id: i32, quantity: i64) -> Result<Product, ProductError> {
        let product = self.require(id).await?;

        let new_stock = product
            .stock
            .checked_add(quantity)
            .filter(|stock| *stock >= 0)
            .ok_or_else(|| {
                ProductError::BadRequest("Insufficient stock or invalid quantity".to_string())
            })?;

        let updated = self
            .store
            .set_product_stock(id, new_stock)
            .await?
            .ok_or_else(ProductError::not_found)?;

        info!(
            product_id = id,
            from = product.stock,
            to = updated.stock,
            "Product stock updated: {}",
            updated.name
        );
        Ok(updated)
    }

    async fn bulk_update_stock(&self, updates: Vec<StockUpdate>) -> BulkStockReport {
        let mut report = BulkStockReport::default();

        for update in updates {
            match self.update_stock(update.id, update.quantity).await {
                Ok(_) => report.success += 1,
                Err(e) => {
                    warn!(product_id = update.id, error = %e, "Bulk stock update item failed");
                    report.failed += 1;
                    report.errors.push(BulkStockFailure {
                        id: update.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn search(
        &self,
        term: &str,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_LENGTH {
            return Err(ProductError::BadRequest(format!(
                "Search term must be at least {MIN_SEARCH_LENGTH} characters long"
            )));
        }

        self.list_active(
            ProductFilter {
                search: Some(term.to_string()),
                ..Default::default()
            },
            page,
        )
        .await
    }

    async fn get_by_category(
        &self,
        category: &str,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError> {
        self.list_active(
            ProductFilter {
                category: Some(category.to_string()),
                ..Default::default()
            },
            page,
        )
        .await
    }

    async fn get_in_stock(
        &self,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError> {
        self.list_active(
            ProductFilter {
                in_stock: Some(true),
                ..Default::default()
            },
            page,
        )
        .await
    }

    async fn get_by_price_range(
        &self,
        min_price: f64,
        max_price: f64,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError> {
        if min_price < 0.0 || max_price < 0.0 {
            return Err(ProductError::BadRequest(
                "Price range cannot be negative".to_string(),
            ));
        }
        if min_price > max_price {
            return Err(ProductError::BadRequest(
                "Minimum price cannot be greater than maximum price".to_string(),
            ));
        }

        self.list_active(
            ProductFilter {
                min_price: Some(min_price),
                max_price: Some(max_price),
                ..Default::default()
            },
            page,
        )
        .await
    }

    async fn get_low_stock(
        &self,
        threshold: i64,
        page: PageRequest<ProductSortField>,
    ) -> Result<Page<Product>, ProductError> {
        if threshold < 0 {
            return Err(ProductError::BadRequest(
                "Stock threshold cannot be negative".to_string(),
            ));
        }

        let in_stock = self.get_in_stock(page).await?;
        Ok(in_stock.retain(|p| p.stock <= threshold))
    }

    async fn get_categories(&self) -> Result<Vec<String>, ProductError> {
        Ok(self.store.product_categories().await?)
    }

    async fn get_stats(&self) -> Result<ProductStats, ProductError> {
        Ok(self.store.product_stats().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{NewUser, UserRole};
    use crate::services::test_support;

    async fn setup() -> (SeaOrmProductService, i32) {
        let store = test_support::store().await;
        let creator = store
            .create_user(
                &NewUser {
                    email: "staff@x.com".to_string(),
                    password: String::new(),
                    first_name: "Sam".to_string(),
                    last_name: "Staff".to_string(),
                    role: UserRole::Moderator,
                },
                "not-a-real-hash".to_string(),
            )
            .await
            .unwrap();
        (SeaOrmProductService::new(store), creator.id)
    }

    fn product(name: &str, price: f64, category: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            price,
            category: category.to_string(),
            stock,
        }
    }

    #[tokio::test]
    async fn test_create_resolves_creator_and_rejects_duplicate_names() {
        let (service, creator) = setup().await;

        let created = service
            .create(product("Widget", 2.5, "tools", 3), creator)
            .await
            .unwrap();
        let by = created.created_by.unwrap();
        assert_eq!(by.id, creator);
        assert_eq!(by.email, "staff@x.com");

        let err = service
            .create(product("WIDGET", 1.0, "tools", 1), creator)
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_stock_applies_exact_delta() {
        let (service, creator) = setup().await;
        let p = service
            .create(product("Widget", 2.5, "tools", 5), creator)
            .await
            .unwrap();

        assert_eq!(service.update_stock(p.id, -5).await.unwrap().stock, 0);
        assert_eq!(service.update_stock(p.id, 7).await.unwrap().stock, 7);

        let err = service.update_stock(p.id, -8).await.unwrap_err();
        assert!(matches!(err, ProductError::BadRequest(_)));
        assert_eq!(service.get_by_id(p.id).await.unwrap().stock, 7);
    }

    #[tokio::test]
    async fn test_bulk_update_reports_per_item() {
        let (service, creator) = setup().await;
        let p = service
            .create(product("Widget", 2.5, "tools", 1), creator)
            .await
            .unwrap();

        let report = service
            .bulk_update_stock(vec![
                StockUpdate { id: p.id, quantity: 4 },
                StockUpdate { id: p.id, quantity: -10 },
                StockUpdate { id: 999, quantity: 1 },
            ])
            .await;

        assert_eq!(report.success, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.errors[1].id, 999);
        assert_eq!(report.errors[1].error, "Product not found");
        assert_eq!(service.get_by_id(p.id).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_search_requires_two_characters() {
        let (service, creator) = setup().await;
        service
            .create(product("Copper pipe", 9.0, "plumbing", 2), creator)
            .await
            .unwrap();

        assert!(matches!(
            service.search(" a ", PageRequest::default()).await,
            Err(ProductError::BadRequest(_))
        ));
        let hits = service.search("pipe", PageRequest::default()).await.unwrap();
        assert_eq!(hits.total, 1);
    }

    #[tokio::test]
    async fn test_price_range_validation() {
        let (service, creator) = setup().await;
        service
            .create(product("Cheap", 1.0, "misc", 1), creator)
            .await
            .unwrap();
        service
            .create(product("Dear", 100.0, "misc", 1), creator)
            .await
            .unwrap();

        assert!(service.get_by_price_range(-1.0, 5.0, PageRequest::default()).await.is_err());
        assert!(service.get_by_price_range(10.0, 5.0, PageRequest::default()).await.is_err());

        let page = service
            .get_by_price_range(0.5, 50.0, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Cheap");
    }

    #[tokio::test]
    async fn test_low_stock_filters_in_stock_page() {
        let (service, creator) = setup().await;
        service.create(product("Few", 1.0, "a", 2), creator).await.unwrap();
        service.create(product("Many", 1.0, "a", 50), creator).await.unwrap();
        service.create(product("None", 1.0, "a", 0), creator).await.unwrap();

        let page = service.get_low_stock(10, PageRequest::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Few");
        assert_eq!(page.total, 2);

        assert!(service.get_low_stock(-1, PageRequest::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_categories_and_stats() {
        let (service, creator) = setup().await;
        service.create(product("A", 2.0, "tools", 3), creator).await.unwrap();
        service.create(product("B", 4.0, "paint", 0), creator).await.unwrap();
        let hidden = service.create(product("C", 10.0, "hidden", 1), creator).await.unwrap();
        service
            .update(
                hidden.id,
                ProductPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(service.get_categories().await.unwrap(), vec!["paint", "tools"]);

        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.active_products, 2);
        assert_eq!(stats.out_of_stock, 1);
        assert!((stats.total_value - 6.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (service, _) = setup().await;
        assert!(matches!(service.delete(1).await, Err(ProductError::NotFound(_))));
    }
}
