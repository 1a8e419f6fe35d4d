use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::models::compatibility::{
    CompatibilityEntry, CompatibilityPatch, NewCompatibility,
};
use crate::models::metal::Metal;
use crate::models::product::{
    NewProduct, Product, ProductFilter, ProductPatch, ProductSortField, ProductStats,
};
use crate::models::user::{NewUser, User, UserPatch, UserQuery};
use crate::models::{Page, PageRequest};

pub mod migrator;
pub mod repositories;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to an in-memory database is a separate
        // database, so the pool is pinned to a single connection.
        let (max_connections, min_connections) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn metal_repo(&self) -> repositories::metal::MetalRepository {
        repositories::metal::MetalRepository::new(self.conn.clone())
    }

    fn compatibility_repo(&self) -> repositories::compatibility::CompatibilityRepository {
        repositories::compatibility::CompatibilityRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(&self, user: &NewUser, password_hash: String) -> Result<User> {
        self.user_repo().create(user, password_hash).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn verify_user_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn list_users(&self, query: &UserQuery) -> Result<Page<User>> {
        self.user_repo().list(query).await
    }

    pub async fn update_user(&self, id: i32, patch: &UserPatch) -> Result<Option<User>> {
        self.user_repo().update(id, patch).await
    }

    pub async fn update_user_password_hash(&self, id: i32, password_hash: String) -> Result<bool> {
        self.user_repo().update_password_hash(id, password_hash).await
    }

    pub async fn get_user_credential_stamp(&self, id: i32) -> Result<Option<String>> {
        self.user_repo().credential_stamp(id).await
    }

    pub async fn set_user_active(&self, id: i32, active: bool) -> Result<Option<User>> {
        self.user_repo().set_active(id, active).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // Products

    pub async fn create_product(&self, product: &NewProduct, created_by: i32) -> Result<Product> {
        self.product_repo().create(product, created_by).await
    }

    pub async fn get_product(&self, id: i32) -> Result<Option<Product>> {
        self.product_repo().get(id).await
    }

    pub async fn product_name_taken(&self, name: &str, except: Option<i32>) -> Result<bool> {
        self.product_repo().name_taken(name, except).await
    }

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: &PageRequest<ProductSortField>,
    ) -> Result<Page<Product>> {
        self.product_repo().list(filter, page).await
    }

    pub async fn update_product(&self, id: i32, patch: &ProductPatch) -> Result<Option<Product>> {
        self.product_repo().update(id, patch).await
    }

    pub async fn set_product_stock(&self, id: i32, stock: i64) -> Result<Option<Product>> {
        self.product_repo().set_stock(id, stock).await
    }

    pub async fn delete_product(&self, id: i32) -> Result<bool> {
        self.product_repo().delete(id).await
    }

    pub async fn product_categories(&self) -> Result<Vec<String>> {
        self.product_repo().categories().await
    }

    pub async fn product_stats(&self) -> Result<ProductStats> {
        self.product_repo().stats().await
    }

    // Metals

    pub async fn create_metal(&self, name: &str) -> Result<Metal> {
        self.metal_repo().create(name).await
    }

    pub async fn get_metal(&self, id: i32) -> Result<Option<Metal>> {
        self.metal_repo().get(id).await
    }

    pub async fn metal_name_taken(&self, name: &str, except: Option<i32>) -> Result<bool> {
        self.metal_repo().name_taken(name, except).await
    }

    pub async fn list_metals(&self) -> Result<Vec<Metal>> {
        self.metal_repo().list().await
    }

    pub async fn rename_metal(&self, id: i32, name: &str) -> Result<Option<Metal>> {
        self.metal_repo().rename(id, name).await
    }

    pub async fn delete_metal(&self, id: i32) -> Result<bool> {
        self.metal_repo().delete(id).await
    }

    pub async fn metal_in_use(&self, id: i32) -> Result<bool> {
        self.metal_repo().is_referenced(id).await
    }

    pub async fn existing_metal_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        self.metal_repo().existing_ids(ids).await
    }

    // Compatibility matrix

    pub async fn create_compatibility(&self, entry: &NewCompatibility) -> Result<CompatibilityEntry> {
        self.compatibility_repo().create(entry).await
    }

    pub async fn get_compatibility(&self, id: i32) -> Result<Option<CompatibilityEntry>> {
        self.compatibility_repo().get(id).await
    }

    pub async fn find_compatibility_by_chemical(
        &self,
        chemical_name: &str,
    ) -> Result<Option<CompatibilityEntry>> {
        self.compatibility_repo().find_by_chemical(chemical_name).await
    }

    pub async fn list_compatibilities(&self) -> Result<Vec<CompatibilityEntry>> {
        self.compatibility_repo().list().await
    }

    pub async fn update_compatibility(
        &self,
        id: i32,
        patch: &CompatibilityPatch,
    ) -> Result<Option<CompatibilityEntry>> {
        self.compatibility_repo().update(id, patch).await
    }

    pub async fn delete_compatibility(&self, id: i32) -> Result<bool> {
        self.compatibility_repo().delete(id).await
    }

    pub async fn compatibility_version(&self) -> Result<i64> {
        self.compatibility_repo().version().await
    }

    pub async fn list_compatibilities_with_version(
        &self,
    ) -> Result<(Vec<CompatibilityEntry>, i64)> {
        self.compatibility_repo().list_with_version().await
    }
}

/// Current time in the format every timestamp column uses.
#[must_use]
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// True when `err` (or anything it wraps) is a unique-constraint violation.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<DbErr>().and_then(DbErr::sql_err),
            Some(SqlErr::UniqueConstraintViolation(_))
        )
    })
}
