use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use std::collections::{HashMap, HashSet};

use crate::entities::{prelude::*, products, users};
use crate::models::product::{
    Creator, NewProduct, Product, ProductFilter, ProductPatch, ProductSortField, ProductStats,
};
use crate::models::{Page, PageRequest, SortOrder};

fn to_product(model: products::Model, created_by: Option<Creator>) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        category: model.category,
        stock: model.stock,
        is_active: model.is_active,
        created_by,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn apply_filter(mut select: Select<Products>, filter: &ProductFilter) -> Select<Products> {
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(products::Column::Name.contains(search))
                .add(products::Column::Description.contains(search))
                .add(products::Column::Category.contains(search)),
        );
    }

    if let Some(category) = &filter.category {
        select = select.filter(products::Column::Category.eq(category.as_str()));
    }

    if let Some(min) = filter.min_price {
        select = select.filter(products::Column::Price.gte(min));
    }

    if let Some(max) = filter.max_price {
        select = select.filter(products::Column::Price.lte(max));
    }

    match filter.in_stock {
        Some(true) => select = select.filter(products::Column::Stock.gt(0)),
        Some(false) => select = select.filter(products::Column::Stock.lte(0)),
        None => {}
    }

    if let Some(active) = filter.is_active {
        select = select.filter(products::Column::IsActive.eq(active));
    }

    select
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Resolves `created_by` ids to creator profiles with one extra query.
    async fn with_creators(&self, models: Vec<products::Model>) -> Result<Vec<Product>> {
        let ids: HashSet<i32> = models.iter().filter_map(|m| m.created_by).collect();

        let creators: HashMap<i32, Creator> = if ids.is_empty() {
            HashMap::new()
        } else {
            Users::find()
                .filter(users::Column::Id.is_in(ids))
                .all(&self.conn)
                .await
                .context("Failed to load product creators")?
                .into_iter()
                .map(|u| {
                    (
                        u.id,
                        Creator {
                            id: u.id,
                            first_name: u.first_name,
                            last_name: u.last_name,
                            email: u.email,
                        },
                    )
                })
                .collect()
        };

        Ok(models
            .into_iter()
            .map(|m| {
                let creator = m.created_by.and_then(|id| creators.get(&id).cloned());
                to_product(m, creator)
            })
            .collect())
    }

    async fn with_creator(&self, model: products::Model) -> Result<Product> {
        let mut products = self.with_creators(vec![model]).await?;
        products
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Product vanished while resolving its creator"))
    }

    pub async fn create(&self, product: &NewProduct, created_by: i32) -> Result<Product> {
        let now = crate::db::now();

        let model = products::ActiveModel {
            name: Set(product.name.clone()),
            description: Set(product.description.clone()),
            price: Set(product.price),
            category: Set(product.category.clone()),
            stock: Set(product.stock),
            is_active: Set(true),
            created_by: Set(Some(created_by)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert product")?;

        self.with_creator(model).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<Product>> {
        let model = Products::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query product by ID")?;

        match model {
            Some(model) => Ok(Some(self.with_creator(model).await?)),
            None => Ok(None),
        }
    }

    /// Name comparison is case-insensitive (the column collates NOCASE).
    pub async fn name_taken(&self, name: &str, except: Option<i32>) -> Result<bool> {
        let mut select = Products::find().filter(products::Column::Name.eq(name.trim()));
        if let Some(id) = except {
            select = select.filter(products::Column::Id.ne(id));
        }

        let count = select
            .count(&self.conn)
            .await
            .context("Failed to probe product name")?;
        Ok(count > 0)
    }

    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: &PageRequest<ProductSortField>,
    ) -> Result<Page<Product>> {
        let column = match page.sort_by {
            ProductSortField::Name => products::Column::Name,
            ProductSortField::Price => products::Column::Price,
            ProductSortField::Category => products::Column::Category,
            ProductSortField::CreatedAt => products::Column::CreatedAt,
            ProductSortField::Stock => products::Column::Stock,
        };
        let order = match page.sort_order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let select = apply_filter(Products::find(), filter)
            .order_by(column, order.clone())
            .order_by(products::Column::Id, order);

        let paginator = select.paginate(&self.conn, page.limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page - 1).await?;

        Ok(Page {
            items: self.with_creators(models).await?,
            page: page.page,
            limit: page.limit,
            total,
        })
    }

    pub async fn update(&self, id: i32, patch: &ProductPatch) -> Result<Option<Product>> {
        let Some(model) = Products::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: products::ActiveModel = model.into();
        if let Some(name) = &patch.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &patch.description {
            active.description = Set(description.clone());
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(category) = &patch.category {
            active.category = Set(category.clone());
        }
        if let Some(stock) = patch.stock {
            active.stock = Set(stock);
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(crate::db::now());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update product")?;
        Ok(Some(self.with_creator(model).await?))
    }

    /// Writes an absolute stock value.
    pub async fn set_stock(&self, id: i32, stock: i64) -> Result<Option<Product>> {
        self.update(
            id,
            &ProductPatch {
                stock: Some(stock),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Products::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete product")?;
        Ok(result.rows_affected > 0)
    }

    /// Distinct categories of active products, sorted.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let categories = Products::find()
            .select_only()
            .column(products::Column::Category)
            .distinct()
            .filter(products::Column::IsActive.eq(true))
            .order_by_asc(products::Column::Category)
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("Failed to query product categories")?;

        Ok(categories)
    }

    pub async fn stats(&self) -> Result<ProductStats> {
        let total_products = Products::find().count(&self.conn).await?;

        let active_products = Products::find()
            .filter(products::Column::IsActive.eq(true))
            .count(&self.conn)
            .await?;

        let out_of_stock = Products::find()
            .filter(products::Column::IsActive.eq(true))
            .filter(products::Column::Stock.lte(0))
            .count(&self.conn)
            .await?;

        let inventory_value: SimpleExpr = Func::sum(
            Expr::col(products::Column::Price).mul(Expr::col(products::Column::Stock)),
        )
        .into();
        let total_value = Products::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::coalesce([inventory_value, Expr::val(0.0).into()])),
                "total_value",
            )
            .filter(products::Column::IsActive.eq(true))
            .into_tuple::<f64>()
            .one(&self.conn)
            .await
            .context("Failed to compute inventory value")?
            .unwrap_or_default();

        Ok(ProductStats {
            total_products,
            active_products,
            out_of_stock,
            total_value,
        })
    }
}
