use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::compatibility::bump_version;
use crate::entities::{compatibility_pairs, metals, prelude::*};
use crate::models::metal::Metal;

impl From<metals::Model> for Metal {
    fn from(model: metals::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct MetalRepository {
    conn: DatabaseConnection,
}

impl MetalRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, name: &str) -> Result<Metal> {
        let now = crate::db::now();

        let model = metals::ActiveModel {
            name: Set(name.trim().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert metal")?;

        Ok(Metal::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Metal>> {
        let model = Metals::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query metal by ID")?;

        Ok(model.map(Metal::from))
    }

    pub async fn name_taken(&self, name: &str, except: Option<i32>) -> Result<bool> {
        let mut select = Metals::find().filter(metals::Column::Name.eq(name.trim()));
        if let Some(id) = except {
            select = select.filter(metals::Column::Id.ne(id));
        }

        Ok(select.count(&self.conn).await? > 0)
    }

    pub async fn list(&self) -> Result<Vec<Metal>> {
        let models = Metals::find()
            .order_by_asc(metals::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list metals")?;

        Ok(models.into_iter().map(Metal::from).collect())
    }

    /// Renaming a metal that appears in the matrix changes what clients
    /// render, so it also advances the matrix version.
    pub async fn rename(&self, id: i32, name: &str) -> Result<Option<Metal>> {
        let txn = self.conn.begin().await?;

        let Some(model) = Metals::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };
        let renamed = model.name != name.trim();

        let mut active: metals::ActiveModel = model.into();
        active.name = Set(name.trim().to_string());
        active.updated_at = Set(crate::db::now());
        let model = active
            .update(&txn)
            .await
            .context("Failed to update metal")?;

        let referenced = CompatibilityPairs::find()
            .filter(compatibility_pairs::Column::MetalId.eq(id))
            .count(&txn)
            .await?
            > 0;
        if renamed && referenced {
            bump_version(&txn).await?;
        }

        txn.commit().await?;
        Ok(Some(Metal::from(model)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Metals::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete metal")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn is_referenced(&self, id: i32) -> Result<bool> {
        let count = CompatibilityPairs::find()
            .filter(compatibility_pairs::Column::MetalId.eq(id))
            .count(&self.conn)
            .await
            .context("Failed to count metal references")?;
        Ok(count > 0)
    }

    /// Subset of `ids` that exist.
    pub async fn existing_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = Metals::find()
            .select_only()
            .column(metals::Column::Id)
            .filter(metals::Column::Id.is_in(ids.iter().copied()))
            .into_tuple::<i32>()
            .all(&self.conn)
            .await
            .context("Failed to check metal ids")?;

        Ok(found)
    }
}
