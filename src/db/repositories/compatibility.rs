use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

use crate::constants::compatibility::{INITIAL_VERSION, VERSION_ROW_ID};
use crate::entities::{
    compatibilities, compatibility_pairs, compatibility_version, metals, prelude::*,
};
use crate::models::compatibility::{
    CompatibilityEntry, CompatibilityPair, CompatibilityPatch, MetalRef, NewCompatibility,
    PairInput, normalize_chemical_name,
};

/// Increments the matrix version counter with a single upsert statement.
///
/// Callers pass the transaction of the mutation so the bump commits or rolls
/// back with it.
pub async fn bump_version<C: ConnectionTrait>(conn: &C) -> Result<()> {
    CompatibilityVersion::insert(compatibility_version::ActiveModel {
        id: Set(VERSION_ROW_ID),
        version: Set(INITIAL_VERSION + 1),
    })
    .on_conflict(
        OnConflict::column(compatibility_version::Column::Id)
            .value(
                compatibility_version::Column::Version,
                Expr::col(compatibility_version::Column::Version).add(1),
            )
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await
    .context("Failed to bump compatibility version")?;

    Ok(())
}

async fn read_version<C: ConnectionTrait>(conn: &C) -> Result<i64> {
    let row = CompatibilityVersion::find_by_id(VERSION_ROW_ID)
        .one(conn)
        .await
        .context("Failed to read compatibility version")?;

    Ok(row.map_or(INITIAL_VERSION, |r| r.version))
}

/// Loads pairs (in position order) and metal names for the given entries.
async fn resolve<C: ConnectionTrait>(
    conn: &C,
    entries: Vec<compatibilities::Model>,
) -> Result<Vec<CompatibilityEntry>> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = entries.iter().map(|e| e.id).collect();
    let pairs = CompatibilityPairs::find()
        .filter(compatibility_pairs::Column::CompatibilityId.is_in(ids))
        .order_by_asc(compatibility_pairs::Column::CompatibilityId)
        .order_by_asc(compatibility_pairs::Column::Position)
        .all(conn)
        .await
        .context("Failed to load compatibility pairs")?;

    let metal_ids: Vec<i32> = pairs.iter().map(|p| p.metal_id).collect();
    let metal_names: HashMap<i32, String> = Metals::find()
        .filter(metals::Column::Id.is_in(metal_ids))
        .all(conn)
        .await
        .context("Failed to load metals for compatibility pairs")?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect();

    let mut grouped: HashMap<i32, Vec<CompatibilityPair>> = HashMap::new();
    for pair in pairs {
        let Some(name) = metal_names.get(&pair.metal_id) else {
            continue;
        };
        grouped
            .entry(pair.compatibility_id)
            .or_default()
            .push(CompatibilityPair {
                metal: MetalRef {
                    id: pair.metal_id,
                    name: name.clone(),
                },
                is_compatible: pair.is_compatible,
            });
    }

    Ok(entries
        .into_iter()
        .map(|e| CompatibilityEntry {
            compatibilities: grouped.remove(&e.id).unwrap_or_default(),
            id: e.id,
            chemical_name: e.chemical_name,
            created_at: e.created_at,
            updated_at: e.updated_at,
        })
        .collect())
}

async fn insert_pairs<C: ConnectionTrait>(
    conn: &C,
    compatibility_id: i32,
    pairs: &[PairInput],
) -> Result<()> {
    if pairs.is_empty() {
        return Ok(());
    }

    let models = pairs
        .iter()
        .zip(0..)
        .map(|(p, position)| compatibility_pairs::ActiveModel {
            compatibility_id: Set(compatibility_id),
            metal_id: Set(p.metal_id),
            is_compatible: Set(p.is_compatible),
            position: Set(position),
            ..Default::default()
        });

    CompatibilityPairs::insert_many(models)
        .exec_without_returning(conn)
        .await
        .context("Failed to insert compatibility pairs")?;

    Ok(())
}

pub struct CompatibilityRepository {
    conn: DatabaseConnection,
}

impl CompatibilityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, entry: &NewCompatibility) -> Result<CompatibilityEntry> {
        let now = crate::db::now();
        let txn = self.conn.begin().await?;

        let model = compatibilities::ActiveModel {
            chemical_name: Set(normalize_chemical_name(&entry.chemical_name)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert compatibility entry")?;

        insert_pairs(&txn, model.id, &entry.compatibilities).await?;
        bump_version(&txn).await?;

        let created = resolve(&txn, vec![model])
            .await?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created compatibility entry"))?;

        txn.commit().await?;
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> Result<Option<CompatibilityEntry>> {
        let Some(model) = Compatibilities::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query compatibility entry")?
        else {
            return Ok(None);
        };

        Ok(resolve(&self.conn, vec![model]).await?.pop())
    }

    pub async fn find_by_chemical(&self, chemical_name: &str) -> Result<Option<CompatibilityEntry>> {
        let Some(model) = Compatibilities::find()
            .filter(
                compatibilities::Column::ChemicalName.eq(normalize_chemical_name(chemical_name)),
            )
            .one(&self.conn)
            .await
            .context("Failed to query compatibility entry by chemical")?
        else {
            return Ok(None);
        };

        Ok(resolve(&self.conn, vec![model]).await?.pop())
    }

    /// Every entry, ordered by chemical name.
    pub async fn list(&self) -> Result<Vec<CompatibilityEntry>> {
        list_sorted(&self.conn).await
    }

    /// The full matrix and the counter, read from one snapshot.
    pub async fn list_with_version(&self) -> Result<(Vec<CompatibilityEntry>, i64)> {
        let txn = self.conn.begin().await?;
        let entries = list_sorted(&txn).await?;
        let version = read_version(&txn).await?;
        txn.commit().await?;

        Ok((entries, version))
    }

    pub async fn version(&self) -> Result<i64> {
        read_version(&self.conn).await
    }

    pub async fn update(
        &self,
        id: i32,
        patch: &CompatibilityPatch,
    ) -> Result<Option<CompatibilityEntry>> {
        let txn = self.conn.begin().await?;

        let Some(model) = Compatibilities::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: compatibilities::ActiveModel = model.into();
        if let Some(name) = &patch.chemical_name {
            active.chemical_name = Set(normalize_chemical_name(name));
        }
        active.updated_at = Set(crate::db::now());
        let model = active
            .update(&txn)
            .await
            .context("Failed to update compatibility entry")?;

        if let Some(pairs) = &patch.compatibilities {
            CompatibilityPairs::delete_many()
                .filter(compatibility_pairs::Column::CompatibilityId.eq(id))
                .exec(&txn)
                .await
                .context("Failed to clear compatibility pairs")?;
            insert_pairs(&txn, id, pairs).await?;
        }

        bump_version(&txn).await?;

        let updated = resolve(&txn, vec![model]).await?.pop();
        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        CompatibilityPairs::delete_many()
            .filter(compatibility_pairs::Column::CompatibilityId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete compatibility pairs")?;

        let result = Compatibilities::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete compatibility entry")?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        bump_version(&txn).await?;
        txn.commit().await?;
        Ok(true)
    }
}

async fn list_sorted<C: ConnectionTrait>(conn: &C) -> Result<Vec<CompatibilityEntry>> {
    let models = Compatibilities::find()
        .order_by_asc(compatibilities::Column::ChemicalName)
        .all(conn)
        .await
        .context("Failed to list compatibility entries")?;

    resolve(conn, models).await
}
