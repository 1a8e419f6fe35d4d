//! `SeaORM` implementation of the `CompatibilityService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::models::compatibility::{
    CompatibilityEntry, CompatibilityPatch, MatrixView, NewCompatibility, PairInput,
    VersionedMatrix, first_duplicate_metal, unique_metal_names,
};
use crate::services::compatibility_service::{CompatibilityError, CompatibilityService};

pub struct SeaOrmCompatibilityService {
    store: Store,
}

impl SeaOrmCompatibilityService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Rejects repeated metals and metals that do not exist.
    async fn check_pairs(&self, chemical: &str, pairs: &[PairInput]) -> Result<(), CompatibilityError> {
        if let Some(metal_id) = first_duplicate_metal(pairs) {
            return Err(CompatibilityError::Conflict(format!(
                "Metal with id {metal_id} already exists for chemical {chemical}"
            )));
        }

        let ids: Vec<i32> = pairs.iter().map(|p| p.metal_id).collect();
        let existing = self.store.existing_metal_ids(&ids).await?;
        if let Some(missing) = ids.iter().find(|id| !existing.contains(id)) {
            return Err(CompatibilityError::NotFound(format!(
                "Metal with id {missing} not found"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl CompatibilityService for SeaOrmCompatibilityService {
    async fn create(
        &self,
        entry: NewCompatibility,
    ) -> Result<CompatibilityEntry, CompatibilityError> {
        if self
            .store
            .find_compatibility_by_chemical(&entry.chemical_name)
            .await?
            .is_some()
        {
            return Err(CompatibilityError::Conflict(
                "Compatibility entry for this chemical already exists".to_string(),
            ));
        }

        self.check_pairs(&entry.chemical_name, &entry.compatibilities)
            .await?;

        let created = self.store.create_compatibility(&entry).await?;

        info!(
            compatibility_id = created.id,
            "Compatibility created: {}", created.chemical_name
        );
        Ok(created)
    }

    async fn get_by_id(&self, id: i32) -> Result<CompatibilityEntry, CompatibilityError> {
        self.store
            .get_compatibility(id)
            .await?
            .ok_or_else(CompatibilityError::not_found)
    }

    async fn get_all(&self) -> Result<Vec<CompatibilityEntry>, CompatibilityError> {
        Ok(self.store.list_compatibilities().await?)
    }

    async fn update(
        &self,
        id: i32,
        patch: CompatibilityPatch,
    ) -> Result<CompatibilityEntry, CompatibilityError> {
        let existing = self.get_by_id(id).await?;

        if let Some(name) = &patch.chemical_name
            && let Some(other) = self.store.find_compatibility_by_chemical(name).await?
            && other.id != id
        {
            return Err(CompatibilityError::Conflict(
                "Another entry with this chemical name already exists".to_string(),
            ));
        }

        if let Some(pairs) = &patch.compatibilities {
            let chemical = patch
                .chemical_name
                .as_deref()
                .unwrap_or(&existing.chemical_name);
            self.check_pairs(chemical, pairs).await?;
        }

        let updated = self
            .store
            .update_compatibility(id, &patch)
            .await?
            .ok_or_else(CompatibilityError::not_found)?;

        info!(
            compatibility_id = id,
            "Compatibility updated: {}", updated.chemical_name
        );
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<(), CompatibilityError> {
        let entry = self.get_by_id(id).await?;

        if !self.store.delete_compatibility(id).await? {
            return Err(CompatibilityError::not_found());
        }

        info!(
            compatibility_id = id,
            "Compatibility deleted: {}", entry.chemical_name
        );
        Ok(())
    }

    async fn get_all_with_version(&self) -> Result<VersionedMatrix, CompatibilityError> {
        let (data, version) = self.store.list_compatibilities_with_version().await?;
        Ok(VersionedMatrix { data, version })
    }

    async fn get_version(&self) -> Result<i64, CompatibilityError> {
        Ok(self.store.compatibility_version().await?)
    }

    async fn get_matrix_view(&self) -> Result<MatrixView, CompatibilityError> {
        let entries = self.store.list_compatibilities().await?;
        Ok(MatrixView::from_entries(&entries))
    }

    async fn get_unique_metals(&self) -> Result<Vec<String>, CompatibilityError> {
        let entries = self.store.list_compatibilities().await?;
        Ok(unique_metal_names(&entries))
    }
}
