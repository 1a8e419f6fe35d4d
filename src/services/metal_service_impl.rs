//! `SeaORM` implementation of the `MetalService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::models::metal::Metal;
use crate::services::metal_service::{MetalError, MetalService};

pub struct SeaOrmMetalService {
    store: Store,
}

impl SeaOrmMetalService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn require(&self, id: i32) -> Result<Metal, MetalError> {
        self.store
            .get_metal(id)
            .await?
            .ok_or_else(MetalError::not_found)
    }
}

#[async_trait]
impl MetalService for SeaOrmMetalService {
    async fn create(&self, name: &str) -> Result<Metal, MetalError> {
        if self.store.metal_name_taken(name, None).await? {
            return Err(MetalError::name_taken());
        }

        let metal = self.store.create_metal(name).await?;

        info!(metal_id = metal.id, "Metal created: {}", metal.name);
        Ok(metal)
    }

    async fn get_by_id(&self, id: i32) -> Result<Metal, MetalError> {
        self.require(id).await
    }

    async fn get_all(&self) -> Result<Vec<Metal>, MetalError> {
        Ok(self.store.list_metals().await?)
    }

    async fn update(&self, id: i32, name: &str) -> Result<Metal, MetalError> {
        self.require(id).await?;

        if self.store.metal_name_taken(name, Some(id)).await? {
            return Err(MetalError::name_taken());
        }

        let metal = self
            .store
            .rename_metal(id, name)
            .await?
            .ok_or_else(MetalError::not_found)?;

        info!(metal_id = id, "Metal updated: {}", metal.name);
        Ok(metal)
    }

    async fn delete(&self, id: i32) -> Result<(), MetalError> {
        let metal = self.require(id).await?;

        if self.store.metal_in_use(id).await? {
            return Err(MetalError::Conflict(
                "Metal is referenced by compatibility entries".to_string(),
            ));
        }

        if !self.store.delete_metal(id).await? {
            return Err(MetalError::not_found());
        }

        info!(metal_id = id, "Metal deleted: {}", metal.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::compatibility::{NewCompatibility, PairInput};
    use crate::services::test_support;

    #[tokio::test]
    async fn test_names_are_unique_ignoring_case() {
        let service = SeaOrmMetalService::new(test_support::store().await);

        service.create("Aluminum").await.unwrap();
        let err = service.create("ALUMINUM").await.unwrap_err();
        assert!(matches!(err, MetalError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_allows_recasing_own_name() {
        let service = SeaOrmMetalService::new(test_support::store().await);
        let metal = service.create("copper").await.unwrap();

        let renamed = service.update(metal.id, "Copper").await.unwrap();
        assert_eq!(renamed.name, "Copper");
    }

    #[tokio::test]
    async fn test_referenced_metal_cannot_be_deleted() {
        let store = test_support::store().await;
        let service = SeaOrmMetalService::new(store.clone());
        let metal = service.create("Zinc").await.unwrap();
        store
            .create_compatibility(&NewCompatibility {
                chemical_name: "acetone".to_string(),
                compatibilities: vec![PairInput {
                    metal_id: metal.id,
                    is_compatible: true,
                }],
            })
            .await
            .unwrap();

        assert!(matches!(
            service.delete(metal.id).await,
            Err(MetalError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_rename_of_referenced_metal_bumps_version() {
        let store = test_support::store().await;
        let service = SeaOrmMetalService::new(store.clone());
        let metal = service.create("Zinc").await.unwrap();
        store
            .create_compatibility(&NewCompatibility {
                chemical_name: "acetone".to_string(),
                compatibilities: vec![PairInput {
                    metal_id: metal.id,
                    is_compatible: false,
                }],
            })
            .await
            .unwrap();
        let before = store.compatibility_version().await.unwrap();

        service.update(metal.id, "Zinc alloy").await.unwrap();

        assert_eq!(store.compatibility_version().await.unwrap(), before + 1);
    }

    #[tokio::test]
    async fn test_delete_unreferenced_metal() {
        let service = SeaOrmMetalService::new(test_support::store().await);
        let metal = service.create("Tin").await.unwrap();

        service.delete(metal.id).await.unwrap();
        assert!(matches!(
            service.get_by_id(metal.id).await,
            Err(MetalError::NotFound(_))
        ));
    }
}
