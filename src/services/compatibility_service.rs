//! Domain service for the chemical/metal compatibility matrix.
//!
//! Every successful write advances the global matrix version by one so
//! clients can tell a cached copy is stale with a single integer compare.

use thiserror::Error;

use crate::models::compatibility::{
    CompatibilityEntry, CompatibilityPatch, MatrixView, NewCompatibility, VersionedMatrix,
};

#[derive(Debug, Error)]
pub enum CompatibilityError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompatibilityError {
    pub(crate) fn not_found() -> Self {
        Self::NotFound("Compatibility entry not found".to_string())
    }
}

impl From<sea_orm::DbErr> for CompatibilityError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CompatibilityError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            return Self::Conflict(
                "Compatibility entry for this chemical already exists".to_string(),
            );
        }
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait CompatibilityService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`CompatibilityError::Conflict`] for a chemical that already
    /// has an entry or a payload naming the same metal twice, and
    /// [`CompatibilityError::NotFound`] for an unknown metal.
    async fn create(&self, entry: NewCompatibility)
    -> Result<CompatibilityEntry, CompatibilityError>;

    async fn get_by_id(&self, id: i32) -> Result<CompatibilityEntry, CompatibilityError>;

    /// Ordered by chemical name.
    async fn get_all(&self) -> Result<Vec<CompatibilityEntry>, CompatibilityError>;

    async fn update(
        &self,
        id: i32,
        patch: CompatibilityPatch,
    ) -> Result<CompatibilityEntry, CompatibilityError>;

    async fn delete(&self, id: i32) -> Result<(), CompatibilityError>;

    async fn get_all_with_version(&self) -> Result<VersionedMatrix, CompatibilityError>;

    async fn get_version(&self) -> Result<i64, CompatibilityError>;

    async fn get_matrix_view(&self) -> Result<MatrixView, CompatibilityError>;

    /// Sorted distinct names of metals that appear in any entry.
    async fn get_unique_metals(&self) -> Result<Vec<String>, CompatibilityError>;
}
