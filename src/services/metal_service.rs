//! Domain service for the metals referenced by the compatibility matrix.

use thiserror::Error;

use crate::models::metal::Metal;

#[derive(Debug, Error)]
pub enum MetalError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MetalError {
    pub(crate) fn not_found() -> Self {
        Self::NotFound("Metal not found".to_string())
    }

    pub(crate) fn name_taken() -> Self {
        Self::Conflict("Metal with this name already exists".to_string())
    }
}

impl From<sea_orm::DbErr> for MetalError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for MetalError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            return Self::name_taken();
        }
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait MetalService: Send + Sync {
    async fn create(&self, name: &str) -> Result<Metal, MetalError>;

    async fn get_by_id(&self, id: i32) -> Result<Metal, MetalError>;

    async fn get_all(&self) -> Result<Vec<Metal>, MetalError>;

    async fn update(&self, id: i32, name: &str) -> Result<Metal, MetalError>;

    /// # Errors
    ///
    /// Returns [`MetalError::Conflict`] while any compatibility entry still
    /// references the metal.
    async fn delete(&self, id: i32) -> Result<(), MetalError>;
}
