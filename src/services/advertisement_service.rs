//! Domain service for advertisements.

use thiserror::Error;

use crate::auth::{DenyReason, Identity};
use crate::db::{Advertisement, AdvertisementChanges, AdvertisementFilter, NewAdvertisement};
use crate::domain::AdvertisementId;

#[derive(Debug, Error)]
pub enum AdvertisementError {
    #[error("Advertisement not found: {0}")]
    NotFound(AdvertisementId),

    #[error("{0}")]
    Denied(DenyReason),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for AdvertisementError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AdvertisementError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<DenyReason> for AdvertisementError {
    fn from(reason: DenyReason) -> Self {
        Self::Denied(reason)
    }
}

#[async_trait::async_trait]
pub trait AdvertisementService: Send + Sync {
    /// Publishes a listing owned by the calling user.
    ///
    /// # Errors
    ///
    /// Returns [`AdvertisementError::Denied`] for anonymous callers.
    async fn create(
        &self,
        actor: &Identity,
        listing: NewAdvertisement,
    ) -> Result<Advertisement, AdvertisementError>;

    async fn get(&self, id: AdvertisementId) -> Result<Advertisement, AdvertisementError>;

    /// Applies a partial update. Existence is checked before ownership.
    async fn update(
        &self,
        actor: &Identity,
        id: AdvertisementId,
        changes: AdvertisementChanges,
    ) -> Result<Advertisement, AdvertisementError>;

    async fn delete(&self, actor: &Identity, id: AdvertisementId)
    -> Result<(), AdvertisementError>;

    async fn search(
        &self,
        filter: &AdvertisementFilter,
    ) -> Result<Vec<Advertisement>, AdvertisementError>;
}
