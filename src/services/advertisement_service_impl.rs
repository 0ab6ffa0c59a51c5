//! `SeaORM` implementation of the `AdvertisementService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::auth::{Identity, Operation, Resource, authorize};
use crate::db::{
    Advertisement, AdvertisementChanges, AdvertisementFilter, NewAdvertisement, Store,
};
use crate::domain::AdvertisementId;
use crate::services::advertisement_service::{AdvertisementError, AdvertisementService};

pub struct SeaOrmAdvertisementService {
    store: Store,
}

impl SeaOrmAdvertisementService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn existing(&self, id: AdvertisementId) -> Result<Advertisement, AdvertisementError> {
        self.store
            .get_advertisement(id)
            .await?
            .ok_or(AdvertisementError::NotFound(id))
    }
}

#[async_trait]
impl AdvertisementService for SeaOrmAdvertisementService {
    async fn create(
        &self,
        actor: &Identity,
        listing: NewAdvertisement,
    ) -> Result<Advertisement, AdvertisementError> {
        authorize(actor, Operation::Create, Resource::Listing, None).into_result()?;
        let owner_id = actor.principal().map(|p| p.id);

        Ok(self.store.create_advertisement(listing, owner_id).await?)
    }

    async fn get(&self, id: AdvertisementId) -> Result<Advertisement, AdvertisementError> {
        self.existing(id).await
    }

    async fn update(
        &self,
        actor: &Identity,
        id: AdvertisementId,
        changes: AdvertisementChanges,
    ) -> Result<Advertisement, AdvertisementError> {
        let current = self.existing(id).await?;
        let resource = Resource::Advertisement {
            owner_id: current.owner_id,
        };
        authorize(actor, Operation::Update, resource, None).into_result()?;

        self.store
            .update_advertisement(id, changes)
            .await?
            .ok_or(AdvertisementError::NotFound(id))
    }

    async fn delete(
        &self,
        actor: &Identity,
        id: AdvertisementId,
    ) -> Result<(), AdvertisementError> {
        let current = self.existing(id).await?;
        let resource = Resource::Advertisement {
            owner_id: current.owner_id,
        };
        authorize(actor, Operation::Delete, resource, None).into_result()?;

        if !self.store.delete_advertisement(id).await? {
            return Err(AdvertisementError::NotFound(id));
        }

        info!("Deleted advertisement {}: {}", current.id, current.title);
        Ok(())
    }

    async fn search(
        &self,
        filter: &AdvertisementFilter,
    ) -> Result<Vec<Advertisement>, AdvertisementError> {
        Ok(self.store.search_advertisements(filter).await?)
    }
}
