use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{AdvertisementId, Group, UserId};

pub mod migrator;
pub mod repositories;

pub use repositories::advertisement::{
    Advertisement, AdvertisementChanges, AdvertisementFilter, NewAdvertisement,
};
pub use repositories::user::{User, UserChanges, UserWriteError};

/// Cloneable handle over the connection pool. Every read goes to the
/// database; nothing is cached in process.
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
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

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

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn advertisement_repo(&self) -> repositories::advertisement::AdvertisementRepository {
        repositories::advertisement::AdvertisementRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_with_password(&self, username: &str) -> Result<Option<(User, String)>> {
        self.user_repo()
            .get_by_username_with_password(username)
            .await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        group: Group,
    ) -> Result<User, UserWriteError> {
        self.user_repo()
            .create(username, password_hash, group)
            .await
    }

    pub async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<User>, UserWriteError> {
        self.user_repo().update(id, changes).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // ------------------------------------------------------------------------
    // Advertisements
    // ------------------------------------------------------------------------

    pub async fn create_advertisement(
        &self,
        ad: NewAdvertisement,
        owner_id: Option<UserId>,
    ) -> Result<Advertisement> {
        self.advertisement_repo().create(ad, owner_id).await
    }

    pub async fn get_advertisement(&self, id: AdvertisementId) -> Result<Option<Advertisement>> {
        self.advertisement_repo().get(id).await
    }

    pub async fn update_advertisement(
        &self,
        id: AdvertisementId,
        changes: AdvertisementChanges,
    ) -> Result<Option<Advertisement>> {
        self.advertisement_repo().update(id, changes).await
    }

    pub async fn delete_advertisement(&self, id: AdvertisementId) -> Result<bool> {
        self.advertisement_repo().delete(id).await
    }

    pub async fn search_advertisements(
        &self,
        filter: &AdvertisementFilter,
    ) -> Result<Vec<Advertisement>> {
        self.advertisement_repo().search(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    fn listing(title: &str, author: &str, price: f64) -> NewAdvertisement {
        NewAdvertisement {
            title: title.to_string(),
            description: format!("{title} for sale"),
            price,
            author: author.to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = store().await;
        store.create_user("alice", "h1", Group::User).await.unwrap();

        let err = store
            .create_user("alice", "h2", Group::User)
            .await
            .unwrap_err();
        assert!(matches!(err, UserWriteError::UsernameTaken(name) if name == "alice"));

        // Usernames are case-sensitive.
        assert!(store.create_user("Alice", "h3", Group::User).await.is_ok());
    }

    #[tokio::test]
    async fn rename_onto_existing_username_is_rejected() {
        let store = store().await;
        store.create_user("alice", "h", Group::User).await.unwrap();
        let bob = store.create_user("bob", "h", Group::User).await.unwrap();

        let err = store
            .update_user(
                bob.id,
                UserChanges {
                    username: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserWriteError::UsernameTaken(_)));

        // Renaming to one's own name is a no-op, not a conflict.
        let same = store
            .update_user(
                bob.id,
                UserChanges {
                    username: Some("bob".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same.username, "bob");
    }

    #[tokio::test]
    async fn user_partial_update_leaves_other_fields() {
        let store = store().await;
        let user = store.create_user("carol", "hash", Group::User).await.unwrap();

        let updated = store
            .update_user(
                user.id,
                UserChanges {
                    group: Some(Group::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.username, "carol");
        assert_eq!(updated.group, Group::Admin);
        let (_, hash) = store.get_user_with_password("carol").await.unwrap().unwrap();
        assert_eq!(hash, "hash");
    }

    #[tokio::test]
    async fn updating_missing_user_returns_none() {
        let store = store().await;
        let result = store
            .update_user(UserId::new(999), UserChanges::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(!store.delete_user(UserId::new(999)).await.unwrap());
    }

    #[tokio::test]
    async fn advertisement_partial_update_keeps_unset_fields() {
        let store = store().await;
        let owner = store.create_user("dave", "h", Group::User).await.unwrap();
        let ad = store
            .create_advertisement(listing("Bike", "Dave", 120.0), Some(owner.id))
            .await
            .unwrap();

        let updated = store
            .update_advertisement(
                ad.id,
                AdvertisementChanges {
                    price: Some(10.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.price, 10.0);
        assert_eq!(updated.title, ad.title);
        assert_eq!(updated.description, ad.description);
        assert_eq!(updated.author, ad.author);
        assert_eq!(updated.created_at, ad.created_at);
        assert_eq!(updated.owner_id, Some(owner.id));
    }

    #[tokio::test]
    async fn empty_update_returns_current_row() {
        let store = store().await;
        let ad = store
            .create_advertisement(listing("Lamp", "Eve", 5.0), None)
            .await
            .unwrap();

        let same = store
            .update_advertisement(ad.id, AdvertisementChanges::default())
            .await
            .unwrap();
        assert_eq!(same, Some(ad));
    }

    #[tokio::test]
    async fn search_filters_text_case_insensitively_and_price_inclusively() {
        let store = store().await;
        store
            .create_advertisement(listing("Red Bicycle", "Alice Smith", 100.0), None)
            .await
            .unwrap();
        store
            .create_advertisement(listing("Blue bicycle", "Bob", 50.0), None)
            .await
            .unwrap();
        store
            .create_advertisement(listing("Sofa", "alice", 300.0), None)
            .await
            .unwrap();

        let by_title = store
            .search_advertisements(&AdvertisementFilter {
                title: Some("BICYCLE".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_title.len(), 2);

        let by_author = store
            .search_advertisements(&AdvertisementFilter {
                author: Some("ALICE".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_author.len(), 2);

        let by_price = store
            .search_advertisements(&AdvertisementFilter {
                min_price: Some(50.0),
                max_price: Some(100.0),
                ..Default::default()
            })
            .await
            .unwrap();
        let titles: Vec<_> = by_price.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Red Bicycle", "Blue bicycle"]);

        let everything = store
            .search_advertisements(&AdvertisementFilter {
                title: Some(String::new()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[tokio::test]
    async fn search_treats_like_wildcards_literally() {
        let store = store().await;
        store
            .create_advertisement(listing("100% cotton shirt", "Fay", 20.0), None)
            .await
            .unwrap();
        store
            .create_advertisement(listing("1000 piece puzzle", "Fay", 15.0), None)
            .await
            .unwrap();

        let hits = store
            .search_advertisements(&AdvertisementFilter {
                title: Some("100%".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% cotton shirt");
    }

    #[tokio::test]
    async fn deleting_owner_keeps_advertisement_owner_id() {
        let store = store().await;
        let owner = store.create_user("gus", "h", Group::User).await.unwrap();
        let ad = store
            .create_advertisement(listing("Desk", "Gus", 80.0), Some(owner.id))
            .await
            .unwrap();

        assert!(store.delete_user(owner.id).await.unwrap());
        let after = store.get_advertisement(ad.id).await.unwrap().unwrap();
        assert_eq!(after.owner_id, Some(owner.id));
    }
}
