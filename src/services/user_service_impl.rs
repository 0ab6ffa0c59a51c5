//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::auth::password::hash_password_blocking;
use crate::auth::{ADMIN_ONLY, Identity, Operation, Resource, authorize};
use crate::config::SecurityConfig;
use crate::db::{Store, User, UserChanges};
use crate::domain::{Group, UserId};
use crate::services::user_service::{UserError, UserService, UserUpdate};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn hash(&self, password: &str) -> Result<String, UserError> {
        Ok(hash_password_blocking(password.to_string(), self.security.clone()).await?)
    }

    async fn existing(&self, id: UserId) -> Result<User, UserError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, username: &str, password: &str) -> Result<User, UserError> {
        let password_hash = self.hash(password).await?;
        Ok(self
            .store
            .create_user(username, &password_hash, Group::User)
            .await?)
    }

    async fn ensure_admin(&self, username: &str, password: &str) -> Result<User, UserError> {
        let password_hash = self.hash(password).await?;

        if let Some(user) = self.store.get_user_by_username(username).await? {
            let changes = UserChanges {
                password_hash: Some(password_hash),
                group: Some(Group::Admin),
                ..Default::default()
            };
            let promoted = self
                .store
                .update_user(user.id, changes)
                .await?
                .ok_or(UserError::NotFound(user.id))?;
            info!("Promoted {} to admin", promoted.username);
            return Ok(promoted);
        }

        Ok(self
            .store
            .create_user(username, &password_hash, Group::Admin)
            .await?)
    }

    async fn get_user(&self, id: UserId) -> Result<User, UserError> {
        self.existing(id).await
    }

    async fn update_user(
        &self,
        actor: &Identity,
        id: UserId,
        update: UserUpdate,
    ) -> Result<User, UserError> {
        let target = self.existing(id).await?;
        let resource = Resource::User { id: target.id };

        authorize(actor, Operation::Update, resource, None).into_result()?;
        if update.group.is_some() {
            authorize(actor, Operation::Update, resource, Some(ADMIN_ONLY)).into_result()?;
        }

        let password_hash = match update.password.as_deref() {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };

        let changes = UserChanges {
            username: update.username,
            password_hash,
            group: update.group,
        };

        self.store
            .update_user(id, changes)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn delete_user(&self, actor: &Identity, id: UserId) -> Result<(), UserError> {
        let target = self.existing(id).await?;
        authorize(actor, Operation::Delete, Resource::User { id: target.id }, None)
            .into_result()?;

        if !self.store.delete_user(id).await? {
            return Err(UserError::NotFound(id));
        }

        info!("Deleted user {} ({})", target.username, target.id);
        Ok(())
    }
}
