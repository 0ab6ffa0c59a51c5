use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{Group, UserId};
use crate::entities::{prelude::*, users};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub group: Group,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        let group = model.group.parse().unwrap_or_else(|e| {
            warn!(user_id = model.id, "{e}; treating as regular user");
            Group::User
        });

        Self {
            id: UserId::new(model.id),
            username: model.username,
            group,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields to overwrite on an existing user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub group: Option<Group>,
}

#[derive(Debug, Error)]
pub enum UserWriteError {
    #[error("Username '{0}' is already registered")]
    UsernameTaken(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Get user by username together with the stored password hash
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Insert a new user.
    ///
    /// The availability check only gives a friendly early answer. The unique
    /// index on `username` decides between concurrent registrations, and its
    /// violation maps to the same [`UserWriteError::UsernameTaken`].
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        group: Group,
    ) -> Result<User, UserWriteError> {
        if self.username_taken(username, None).await? {
            return Err(UserWriteError::UsernameTaken(username.to_string()));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            group: Set(group.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .map_err(|e| map_write_error(e, username))?;

        info!("Created user {} ({})", model.username, model.id);
        Ok(model.into())
    }

    /// Apply a partial update. Returns `None` if the user does not exist.
    pub async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<User>, UserWriteError> {
        let Some(model) = Users::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        if let Some(new_name) = changes.username.as_deref()
            && new_name != model.username
            && self.username_taken(new_name, Some(id)).await?
        {
            return Err(UserWriteError::UsernameTaken(new_name.to_string()));
        }

        let attempted_name = changes.username.clone().unwrap_or_default();
        let mut active: users::ActiveModel = model.into();
        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(password_hash) = changes.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(group) = changes.group {
            active.group = Set(group.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        match active.update(&self.conn).await {
            Ok(model) => Ok(Some(model.into())),
            // Deleted between the read and the write.
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(map_write_error(e, &attempted_name)),
        }
    }

    async fn username_taken(&self, username: &str, except: Option<UserId>) -> Result<bool, DbErr> {
        let mut query = Users::find().filter(users::Column::Username.eq(username));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id.value()));
        }
        Ok(query.one(&self.conn).await?.is_some())
    }

    pub async fn delete(&self, id: UserId) -> Result<bool> {
        let result = Users::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }
}

fn map_write_error(err: DbErr, username: &str) -> UserWriteError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        UserWriteError::UsernameTaken(username.to_string())
    } else {
        UserWriteError::Database(err)
    }
}
