//! Domain service for user accounts.
//!
//! Registration is open. Every other mutation is authorized against the
//! caller's identity after the target has been loaded.

use thiserror::Error;

use crate::auth::{DenyReason, Identity};
use crate::db::{User, UserWriteError};
use crate::domain::{Group, UserId};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("Username '{0}' is already registered")]
    Conflict(String),

    #[error("{0}")]
    Denied(DenyReason),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<UserWriteError> for UserError {
    fn from(err: UserWriteError) -> Self {
        match err {
            UserWriteError::UsernameTaken(name) => Self::Conflict(name),
            UserWriteError::Database(e) => e.into(),
        }
    }
}

impl From<DenyReason> for UserError {
    fn from(reason: DenyReason) -> Self {
        Self::Denied(reason)
    }
}

/// Fields a caller asked to change. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub group: Option<Group>,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates a regular user.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] if the username is taken.
    async fn register(&self, username: &str, password: &str) -> Result<User, UserError>;

    /// Creates an admin, or promotes an existing user and resets their
    /// password. Used by the command line, never over HTTP.
    async fn ensure_admin(&self, username: &str, password: &str) -> Result<User, UserError>;

    async fn get_user(&self, id: UserId) -> Result<User, UserError>;

    /// Applies a partial update on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// - [`UserError::NotFound`] if the target does not exist, checked first
    /// - [`UserError::Denied`] unless `actor` is the target or an admin, or
    ///   when a non-admin touches `group`
    /// - [`UserError::Conflict`] when renaming onto a taken username
    async fn update_user(
        &self,
        actor: &Identity,
        id: UserId,
        update: UserUpdate,
    ) -> Result<User, UserError>;

    async fn delete_user(&self, actor: &Identity, id: UserId) -> Result<(), UserError>;
}
