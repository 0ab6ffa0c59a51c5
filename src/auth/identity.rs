//! Maps a presented bearer token to a user of record.
//!
//! Two modes share one lookup: [`IdentityResolver::require`] fails with
//! [`IdentityError::Unauthenticated`] while [`IdentityResolver::resolve`]
//! falls back to [`Identity::Anonymous`].
//! A token whose user has since been deleted is indistinguishable from no
//! token at all.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::token::TokenIssuer;
use crate::db::{Store, User};
use crate::domain::{Group, UserId};

/// The authenticated caller, re-read from the store on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub group: Group,
}

impl Principal {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.group.is_admin()
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            group: user.group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(Principal),
}

impl Identity {
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Anonymous => None,
            Self::User(principal) => Some(principal),
        }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl From<Principal> for Identity {
    fn from(principal: Principal) -> Self {
        Self::User(principal)
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("Identity lookup failed: {0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct IdentityResolver {
    store: Store,
    tokens: Arc<TokenIssuer>,
}

impl IdentityResolver {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenIssuer>) -> Self {
        Self { store, tokens }
    }

    /// Resolve a caller that must be authenticated.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Unauthenticated`] when the token is absent, invalid,
    ///   expired, or names a user that no longer exists
    /// - [`IdentityError::Store`] when the user lookup itself fails
    pub async fn require(&self, bearer: Option<&str>) -> Result<Principal, IdentityError> {
        self.lookup(bearer)
            .await?
            .ok_or(IdentityError::Unauthenticated)
    }

    /// Resolve a caller that may be anonymous. Only store failures are errors.
    pub async fn resolve(&self, bearer: Option<&str>) -> Result<Identity, IdentityError> {
        Ok(self
            .lookup(bearer)
            .await?
            .map_or(Identity::Anonymous, Identity::User))
    }

    async fn lookup(&self, bearer: Option<&str>) -> Result<Option<Principal>, IdentityError> {
        let Some(token) = bearer else {
            return Ok(None);
        };

        let username = match self.tokens.verify(token) {
            Ok(subject) => subject,
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                return Ok(None);
            }
        };

        let user = self.store.get_user_by_username(&username).await?;
        if user.is_none() {
            debug!("Token subject has no matching user");
        }

        Ok(user.map(Principal::from))
    }
}
