//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::TokenIssuer;
use crate::auth::password::verify_password_blocking;
use crate::db::Store;
use crate::services::auth_service::{AuthError, AuthService, LoginResult};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenIssuer>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenIssuer>) -> Self {
        Self { store, tokens }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some((user, password_hash)) = self.store.get_user_with_password(username).await?
        else {
            debug!("Login attempt for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid = verify_password_blocking(password.to_string(), password_hash).await?;
        if !is_valid {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.username)?;
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResult {
            token,
            token_type: "bearer",
            expires_in: self.tokens.ttl().num_seconds(),
        })
    }
}
