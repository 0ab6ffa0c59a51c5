//! Domain service for logging in.
//!
//! Credentials are exchanged for a stateless bearer token. Nothing about the
//! session is stored server side.

use serde::Serialize;
use thiserror::Error;

use crate::auth::TokenError;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Token handed back after a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub token_type: &'static str,
    /// Lifetime of `token` in seconds.
    pub expires_in: i64,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a token for the user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user or a
    /// wrong password, without saying which.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;
}
