use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, header, request::Parts},
};
use std::sync::Arc;

use super::extract::ApiJson;
use super::validation::{validate_password, validate_username};
use super::{ApiError, ApiResponse, AppState, LoginRequest, TokenResponse, UserDto};
use crate::auth::{Identity, Principal};
use crate::services::AuthError;

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::Token(e) => Self::internal(e.to_string()),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// Caller that must present a valid bearer token. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

/// Caller that may be anonymous. Only store failures reject.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        let principal = state.identity().require(token).await?;
        record_user(&principal);
        Ok(Self(principal))
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        let identity = state.identity().resolve(token).await?;
        if let Identity::User(principal) = &identity {
            record_user(principal);
        }
        Ok(Self(identity))
    }
}

fn record_user(principal: &Principal) {
    tracing::Span::current().record("user_id", principal.id.value());
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively. Any other scheme, or an empty
/// token, counts as no token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /login
/// Exchange username and password for a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let result = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(TokenResponse {
        token: result.token,
        token_type: result.token_type.to_string(),
        expires_in: result.expires_in,
    })))
}

/// GET /user/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    // Re-read so the response carries the full record.
    let user = state
        .user_service()
        .get_user(principal.id)
        .await?;

    Ok(Json(ApiResponse::success(user.into())))
}
