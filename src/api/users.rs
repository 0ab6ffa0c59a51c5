use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::MaybeUser;
use super::extract::{ApiJson, ApiPath};
use super::validation::{validate_id, validate_password, validate_username};
use super::{
    ApiError, ApiResponse, AppState, MessageResponse, RegisterRequest, UpdateUserRequest, UserDto,
};
use crate::domain::UserId;
use crate::services::{UserError, UserUpdate};

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => Self::not_found("User", id),
            UserError::Conflict(_) => Self::Conflict(err.to_string()),
            UserError::Denied(reason) => reason.into(),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// POST /user
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let user = state
        .user_service()
        .register(&payload.username, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

/// GET /user/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = UserId::new(validate_id(id)?);
    let user = state.user_service().get_user(id).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// PATCH /user/{id}
/// Self or admin. Changing `group` is admin-only.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    MaybeUser(identity): MaybeUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = UserId::new(validate_id(id)?);
    if let Some(username) = payload.username.as_deref() {
        validate_username(username)?;
    }
    if let Some(password) = payload.password.as_deref() {
        validate_password(password)?;
    }

    let update = UserUpdate {
        username: payload.username,
        password: payload.password,
        group: payload.group,
    };

    let user = state
        .user_service()
        .update_user(&identity, id, update)
        .await?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// DELETE /user/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    MaybeUser(identity): MaybeUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = UserId::new(validate_id(id)?);
    state.user_service().delete_user(&identity, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("User deleted"))))
}
