use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::{AuthUser, MaybeUser};
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::validation::{validate_id, validate_price_range, validate_title};
use super::{
    AdvertisementDto, AdvertisementSearchQuery, ApiError, ApiResponse, AppState,
    CreateAdvertisementRequest, MessageResponse, UpdateAdvertisementRequest,
};
use crate::auth::Identity;
use crate::db::{AdvertisementChanges, AdvertisementFilter, NewAdvertisement};
use crate::domain::AdvertisementId;
use crate::services::AdvertisementError;

impl From<AdvertisementError> for ApiError {
    fn from(err: AdvertisementError) -> Self {
        match err {
            AdvertisementError::NotFound(id) => Self::not_found("Advertisement", id),
            AdvertisementError::Denied(reason) => reason.into(),
            AdvertisementError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

/// POST /advertisement
/// The listing is owned by the caller.
pub async fn create_advertisement(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    ApiJson(payload): ApiJson<CreateAdvertisementRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdvertisementDto>>), ApiError> {
    validate_title(&payload.title)?;

    let listing = NewAdvertisement {
        title: payload.title,
        description: payload.description,
        price: payload.price,
        author: payload.author,
    };

    let ad = state
        .advertisement_service()
        .create(&Identity::User(principal), listing)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(ad.into()))))
}

/// GET /advertisement/{id}
pub async fn get_advertisement(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<AdvertisementDto>>, ApiError> {
    let id = AdvertisementId::new(validate_id(id)?);
    let ad = state.advertisement_service().get(id).await?;
    Ok(Json(ApiResponse::success(ad.into())))
}

/// PATCH /advertisement/{id}
/// Owner or admin. Only the fields present in the body are written.
pub async fn update_advertisement(
    State(state): State<Arc<AppState>>,
    MaybeUser(identity): MaybeUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateAdvertisementRequest>,
) -> Result<Json<ApiResponse<AdvertisementDto>>, ApiError> {
    let id = AdvertisementId::new(validate_id(id)?);
    if let Some(title) = payload.title.as_deref() {
        validate_title(title)?;
    }

    let changes = AdvertisementChanges {
        title: payload.title,
        description: payload.description,
        price: payload.price,
        author: payload.author,
    };

    let ad = state
        .advertisement_service()
        .update(&identity, id, changes)
        .await?;

    Ok(Json(ApiResponse::success(ad.into())))
}

/// DELETE /advertisement/{id}
pub async fn delete_advertisement(
    State(state): State<Arc<AppState>>,
    MaybeUser(identity): MaybeUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = AdvertisementId::new(validate_id(id)?);
    state.advertisement_service().delete(&identity, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Advertisement deleted",
    ))))
}

/// GET /advertisement?title=&author=&min_price=&max_price=
pub async fn search_advertisements(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<AdvertisementSearchQuery>,
) -> Result<Json<ApiResponse<Vec<AdvertisementDto>>>, ApiError> {
    validate_price_range(query.min_price, query.max_price)?;

    let filter = AdvertisementFilter {
        title: query.title,
        author: query.author,
        min_price: query.min_price,
        max_price: query.max_price,
    };

    let ads = state.advertisement_service().search(&filter).await?;
    Ok(Json(ApiResponse::success(
        ads.into_iter().map(AdvertisementDto::from).collect(),
    )))
}
