use serde::{Deserialize, Serialize};

use crate::db::{Advertisement, User};
use crate::domain::{AdvertisementId, Group, UserId};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Public view of a user. The password hash never leaves the store layer.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: UserId,
    pub username: String,
    pub group: Group,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            group: user.group,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub group: Option<Group>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

// ============================================================================
// Advertisements
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AdvertisementDto {
    pub id: AdvertisementId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub author: String,
    pub created_at: String,
    pub owner_id: Option<UserId>,
}

impl From<Advertisement> for AdvertisementDto {
    fn from(ad: Advertisement) -> Self {
        Self {
            id: ad.id,
            title: ad.title,
            description: ad.description,
            price: ad.price,
            author: ad.author,
            created_at: ad.created_at,
            owner_id: ad.owner_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAdvertisementRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub author: String,
}

/// Partial update body. A field sent as `null` counts as absent.
#[derive(Debug, Deserialize)]
pub struct UpdateAdvertisementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub author: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdvertisementSearchQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}
