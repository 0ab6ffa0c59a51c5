use crate::domain::{AdvertisementId, UserId};
use crate::entities::{advertisements, prelude::*};
use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

/// Repository for advertisement operations
pub struct AdvertisementRepository {
    conn: DatabaseConnection,
}

impl AdvertisementRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(m: advertisements::Model) -> Advertisement {
        Advertisement {
            id: AdvertisementId::new(m.id),
            title: m.title,
            description: m.description,
            price: m.price,
            author: m.author,
            created_at: m.created_at,
            owner_id: m.owner_id.map(UserId::new),
        }
    }

    // ========================================================================
    // Advertisement Operations
    // ========================================================================

    pub async fn create(
        &self,
        ad: NewAdvertisement,
        owner_id: Option<UserId>,
    ) -> Result<Advertisement> {
        let active_model = advertisements::ActiveModel {
            title: Set(ad.title),
            description: Set(ad.description),
            price: Set(ad.price),
            author: Set(ad.author),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            owner_id: Set(owner_id.map(|id| id.value())),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert advertisement")?;

        info!("Created advertisement {}: {}", model.id, model.title);
        Ok(Self::map_model(model))
    }

    pub async fn get(&self, id: AdvertisementId) -> Result<Option<Advertisement>> {
        let result = Advertisements::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query advertisement")?;

        Ok(result.map(Self::map_model))
    }

    /// Write only the fields present in `changes`. `owner_id` and
    /// `created_at` are never touched.
    pub async fn update(
        &self,
        id: AdvertisementId,
        changes: AdvertisementChanges,
    ) -> Result<Option<Advertisement>> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        let Some(model) = Advertisements::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query advertisement for update")?
        else {
            return Ok(None);
        };

        let mut active: advertisements::ActiveModel = model.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(author) = changes.author {
            active.author = Set(author);
        }

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update advertisement")?;

        Ok(Some(Self::map_model(model)))
    }

    pub async fn delete(&self, id: AdvertisementId) -> Result<bool> {
        let result = Advertisements::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete advertisement")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn search(&self, filter: &AdvertisementFilter) -> Result<Vec<Advertisement>> {
        let mut query = Advertisements::find();

        if let Some(title) = filter.title.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(contains_ignore_case(advertisements::Column::Title, title));
        }
        if let Some(author) = filter.author.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(contains_ignore_case(advertisements::Column::Author, author));
        }
        if let Some(min_price) = filter.min_price {
            query = query.filter(advertisements::Column::Price.gte(min_price));
        }
        if let Some(max_price) = filter.max_price {
            query = query.filter(advertisements::Column::Price.lte(max_price));
        }

        let rows = query
            .order_by_asc(advertisements::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to search advertisements")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }
}

/// `lower(column) LIKE '%needle%'`, with LIKE wildcards in the needle
/// matched literally.
fn contains_ignore_case(column: advertisements::Column, needle: &str) -> SimpleExpr {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    Expr::expr(Func::lower(Expr::col(column)))
        .like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Advertisement {
    pub id: AdvertisementId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub author: String,
    pub created_at: String,
    pub owner_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAdvertisement {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub author: String,
}

/// Partial update. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvertisementChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub author: Option<String>,
}

impl AdvertisementChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.author.is_none()
    }
}

/// Search criteria. Text filters match case-insensitive substrings, the
/// price bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvertisementFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}
