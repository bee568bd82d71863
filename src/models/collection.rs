// src/models/collection.rs
// DOCUMENTATION: Albums and series share one shape
// PURPOSE: Curated groups of photos, addressed by slug

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::photo::double_option;
use crate::models::PhotoResponse;

/// Which table a collection lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Album,
    Series,
}

impl CollectionKind {
    pub fn table(&self) -> &'static str {
        match self {
            CollectionKind::Album => "albums",
            CollectionKind::Series => "series",
        }
    }

    /// Foreign key column on `photos`
    pub fn photo_column(&self) -> &'static str {
        match self {
            CollectionKind::Album => "album_id",
            CollectionKind::Series => "series_id",
        }
    }

    /// Ordering of member photos
    pub fn photo_order(&self) -> &'static str {
        match self {
            CollectionKind::Album => "ph.taken_at DESC NULLS LAST, ph.created_at DESC, ph.id DESC",
            CollectionKind::Series => {
                "ph.series_position ASC NULLS LAST, ph.created_at ASC, ph.id ASC"
            }
        }
    }

    /// Series keep an explicit position per photo
    pub fn is_ordered(&self) -> bool {
        matches!(self, CollectionKind::Series)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CollectionKind::Album => "album",
            CollectionKind::Series => "series",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub cover_photo_id: Option<Uuid>,
    pub is_public: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Collection joined with its photo count and cover file
#[derive(Debug, Clone, FromRow)]
pub struct CollectionSummaryRow {
    #[sqlx(flatten)]
    pub collection: Collection,
    pub photo_count: i64,
    pub cover_file_name: Option<String>,
    pub cover_is_public: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub cover_photo_id: Option<Uuid>,
    pub cover_thumbnail_url: Option<String>,
    pub is_public: bool,
    pub sort_order: i32,
    pub photo_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionSummaryRow {
    pub fn to_response(&self) -> CollectionResponse {
        let c = &self.collection;
        let cover_thumbnail_url = match (&self.cover_file_name, c.cover_photo_id) {
            (Some(file_name), _) if self.cover_is_public == Some(true) => Some(format!(
                "/media/{}",
                crate::models::thumbnail_name_for(file_name)
            )),
            (Some(_), Some(cover_id)) => Some(format!(
                "/api/admin/photos/{}/file?variant=thumbnail",
                cover_id
            )),
            _ => None,
        };

        CollectionResponse {
            id: c.id,
            slug: c.slug.clone(),
            title: c.title.clone(),
            description: c.description.clone(),
            cover_photo_id: c.cover_photo_id,
            cover_thumbnail_url,
            is_public: c.is_public,
            sort_order: c.sort_order,
            photo_count: self.photo_count,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionDetailResponse {
    #[serde(flatten)]
    pub collection: CollectionResponse,
    pub photos: Vec<PhotoResponse>,
}

/// Request DTO for creating an album or series
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCollectionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Derived from the title when omitted
    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub is_public: Option<bool>,

    pub sort_order: Option<i32>,
}

/// Request DTO for partial updates; `null` clears the description or the cover
#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateCollectionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,

    #[validate(length(max = 5000))]
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub is_public: Option<bool>,

    pub sort_order: Option<i32>,

    #[serde(default, deserialize_with = "double_option")]
    pub cover_photo_id: Option<Option<Uuid>>,
}

/// Photo ids to append, or the full ordered membership for PUT
#[derive(Debug, Deserialize, Validate)]
pub struct CollectionPhotosRequest {
    #[validate(length(max = 1000))]
    pub photo_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cover_public: Option<bool>) -> CollectionSummaryRow {
        let now = Utc::now();
        CollectionSummaryRow {
            collection: Collection {
                id: Uuid::new_v4(),
                slug: "iceland".into(),
                title: "Iceland".into(),
                description: None,
                cover_photo_id: cover_public.map(|_| Uuid::new_v4()),
                is_public: true,
                sort_order: 0,
                created_at: now,
                updated_at: now,
            },
            photo_count: 12,
            cover_file_name: cover_public.map(|_| "cover.jpg".to_string()),
            cover_is_public: cover_public,
        }
    }

    #[test]
    fn test_cover_url_for_public_cover() {
        let resp = row(Some(true)).to_response();
        assert_eq!(resp.cover_thumbnail_url.as_deref(), Some("/media/cover_thumb.jpg"));
        assert_eq!(resp.photo_count, 12);
    }

    #[test]
    fn test_cover_url_for_private_cover_uses_admin_route() {
        let resp = row(Some(false)).to_response();
        let url = resp.cover_thumbnail_url.unwrap();
        assert!(url.starts_with("/api/admin/photos/"));
    }

    #[test]
    fn test_no_cover() {
        assert!(row(None).to_response().cover_thumbnail_url.is_none());
    }

    #[test]
    fn test_kind_columns() {
        assert_eq!(CollectionKind::Album.photo_column(), "album_id");
        assert_eq!(CollectionKind::Series.table(), "series");
        assert!(CollectionKind::Series.is_ordered());
        assert!(!CollectionKind::Album.is_ordered());
    }
}
