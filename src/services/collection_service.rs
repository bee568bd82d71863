// src/services/collection_service.rs
// DOCUMENTATION: Business logic shared by albums and series

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{CollectionRepository, PhotoRepository};
use crate::errors::FolioError;
use crate::models::{
    CollectionDetailResponse, CollectionKind, CollectionPhotosRequest, CollectionResponse,
    CreateCollectionRequest, UpdateCollectionRequest,
};
use crate::services::slug::slugify_non_empty;
use crate::services::PhotoService;

/// Normalize a requested slug, or derive one from the title
fn resolve_slug(requested: Option<&str>, title: &str) -> Result<String, FolioError> {
    let source = requested.unwrap_or(title);
    slugify_non_empty(source).ok_or_else(|| {
        FolioError::ValidationError(format!("Cannot build a slug from '{}'", source))
    })
}

fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

pub struct CollectionService;

impl CollectionService {
    pub async fn list(
        pool: &PgPool,
        kind: CollectionKind,
        public_only: bool,
    ) -> Result<Vec<CollectionResponse>, FolioError> {
        let rows = CollectionRepository::list(pool, kind, public_only, None).await?;
        Ok(rows.iter().map(|r| r.to_response()).collect())
    }

    /// Public detail page: the collection and its public photos
    pub async fn public_detail(
        pool: &PgPool,
        kind: CollectionKind,
        slug: &str,
    ) -> Result<CollectionDetailResponse, FolioError> {
        let row = CollectionRepository::get_by_slug(pool, kind, slug, true).await?;
        let photos = CollectionRepository::photos(pool, kind, row.collection.id, true).await?;

        Ok(CollectionDetailResponse {
            collection: row.to_response(),
            photos: PhotoService::public_responses(pool, photos).await?,
        })
    }

    pub async fn admin_detail(
        pool: &PgPool,
        kind: CollectionKind,
        id: Uuid,
    ) -> Result<CollectionDetailResponse, FolioError> {
        let row = CollectionRepository::get_by_id(pool, kind, id).await?;
        let photos = CollectionRepository::photos(pool, kind, id, false).await?;

        Ok(CollectionDetailResponse {
            collection: row.to_response(),
            photos: PhotoService::public_responses(pool, photos).await?,
        })
    }

    pub async fn create(
        pool: &PgPool,
        kind: CollectionKind,
        req: CreateCollectionRequest,
    ) -> Result<CollectionResponse, FolioError> {
        let slug = resolve_slug(req.slug.as_deref(), &req.title)?;
        let created = CollectionRepository::create(pool, kind, &slug, &req).await?;
        let row = CollectionRepository::get_by_id(pool, kind, created.id).await?;
        Ok(row.to_response())
    }

    pub async fn update(
        pool: &PgPool,
        kind: CollectionKind,
        id: Uuid,
        req: UpdateCollectionRequest,
    ) -> Result<CollectionResponse, FolioError> {
        let slug = match req.slug.as_deref() {
            Some(requested) => Some(resolve_slug(Some(requested), requested)?),
            None => None,
        };

        if let Some(Some(cover_id)) = req.cover_photo_id {
            // Covers must exist; they need not belong to the collection
            PhotoRepository::get_by_id(pool, cover_id).await?;
        }

        CollectionRepository::update(pool, kind, id, slug.as_deref(), &req).await?;
        let row = CollectionRepository::get_by_id(pool, kind, id).await?;
        log::info!("Updated {} {}", kind.label(), id);
        Ok(row.to_response())
    }

    pub async fn delete(pool: &PgPool, kind: CollectionKind, id: Uuid) -> Result<(), FolioError> {
        CollectionRepository::delete(pool, kind, id).await
    }

    pub async fn add_photos(
        pool: &PgPool,
        kind: CollectionKind,
        id: Uuid,
        req: CollectionPhotosRequest,
    ) -> Result<CollectionDetailResponse, FolioError> {
        CollectionRepository::get_by_id(pool, kind, id).await?;
        let ids = dedup_ids(&req.photo_ids);
        let added = CollectionRepository::add_photos(pool, kind, id, &ids).await?;
        log::info!("Added {} photos to {} {}", added, kind.label(), id);
        Self::admin_detail(pool, kind, id).await
    }

    pub async fn set_photos(
        pool: &PgPool,
        kind: CollectionKind,
        id: Uuid,
        req: CollectionPhotosRequest,
    ) -> Result<CollectionDetailResponse, FolioError> {
        CollectionRepository::get_by_id(pool, kind, id).await?;
        let ids = dedup_ids(&req.photo_ids);
        let attached = CollectionRepository::set_photos(pool, kind, id, &ids).await?;
        log::info!("{} {} now holds {} photos", kind.label(), id, attached);
        Self::admin_detail(pool, kind, id).await
    }
}
