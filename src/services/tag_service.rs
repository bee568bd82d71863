// src/services/tag_service.rs
// DOCUMENTATION: Business logic for tags

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::TagRepository;
use crate::errors::FolioError;
use crate::models::{
    normalize_tag_name, MergeTagsRequest, MergeTagsResponse, PhotoListQuery, Tag,
    TagDetailResponse, TagPhotosQuery, TagWithCount,
};
use crate::services::PhotoService;

/// Sources without duplicates; the target may not be among them
fn merge_sources(req: &MergeTagsRequest) -> Result<Vec<Uuid>, FolioError> {
    let mut sources = req.source_ids.clone();
    sources.sort();
    sources.dedup();

    if sources.is_empty() {
        return Err(FolioError::InvalidInput("No source tags given".to_string()));
    }
    if sources.contains(&req.target_id) {
        return Err(FolioError::InvalidInput(
            "The target tag cannot also be a source".to_string(),
        ));
    }
    Ok(sources)
}

fn clean_name(raw: &str) -> Result<String, FolioError> {
    normalize_tag_name(raw)
        .ok_or_else(|| FolioError::ValidationError("Tag name must be 1-64 characters".to_string()))
}

pub struct TagService;

impl TagService {
    pub async fn list_public(pool: &PgPool) -> Result<Vec<TagWithCount>, FolioError> {
        TagRepository::list_public(pool).await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<TagWithCount>, FolioError> {
        TagRepository::list_all(pool).await
    }

    /// Tag page: the tag and a page of its public photos
    pub async fn public_detail(
        pool: &PgPool,
        slug: &str,
        query: &TagPhotosQuery,
    ) -> Result<TagDetailResponse, FolioError> {
        let tag = TagRepository::get_public_by_slug(pool, slug).await?;
        if tag.photo_count == 0 {
            return Err(FolioError::NotFound(format!("tag '{}'", slug)));
        }

        let photos = PhotoService::list_public(
            pool,
            &PhotoListQuery {
                cursor: query.cursor.clone(),
                limit: query.limit,
                tag: Some(tag.slug.clone()),
                ..PhotoListQuery::default()
            },
        )
        .await?;

        Ok(TagDetailResponse { tag, photos })
    }

    pub async fn create(pool: &PgPool, name: &str) -> Result<Tag, FolioError> {
        let name = clean_name(name)?;
        TagRepository::create(pool, &name).await
    }

    pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Tag, FolioError> {
        let name = clean_name(name)?;
        let tag = TagRepository::rename(pool, id, &name).await?;
        log::info!("Renamed tag {} to {}", id, tag.name);
        Ok(tag)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), FolioError> {
        TagRepository::delete(pool, id).await
    }

    pub async fn merge(pool: &PgPool, req: &MergeTagsRequest) -> Result<MergeTagsResponse, FolioError> {
        let sources = merge_sources(req)?;
        let (target, merged, removed_tags) = TagRepository::merge(pool, &sources, req.target_id).await?;
        Ok(MergeTagsResponse {
            target,
            merged,
            removed_tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sources_dedupes() {
        let a = Uuid::new_v4();
        let target = Uuid::new_v4();
        let req = MergeTagsRequest {
            source_ids: vec![a, a],
            target_id: target,
        };
        assert_eq!(merge_sources(&req).unwrap(), vec![a]);
    }

    #[test]
    fn test_merge_sources_rejects_target_in_sources() {
        let target = Uuid::new_v4();
        let req = MergeTagsRequest {
            source_ids: vec![Uuid::new_v4(), target],
            target_id: target,
        };
        assert!(matches!(merge_sources(&req), Err(FolioError::InvalidInput(_))));
    }

    #[test]
    fn test_merge_sources_rejects_empty() {
        let req = MergeTagsRequest {
            source_ids: vec![],
            target_id: Uuid::new_v4(),
        };
        assert!(merge_sources(&req).is_err());
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  long   exposure ").unwrap(), "long exposure");
        assert!(clean_name(" ").is_err());
    }
}
