// src/services/photo_service.rs
// DOCUMENTATION: Business logic for photos
// PURPOSE: Listings, upload with checksum dedup, visibility moves, bulk edits

use sqlx::PgPool;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{CollectionRepository, PhotoRepository, PublicPhotoFilter, TagRepository};
use crate::errors::FolioError;
use crate::models::{
    clamp_limit, into_page, normalize_tag_list, parse_cursor, thumbnail_name_for,
    AdminPhotoListQuery, AdminPhotoResponse, BulkAction, BulkPhotoRequest, CollectionKind, Cursor,
    NewPhoto, Page, Photo, PhotoListQuery, PhotoResponse, TagRef, UpdatePhotoRequest,
    UploadOutcome,
};
use crate::services::imaging::process_image_blocking;
use crate::services::storage::{checksum, ImageKind, MediaStore};

const MAX_TITLE_LEN: usize = 200;

/// One file received by the upload endpoint
#[derive(Debug)]
pub struct IncomingFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// Settings applied to every file of one upload request
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub is_public: bool,
    pub album_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub thumbnail_size: u32,
}

/// Default title: the original file stem with separators turned into spaces
pub fn title_from_file_name(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let title = stem
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title.chars().take(MAX_TITLE_LEN).collect()
    }
}

async fn discard_files(store: &MediaStore, is_public: bool, files: &[&str]) {
    if let Err(e) = store.remove_files(is_public, files).await {
        log::warn!("Could not clean up files {:?}: {}", files, e);
    }
}

/// Move `files` to the `is_public` directory, then run `update`.
/// The files are moved back if `update` fails.
async fn move_then_update<T, F, Fut>(
    store: &MediaStore,
    files: &[&str],
    is_public: bool,
    update: F,
) -> Result<T, FolioError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, FolioError>>,
{
    store.move_files(files, is_public).await?;

    match update().await {
        Ok(value) => Ok(value),
        Err(e) => {
            if let Err(undo) = store.move_files(files, !is_public).await {
                log::error!("Could not restore files {:?}: {}", files, undo);
            }
            Err(e)
        }
    }
}

fn position(photo: &Photo) -> Cursor {
    Cursor::new(photo.created_at, photo.id)
}

pub struct PhotoService;

impl PhotoService {
    async fn tags_for_page(
        pool: &PgPool,
        photos: &[Photo],
        limit: i64,
    ) -> Result<HashMap<Uuid, Vec<TagRef>>, FolioError> {
        let ids: Vec<Uuid> = photos.iter().take(limit as usize).map(|p| p.id).collect();
        PhotoRepository::tags_for(pool, &ids).await
    }

    /// Public responses for a list of photos, in the given order
    pub async fn public_responses(
        pool: &PgPool,
        photos: Vec<Photo>,
    ) -> Result<Vec<PhotoResponse>, FolioError> {
        let ids: Vec<Uuid> = photos.iter().map(|p| p.id).collect();
        let mut tags = PhotoRepository::tags_for(pool, &ids).await?;
        Ok(photos
            .into_iter()
            .map(|p| {
                let t = tags.remove(&p.id).unwrap_or_default();
                p.to_response(t)
            })
            .collect())
    }

    pub async fn list_public(
        pool: &PgPool,
        query: &PhotoListQuery,
    ) -> Result<Page<PhotoResponse>, FolioError> {
        let limit = clamp_limit(query.limit);
        let cursor = parse_cursor(query.cursor.as_deref())?;
        let filter = PublicPhotoFilter {
            tag_slug: query.tag.clone(),
            album_slug: query.album.clone(),
            series_slug: query.series.clone(),
            featured_only: query.featured.unwrap_or(false),
        };

        let rows = PhotoRepository::list_public(pool, &filter, cursor, limit).await?;
        let mut tags = Self::tags_for_page(pool, &rows, limit).await?;

        Ok(into_page(rows, limit, position, |p| {
            let t = tags.remove(&p.id).unwrap_or_default();
            p.to_response(t)
        }))
    }

    pub async fn get_public(pool: &PgPool, id: Uuid) -> Result<PhotoResponse, FolioError> {
        let photo = PhotoRepository::get_public_by_id(pool, id).await?;
        let mut tags = PhotoRepository::tags_for(pool, &[photo.id]).await?;
        Ok(photo.to_response(tags.remove(&photo.id).unwrap_or_default()))
    }

    pub async fn list_admin(
        pool: &PgPool,
        query: &AdminPhotoListQuery,
    ) -> Result<Page<AdminPhotoResponse>, FolioError> {
        let limit = clamp_limit(query.limit);
        let cursor = parse_cursor(query.cursor.as_deref())?;

        let rows =
            PhotoRepository::list_admin(pool, query.visibility, query.q.as_deref(), cursor, limit)
                .await?;
        let mut tags = Self::tags_for_page(pool, &rows, limit).await?;

        Ok(into_page(rows, limit, position, |p| {
            let t = tags.remove(&p.id).unwrap_or_default();
            p.to_admin_response(t)
        }))
    }

    pub async fn get_admin(pool: &PgPool, id: Uuid) -> Result<AdminPhotoResponse, FolioError> {
        let photo = PhotoRepository::get_by_id(pool, id).await?;
        Self::admin_response(pool, photo).await
    }

    async fn admin_response(pool: &PgPool, photo: Photo) -> Result<AdminPhotoResponse, FolioError> {
        let mut tags = PhotoRepository::tags_for(pool, &[photo.id]).await?;
        Ok(photo.to_admin_response(tags.remove(&photo.id).unwrap_or_default()))
    }

    async fn ensure_collection(
        pool: &PgPool,
        kind: CollectionKind,
        id: Option<Uuid>,
    ) -> Result<(), FolioError> {
        if let Some(id) = id {
            CollectionRepository::get_by_id(pool, kind, id).await?;
        }
        Ok(())
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: UpdatePhotoRequest,
    ) -> Result<AdminPhotoResponse, FolioError> {
        Self::ensure_collection(pool, CollectionKind::Album, req.album_id.flatten()).await?;
        Self::ensure_collection(pool, CollectionKind::Series, req.series_id.flatten()).await?;

        let photo = PhotoRepository::update(pool, id, &req).await?;

        if let Some(tags) = &req.tags {
            TagRepository::replace_photo_tags(pool, id, &normalize_tag_list(tags)).await?;
        }

        log::info!("Updated photo: {}", id);
        Self::admin_response(pool, photo).await
    }

    /// Move files to the matching directory, then flip the flag.
    /// Files are moved back if the database update fails.
    pub async fn set_visibility(
        pool: &PgPool,
        store: &MediaStore,
        id: Uuid,
        is_public: bool,
    ) -> Result<AdminPhotoResponse, FolioError> {
        let photo = PhotoRepository::get_by_id(pool, id).await?;
        if photo.is_public == is_public {
            return Self::admin_response(pool, photo).await;
        }

        let thumbnail = photo.thumbnail_file_name();
        let files = [photo.file_name.as_str(), thumbnail.as_str()];
        let updated = move_then_update(store, &files, is_public, || {
            PhotoRepository::set_visibility(pool, id, is_public)
        })
        .await?;

        log::info!(
            "Photo {} is now {}",
            id,
            if is_public { "public" } else { "private" }
        );
        Self::admin_response(pool, updated).await
    }

    pub async fn delete(pool: &PgPool, store: &MediaStore, id: Uuid) -> Result<(), FolioError> {
        let photo = PhotoRepository::delete(pool, id).await?;
        let thumbnail = photo.thumbnail_file_name();

        if let Err(e) = store
            .remove_files(photo.is_public, &[photo.file_name.as_str(), thumbnail.as_str()])
            .await
        {
            // The row is gone; stray files are only wasted space
            log::warn!("Photo {} deleted but its files remain: {}", id, e);
        }
        Ok(())
    }

    /// Location of a stored original or thumbnail
    pub async fn file_path(
        pool: &PgPool,
        store: &MediaStore,
        id: Uuid,
        thumbnail: bool,
    ) -> Result<PathBuf, FolioError> {
        let photo = PhotoRepository::get_by_id(pool, id).await?;
        let name = if thumbnail {
            photo.thumbnail_file_name()
        } else {
            photo.file_name
        };
        store.path_for(photo.is_public, &name)
    }

    async fn bulk_visibility(
        pool: &PgPool,
        store: &MediaStore,
        ids: &[Uuid],
        is_public: bool,
    ) -> Result<u64, FolioError> {
        let mut count = 0;
        for photo in PhotoRepository::get_many(pool, ids).await? {
            if photo.is_public == is_public {
                continue;
            }
            Self::set_visibility(pool, store, photo.id, is_public).await?;
            count += 1;
        }
        Ok(count)
    }

    /// Apply one action to many photos; returns the number of photos affected
    pub async fn bulk(
        pool: &PgPool,
        store: &MediaStore,
        req: BulkPhotoRequest,
    ) -> Result<u64, FolioError> {
        let mut ids = req.ids;
        ids.sort();
        ids.dedup();

        let affected = match req.action {
            BulkAction::Publish => Self::bulk_visibility(pool, store, &ids, true).await?,
            BulkAction::Unpublish => Self::bulk_visibility(pool, store, &ids, false).await?,
            BulkAction::Feature => PhotoRepository::set_featured(pool, &ids, true).await?,
            BulkAction::Unfeature => PhotoRepository::set_featured(pool, &ids, false).await?,
            BulkAction::Delete => {
                let mut count = 0;
                for id in &ids {
                    match Self::delete(pool, store, *id).await {
                        Ok(()) => count += 1,
                        Err(FolioError::NotFound(_)) => {
                            log::debug!("Bulk delete skipped missing photo {}", id)
                        }
                        Err(e) => return Err(e),
                    }
                }
                count
            }
            BulkAction::AddTags { tags } => {
                let tags = normalize_tag_list(&tags);
                if tags.is_empty() {
                    return Err(FolioError::ValidationError("No valid tags given".to_string()));
                }
                TagRepository::add_to_photos(pool, &ids, &tags).await?
            }
            BulkAction::SetAlbum { album_id } => {
                Self::ensure_collection(pool, CollectionKind::Album, album_id).await?;
                PhotoRepository::set_album(pool, &ids, album_id).await?
            }
        };

        log::info!("Bulk action affected {} photos", affected);
        Ok(affected)
    }

    /// Ingest every file of one upload request, in order.
    /// All files are checked for a supported format before anything is stored.
    pub async fn ingest_all(
        pool: &PgPool,
        store: &MediaStore,
        options: &UploadOptions,
        files: Vec<IncomingFile>,
    ) -> Result<Vec<UploadOutcome>, FolioError> {
        if files.is_empty() {
            return Err(FolioError::InvalidInput("No files in upload".to_string()));
        }
        if let Some(bad) = files.iter().find(|f| ImageKind::detect(&f.bytes).is_none()) {
            return Err(FolioError::UnsupportedMediaType(bad.original_name.clone()));
        }
        Self::ensure_collection(pool, CollectionKind::Album, options.album_id).await?;

        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            outcomes.push(Self::ingest(pool, store, options, file).await?);
        }
        Ok(outcomes)
    }

    /// Store one uploaded file unless an identical one already exists
    pub async fn ingest(
        pool: &PgPool,
        store: &MediaStore,
        options: &UploadOptions,
        file: IncomingFile,
    ) -> Result<UploadOutcome, FolioError> {
        let kind = ImageKind::detect(&file.bytes)
            .ok_or_else(|| FolioError::UnsupportedMediaType(file.original_name.clone()))?;
        let digest = checksum(&file.bytes);

        if let Some(existing) = PhotoRepository::get_by_checksum(pool, &digest).await? {
            log::info!(
                "Upload of {} matches existing photo {}",
                file.original_name,
                existing.id
            );
            return Ok(UploadOutcome {
                photo: Self::admin_response(pool, existing).await?,
                duplicate: true,
            });
        }

        let bytes = Arc::new(file.bytes);
        let processed = process_image_blocking(bytes.clone(), options.thumbnail_size).await?;

        let id = Uuid::new_v4();
        let file_name = format!("{}.{}", id, kind.extension());
        let thumbnail_name = thumbnail_name_for(&file_name);

        store
            .write_pair(
                options.is_public,
                &file_name,
                &bytes,
                &thumbnail_name,
                &processed.thumbnail,
            )
            .await?;

        let new_photo = NewPhoto {
            id,
            title: title_from_file_name(&file.original_name),
            file_name: file_name.clone(),
            original_name: file.original_name.clone(),
            mime_type: kind.mime_type().to_string(),
            checksum: digest.clone(),
            size_bytes: bytes.len() as i64,
            width: processed.width as i32,
            height: processed.height as i32,
            is_public: options.is_public,
            album_id: options.album_id,
        };

        let inserted = PhotoRepository::insert(pool, &new_photo).await;
        let written = [file_name.as_str(), thumbnail_name.as_str()];

        match inserted {
            Ok(Some(photo)) => {
                if !options.tags.is_empty() {
                    TagRepository::replace_photo_tags(pool, photo.id, &options.tags).await?;
                }
                log::info!(
                    "Stored {} as photo {} ({}x{})",
                    file.original_name,
                    photo.id,
                    photo.width,
                    photo.height
                );
                Ok(UploadOutcome {
                    photo: Self::admin_response(pool, photo).await?,
                    duplicate: false,
                })
            }
            Ok(None) => {
                // A concurrent upload of the same bytes won the insert
                discard_files(store, options.is_public, &written).await;
                let existing = PhotoRepository::get_by_checksum(pool, &digest)
                    .await?
                    .ok_or(FolioError::InternalError)?;
                Ok(UploadOutcome {
                    photo: Self::admin_response(pool, existing).await?,
                    duplicate: true,
                })
            }
            Err(e) => {
                discard_files(store, options.is_public, &written).await;
                Err(e)
            }
        }
    }
}
