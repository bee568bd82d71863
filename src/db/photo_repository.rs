// src/db/photo_repository.rs
// DOCUMENTATION: Photo database operations
// PURPOSE: Photo CRUD, keyset listings and tag lookups

use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::{map_db_error, FolioError};
use crate::models::{
    Cursor, NewPhoto, Photo, PhotoTagRow, TagRef, UpdatePhotoRequest, Visibility,
};

const PHOTO_COLUMNS: &str = r#"
    ph.id, ph.title, ph.description, ph.file_name, ph.original_name, ph.mime_type,
    ph.checksum, ph.size_bytes, ph.width, ph.height, ph.is_public, ph.is_featured,
    ph.album_id, ph.series_id, ph.series_position, ph.taken_at, ph.view_count,
    ph.created_at, ph.updated_at
"#;

/// Filters for the public gallery listing
#[derive(Debug, Default, Clone)]
pub struct PublicPhotoFilter {
    pub tag_slug: Option<String>,
    pub album_slug: Option<String>,
    pub series_slug: Option<String>,
    pub featured_only: bool,
}

fn push_keyset(qb: &mut QueryBuilder<'_, Postgres>, cursor: Option<Cursor>) {
    if let Some(cursor) = cursor {
        qb.push(" AND (ph.created_at, ph.id) < (")
            .push_bind(cursor.created_at)
            .push(", ")
            .push_bind(cursor.id)
            .push(")");
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, limit: i64) {
    qb.push(" ORDER BY ph.created_at DESC, ph.id DESC LIMIT ")
        .push_bind(limit + 1);
}

/// Escape LIKE wildcards in user input
fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub struct PhotoRepository;

impl PhotoRepository {
    /// Retrieve any photo by ID (admin view)
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Photo, FolioError> {
        let sql = format!("SELECT {} FROM photos ph WHERE ph.id = $1", PHOTO_COLUMNS);
        sqlx::query_as::<_, Photo>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error("Fetch photo", e))?
            .ok_or_else(|| {
                log::warn!("Photo not found: {}", id);
                FolioError::NotFound(format!("photo {}", id))
            })
    }

    /// Retrieve a public photo; private photos are reported as missing
    pub async fn get_public_by_id(pool: &PgPool, id: Uuid) -> Result<Photo, FolioError> {
        let photo = Self::get_by_id(pool, id).await?;
        if !photo.is_public {
            return Err(FolioError::NotFound(format!("photo {}", id)));
        }
        Ok(photo)
    }

    pub async fn get_by_checksum(pool: &PgPool, checksum: &str) -> Result<Option<Photo>, FolioError> {
        let sql = format!("SELECT {} FROM photos ph WHERE ph.checksum = $1", PHOTO_COLUMNS);
        sqlx::query_as::<_, Photo>(&sql)
            .bind(checksum)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error("Fetch photo by checksum", e))
    }

    /// Insert a new photo. Returns None when a photo with the same checksum
    /// already exists.
    pub async fn insert(pool: &PgPool, photo: &NewPhoto) -> Result<Option<Photo>, FolioError> {
        sqlx::query_as::<_, Photo>(
            r#"
            INSERT INTO photos (
                id, title, file_name, original_name, mime_type, checksum,
                size_bytes, width, height, is_public, album_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (checksum) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(photo.id)
        .bind(&photo.title)
        .bind(&photo.file_name)
        .bind(&photo.original_name)
        .bind(&photo.mime_type)
        .bind(&photo.checksum)
        .bind(photo.size_bytes)
        .bind(photo.width)
        .bind(photo.height)
        .bind(photo.is_public)
        .bind(photo.album_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_db_error("Insert photo", e))
    }

    /// Public photos, newest first. Fetches `limit + 1` rows.
    pub async fn list_public(
        pool: &PgPool,
        filter: &PublicPhotoFilter,
        cursor: Option<Cursor>,
        limit: i64,
    ) -> Result<Vec<Photo>, FolioError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(PHOTO_COLUMNS).push(" FROM photos ph WHERE ph.is_public = true");

        if let Some(tag) = &filter.tag_slug {
            qb.push(
                " AND EXISTS (SELECT 1 FROM photo_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.photo_id = ph.id AND t.slug = ",
            )
            .push_bind(tag.clone())
            .push(")");
        }
        if let Some(album) = &filter.album_slug {
            qb.push(" AND ph.album_id = (SELECT id FROM albums WHERE is_public = true AND slug = ")
                .push_bind(album.clone())
                .push(")");
        }
        if let Some(series) = &filter.series_slug {
            qb.push(" AND ph.series_id = (SELECT id FROM series WHERE is_public = true AND slug = ")
                .push_bind(series.clone())
                .push(")");
        }
        if filter.featured_only {
            qb.push(" AND ph.is_featured = true");
        }

        push_keyset(&mut qb, cursor);
        push_page(&mut qb, limit);

        qb.build_query_as::<Photo>()
            .fetch_all(pool)
            .await
            .map_err(|e| map_db_error("List public photos", e))
    }

    /// All photos for the admin library. Fetches `limit + 1` rows.
    pub async fn list_admin(
        pool: &PgPool,
        visibility: Visibility,
        q: Option<&str>,
        cursor: Option<Cursor>,
        limit: i64,
    ) -> Result<Vec<Photo>, FolioError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(PHOTO_COLUMNS).push(" FROM photos ph WHERE true");

        match visibility {
            Visibility::All => {}
            Visibility::Public => {
                qb.push(" AND ph.is_public = true");
            }
            Visibility::Private => {
                qb.push(" AND ph.is_public = false");
            }
        }

        if let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = like_pattern(q);
            qb.push(" AND (ph.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR ph.original_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        push_keyset(&mut qb, cursor);
        push_page(&mut qb, limit);

        qb.build_query_as::<Photo>()
            .fetch_all(pool)
            .await
            .map_err(|e| map_db_error("List library photos", e))
    }

    /// Featured public photos for the home page
    pub async fn list_featured(pool: &PgPool, limit: i64) -> Result<Vec<Photo>, FolioError> {
        let sql = format!(
            "SELECT {} FROM photos ph WHERE ph.is_public = true AND ph.is_featured = true \
             ORDER BY ph.created_at DESC, ph.id DESC LIMIT $1",
            PHOTO_COLUMNS
        );
        sqlx::query_as::<_, Photo>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await
            .map_err(|e| map_db_error("List featured photos", e))
    }

    /// Partial update; `Some(None)` clears nullable columns
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdatePhotoRequest,
    ) -> Result<Photo, FolioError> {
        sqlx::query_as::<_, Photo>(
            r#"
            UPDATE photos
            SET title = COALESCE($1, title),
                description = CASE WHEN $2 THEN $3 ELSE description END,
                is_featured = COALESCE($4, is_featured),
                album_id = CASE WHEN $5 THEN $6 ELSE album_id END,
                series_id = CASE WHEN $7 THEN $8 ELSE series_id END,
                series_position = CASE WHEN $7 THEN NULL ELSE series_position END,
                taken_at = CASE WHEN $9 THEN $10 ELSE taken_at END,
                updated_at = NOW()
            WHERE id = $11
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(req.description.is_some())
        .bind(req.description.clone().flatten())
        .bind(req.is_featured)
        .bind(req.album_id.is_some())
        .bind(req.album_id.flatten())
        .bind(req.series_id.is_some())
        .bind(req.series_id.flatten())
        .bind(req.taken_at.is_some())
        .bind(req.taken_at.flatten())
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_db_error("Update photo", e))?
        .ok_or_else(|| FolioError::NotFound(format!("photo {}", id)))
    }

    pub async fn set_visibility(pool: &PgPool, id: Uuid, is_public: bool) -> Result<Photo, FolioError> {
        sqlx::query_as::<_, Photo>(
            "UPDATE photos SET is_public = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(is_public)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_db_error("Update photo visibility", e))?
        .ok_or_else(|| FolioError::NotFound(format!("photo {}", id)))
    }

    /// Hard delete; returns the removed row so its files can be cleaned up
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Photo, FolioError> {
        let photo = sqlx::query_as::<_, Photo>("DELETE FROM photos WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error("Delete photo", e))?
            .ok_or_else(|| FolioError::NotFound(format!("photo {}", id)))?;

        log::info!("Deleted photo: {}", id);
        Ok(photo)
    }

    pub async fn set_featured(pool: &PgPool, ids: &[Uuid], featured: bool) -> Result<u64, FolioError> {
        sqlx::query("UPDATE photos SET is_featured = $1, updated_at = NOW() WHERE id = ANY($2)")
            .bind(featured)
            .bind(ids)
            .execute(pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| map_db_error("Bulk feature photos", e))
    }

    pub async fn set_album(pool: &PgPool, ids: &[Uuid], album_id: Option<Uuid>) -> Result<u64, FolioError> {
        sqlx::query("UPDATE photos SET album_id = $1, updated_at = NOW() WHERE id = ANY($2)")
            .bind(album_id)
            .bind(ids)
            .execute(pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| map_db_error("Bulk set album", e))
    }

    pub async fn get_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Photo>, FolioError> {
        let sql = format!("SELECT {} FROM photos ph WHERE ph.id = ANY($1)", PHOTO_COLUMNS);
        sqlx::query_as::<_, Photo>(&sql)
            .bind(ids)
            .fetch_all(pool)
            .await
            .map_err(|e| map_db_error("Fetch photos", e))
    }

    /// Tags for a batch of photos, keyed by photo id
    pub async fn tags_for(
        pool: &PgPool,
        photo_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TagRef>>, FolioError> {
        if photo_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, PhotoTagRow>(
            r#"
            SELECT pt.photo_id, t.id, t.name, t.slug
            FROM photo_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.photo_id = ANY($1)
            ORDER BY t.name ASC
            "#,
        )
        .bind(photo_ids)
        .fetch_all(pool)
        .await
        .map_err(|e| map_db_error("Fetch photo tags", e))?;

        let mut by_photo: HashMap<Uuid, Vec<TagRef>> = HashMap::new();
        for row in rows {
            by_photo.entry(row.photo_id).or_default().push(TagRef {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }
        Ok(by_photo)
    }

    pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<(), FolioError> {
        sqlx::query("UPDATE photos SET view_count = view_count + 1 WHERE id = $1 AND is_public = true")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| map_db_error("Increment photo views", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("dusk"), "%dusk%");
        assert_eq!(like_pattern("100%_sure"), "%100\\%\\_sure%");
    }

    #[test]
    fn test_public_query_shape() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM photos ph WHERE ph.is_public = true");
        push_keyset(&mut qb, Some(Cursor::new(chrono::Utc::now(), Uuid::new_v4())));
        push_page(&mut qb, 24);
        let sql = qb.sql();
        assert!(sql.contains("(ph.created_at, ph.id) < ($1, $2)"));
        assert!(sql.ends_with("ORDER BY ph.created_at DESC, ph.id DESC LIMIT $3"));
    }

    #[tokio::test]
    async fn test_insert_with_taken_checksum_returns_none() {
        let Some(pool) = test_db::pool().await else {
            return;
        };
        let existing = test_db::insert_photo(&pool).await;

        let id = Uuid::new_v4();
        let twin = NewPhoto {
            id,
            title: "twin".to_string(),
            file_name: format!("{}.jpg", id),
            original_name: "twin.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            checksum: existing.checksum.clone(),
            size_bytes: 1024,
            width: 300,
            height: 200,
            is_public: false,
            album_id: None,
        };
        assert!(PhotoRepository::insert(&pool, &twin).await.unwrap().is_none());

        let found = PhotoRepository::get_by_checksum(&pool, &existing.checksum)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, existing.id);

        test_db::delete_photos(&pool, &[existing.id]).await;
    }
}
