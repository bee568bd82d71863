// src/db/tag_repository.rs
// DOCUMENTATION: Tag database operations
// PURPOSE: Tag CRUD, photo tagging and tag merging

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::{map_db_error, FolioError};
use crate::models::{Tag, TagWithCount};
use crate::services::slug::slugify_non_empty;

pub struct TagRepository;

impl TagRepository {
    /// Tags that have at least one public photo, with public counts
    pub async fn list_public(pool: &PgPool) -> Result<Vec<TagWithCount>, FolioError> {
        sqlx::query_as::<_, TagWithCount>(
            r#"
            SELECT t.id, t.name, t.slug, COUNT(ph.id) AS photo_count
            FROM tags t
            JOIN photo_tags pt ON pt.tag_id = t.id
            JOIN photos ph ON ph.id = pt.photo_id AND ph.is_public = true
            GROUP BY t.id
            ORDER BY photo_count DESC, t.name ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| map_db_error("List public tags", e))
    }

    /// Every tag with counts over all photos
    pub async fn list_all(pool: &PgPool) -> Result<Vec<TagWithCount>, FolioError> {
        sqlx::query_as::<_, TagWithCount>(
            r#"
            SELECT t.id, t.name, t.slug, COUNT(pt.photo_id) AS photo_count
            FROM tags t
            LEFT JOIN photo_tags pt ON pt.tag_id = t.id
            GROUP BY t.id
            ORDER BY t.name ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| map_db_error("List tags", e))
    }

    /// Tag by slug with its count of public photos
    pub async fn get_public_by_slug(pool: &PgPool, slug: &str) -> Result<TagWithCount, FolioError> {
        sqlx::query_as::<_, TagWithCount>(
            r#"
            SELECT t.id, t.name, t.slug,
                   (SELECT COUNT(*) FROM photo_tags pt
                    JOIN photos ph ON ph.id = pt.photo_id
                    WHERE pt.tag_id = t.id AND ph.is_public = true) AS photo_count
            FROM tags t
            WHERE t.slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_db_error("Fetch tag", e))?
        .ok_or_else(|| FolioError::NotFound(format!("tag '{}'", slug)))
    }

    pub async fn get_with_count(conn: &mut PgConnection, id: Uuid) -> Result<TagWithCount, FolioError> {
        sqlx::query_as::<_, TagWithCount>(
            r#"
            SELECT t.id, t.name, t.slug,
                   (SELECT COUNT(*) FROM photo_tags pt WHERE pt.tag_id = t.id) AS photo_count
            FROM tags t
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| map_db_error("Fetch tag", e))?
        .ok_or_else(|| FolioError::NotFound(format!("tag {}", id)))
    }

    pub async fn create(pool: &PgPool, name: &str) -> Result<Tag, FolioError> {
        let slug = slugify_non_empty(name)
            .ok_or_else(|| FolioError::ValidationError("Tag name has no usable characters".into()))?;

        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (id, name, slug) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(&slug)
        .fetch_one(pool)
        .await
        .map_err(|e| map_db_error(&format!("tag '{}'", name), e))?;

        log::info!("Created tag {} ({})", tag.name, tag.slug);
        Ok(tag)
    }

    pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Tag, FolioError> {
        let slug = slugify_non_empty(name)
            .ok_or_else(|| FolioError::ValidationError("Tag name has no usable characters".into()))?;

        sqlx::query_as::<_, Tag>("UPDATE tags SET name = $1, slug = $2 WHERE id = $3 RETURNING *")
            .bind(name)
            .bind(&slug)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error(&format!("tag '{}'", name), e))?
            .ok_or_else(|| FolioError::NotFound(format!("tag {}", id)))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), FolioError> {
        let rows = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| map_db_error("Delete tag", e))?
            .rows_affected();

        if rows == 0 {
            return Err(FolioError::NotFound(format!("tag {}", id)));
        }
        log::info!("Deleted tag: {}", id);
        Ok(())
    }

    /// Find or create tags by name and return their ids
    pub async fn ensure_tags(conn: &mut PgConnection, names: &[String]) -> Result<Vec<Uuid>, FolioError> {
        let mut slugs = Vec::with_capacity(names.len());

        for name in names {
            let Some(slug) = slugify_non_empty(name) else {
                log::debug!("Skipping tag without usable characters: {:?}", name);
                continue;
            };

            sqlx::query("INSERT INTO tags (id, name, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING")
                .bind(Uuid::new_v4())
                .bind(name)
                .bind(&slug)
                .execute(&mut *conn)
                .await
                .map_err(|e| map_db_error("Create tag", e))?;
            slugs.push(slug);
        }

        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = ANY($1)")
            .bind(&slugs)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| map_db_error("Resolve tags", e))?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Replace a photo's tag set
    pub async fn replace_photo_tags(pool: &PgPool, photo_id: Uuid, names: &[String]) -> Result<(), FolioError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| map_db_error("Begin transaction", e))?;

        let tag_ids = Self::ensure_tags(&mut tx, names).await?;

        sqlx::query("DELETE FROM photo_tags WHERE photo_id = $1")
            .bind(photo_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("Clear photo tags", e))?;

        sqlx::query(
            "INSERT INTO photo_tags (photo_id, tag_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
        )
        .bind(photo_id)
        .bind(&tag_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("Set photo tags", e))?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Commit photo tags", e))?;
        Ok(())
    }

    /// Add tags to many photos at once; returns the number of new links
    pub async fn add_to_photos(pool: &PgPool, photo_ids: &[Uuid], names: &[String]) -> Result<u64, FolioError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| map_db_error("Begin transaction", e))?;

        let tag_ids = Self::ensure_tags(&mut tx, names).await?;

        let added = sqlx::query(
            r#"
            INSERT INTO photo_tags (photo_id, tag_id)
            SELECT ph.id, t.id
            FROM photos ph CROSS JOIN UNNEST($2::uuid[]) AS t(id)
            WHERE ph.id = ANY($1)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(photo_ids)
        .bind(&tag_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("Tag photos", e))?
        .rows_affected();

        tx.commit()
            .await
            .map_err(|e| map_db_error("Commit photo tags", e))?;
        Ok(added)
    }

    /// Fold `source_ids` into `target_id` in one transaction.
    /// Returns (target, links moved, tags removed).
    pub async fn merge(
        pool: &PgPool,
        source_ids: &[Uuid],
        target_id: Uuid,
    ) -> Result<(TagWithCount, u64, u64), FolioError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| map_db_error("Begin transaction", e))?;

        // Fails with NotFound before anything is touched
        Self::get_with_count(&mut tx, target_id).await?;

        let found: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
            .bind(source_ids)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_db_error("Check merge sources", e))?;
        if found.0 as usize != source_ids.len() {
            return Err(FolioError::NotFound("one or more source tags".to_string()));
        }

        let moved = sqlx::query(
            r#"
            INSERT INTO photo_tags (photo_id, tag_id)
            SELECT DISTINCT photo_id, $1 FROM photo_tags WHERE tag_id = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(target_id)
        .bind(source_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("Move tag links", e))?
        .rows_affected();

        // photo_tags rows of the sources go with the cascade
        let removed = sqlx::query("DELETE FROM tags WHERE id = ANY($1)")
            .bind(source_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error("Delete merged tags", e))?
            .rows_affected();

        let target = Self::get_with_count(&mut tx, target_id).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Commit tag merge", e))?;

        log::info!(
            "Merged {} tags into {} ({} links moved)",
            removed,
            target.name,
            moved
        );
        Ok((target, moved, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    async fn tag_id(pool: &PgPool, name: &str) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM tags WHERE name = $1")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_merge_skips_existing_links_and_removes_sources() {
        let Some(pool) = test_db::pool().await else {
            return;
        };
        let film = test_db::unique("film");
        let analog = test_db::unique("analog");
        let target = test_db::unique("analogue");

        let p1 = test_db::insert_photo(&pool).await.id;
        let p2 = test_db::insert_photo(&pool).await.id;
        TagRepository::replace_photo_tags(&pool, p1, &[film.clone(), analog.clone(), target.clone()])
            .await
            .unwrap();
        TagRepository::replace_photo_tags(&pool, p2, &[film.clone()])
            .await
            .unwrap();

        let film_id = tag_id(&pool, &film).await;
        let analog_id = tag_id(&pool, &analog).await;
        let target_id = tag_id(&pool, &target).await;

        let (merged, moved, removed) =
            TagRepository::merge(&pool, &[film_id, analog_id], target_id)
                .await
                .unwrap();

        // p1 already carried the target, so only p2 gains a link
        assert_eq!(moved, 1);
        assert_eq!(removed, 2);
        assert_eq!(merged.id, target_id);
        assert_eq!(merged.photo_count, 2);

        let (left,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
            .bind(&[film_id, analog_id][..])
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(left, 0);

        let (links,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM photo_tags WHERE photo_id = ANY($1)")
                .bind(&[p1, p2][..])
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(links, 2);

        test_db::delete_photos(&pool, &[p1, p2]).await;
        TagRepository::delete(&pool, target_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_merge_with_unknown_source_changes_nothing() {
        let Some(pool) = test_db::pool().await else {
            return;
        };
        let name = test_db::unique("street");
        let target = TagRepository::create(&pool, &name).await.unwrap();

        let result = TagRepository::merge(&pool, &[Uuid::new_v4()], target.id).await;
        assert!(matches!(result, Err(FolioError::NotFound(_))));

        TagRepository::delete(&pool, target.id).await.unwrap();
    }
}
