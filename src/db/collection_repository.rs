// src/db/collection_repository.rs
// DOCUMENTATION: Album and series database operations
// PURPOSE: One repository for both tables, selected by CollectionKind

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{map_db_error, FolioError};
use crate::models::{
    Collection, CollectionKind, CollectionSummaryRow, CreateCollectionRequest, Photo,
    UpdateCollectionRequest,
};

/// Summary select; `public_only` restricts counts and covers to public photos
fn summary_sql(kind: CollectionKind, public_only: bool, filter: &str) -> String {
    let photo_filter = if public_only { " AND ph.is_public = true" } else { "" };
    let cover_filter = if public_only { " AND cv.is_public = true" } else { "" };
    let visibility = if public_only { " AND c.is_public = true" } else { "" };

    format!(
        r#"
        SELECT c.id, c.slug, c.title, c.description, c.cover_photo_id, c.is_public,
               c.sort_order, c.created_at, c.updated_at,
               (SELECT COUNT(*) FROM photos ph WHERE ph.{column} = c.id{photo_filter}) AS photo_count,
               cv.file_name AS cover_file_name,
               cv.is_public AS cover_is_public
        FROM {table} c
        LEFT JOIN photos cv ON cv.id = c.cover_photo_id{cover_filter}
        WHERE {filter}{visibility}
        "#,
        column = kind.photo_column(),
        table = kind.table(),
        photo_filter = photo_filter,
        cover_filter = cover_filter,
        filter = filter,
        visibility = visibility,
    )
}

/// Appends to a series. Only ids of existing non-member photos are numbered,
/// continuing after the current last position.
const APPEND_SERIES_SQL: &str = r#"
    UPDATE photos ph
    SET series_id = $1,
        series_position = (base.max_pos + ranked.pos)::int,
        updated_at = NOW()
    FROM (
        SELECT p.id, ROW_NUMBER() OVER (ORDER BY ids.ord) AS pos
        FROM UNNEST($2::uuid[]) WITH ORDINALITY AS ids(id, ord)
        JOIN photos p ON p.id = ids.id
        WHERE p.series_id IS DISTINCT FROM $1
    ) AS ranked,
    (SELECT COALESCE(MAX(series_position), -1)::bigint AS max_pos
     FROM photos WHERE series_id = $1) AS base
    WHERE ph.id = ranked.id
"#;

/// Sets the full series membership; existing photos get positions 0..n in request order
const SET_SERIES_SQL: &str = r#"
    UPDATE photos ph
    SET series_id = $1, series_position = ranked.pos::int, updated_at = NOW()
    FROM (
        SELECT p.id, ROW_NUMBER() OVER (ORDER BY ids.ord) - 1 AS pos
        FROM UNNEST($2::uuid[]) WITH ORDINALITY AS ids(id, ord)
        JOIN photos p ON p.id = ids.id
    ) AS ranked
    WHERE ph.id = ranked.id
"#;

pub struct CollectionRepository;

impl CollectionRepository {
    pub async fn list(
        pool: &PgPool,
        kind: CollectionKind,
        public_only: bool,
        limit: Option<i64>,
    ) -> Result<Vec<CollectionSummaryRow>, FolioError> {
        let mut sql = summary_sql(kind, public_only, "true");
        sql.push_str(" ORDER BY c.sort_order ASC, c.created_at DESC");
        if limit.is_some() {
            sql.push_str(" LIMIT $1");
        }

        let mut query = sqlx::query_as::<_, CollectionSummaryRow>(&sql);
        if let Some(limit) = limit {
            query = query.bind(limit);
        }

        query
            .fetch_all(pool)
            .await
            .map_err(|e| map_db_error(&format!("List {}", kind.table()), e))
    }

    /// Most recently created public collections
    pub async fn recent_public(
        pool: &PgPool,
        kind: CollectionKind,
        limit: i64,
    ) -> Result<Vec<CollectionSummaryRow>, FolioError> {
        let mut sql = summary_sql(kind, true, "true");
        sql.push_str(" ORDER BY c.created_at DESC LIMIT $1");

        sqlx::query_as::<_, CollectionSummaryRow>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await
            .map_err(|e| map_db_error(&format!("List recent {}", kind.table()), e))
    }

    pub async fn get_by_slug(
        pool: &PgPool,
        kind: CollectionKind,
        slug: &str,
        public_only: bool,
    ) -> Result<CollectionSummaryRow, FolioError> {
        let sql = summary_sql(kind, public_only, "c.slug = $1");
        sqlx::query_as::<_, CollectionSummaryRow>(&sql)
            .bind(slug)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error(&format!("Fetch {}", kind.label()), e))?
            .ok_or_else(|| FolioError::NotFound(format!("{} '{}'", kind.label(), slug)))
    }

    pub async fn get_by_id(
        pool: &PgPool,
        kind: CollectionKind,
        id: Uuid,
    ) -> Result<CollectionSummaryRow, FolioError> {
        let sql = summary_sql(kind, false, "c.id = $1");
        sqlx::query_as::<_, CollectionSummaryRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error(&format!("Fetch {}", kind.label()), e))?
            .ok_or_else(|| FolioError::NotFound(format!("{} {}", kind.label(), id)))
    }

    pub async fn create(
        pool: &PgPool,
        kind: CollectionKind,
        slug: &str,
        req: &CreateCollectionRequest,
    ) -> Result<Collection, FolioError> {
        let sql = format!(
            "INSERT INTO {} (id, slug, title, description, is_public, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
            kind.table()
        );

        let collection = sqlx::query_as::<_, Collection>(&sql)
            .bind(Uuid::new_v4())
            .bind(slug)
            .bind(&req.title)
            .bind(&req.description)
            .bind(req.is_public.unwrap_or(true))
            .bind(req.sort_order.unwrap_or(0))
            .fetch_one(pool)
            .await
            .map_err(|e| map_db_error(&format!("{} slug '{}'", kind.label(), slug), e))?;

        log::info!("Created {} {} ({})", kind.label(), collection.title, collection.slug);
        Ok(collection)
    }

    pub async fn update(
        pool: &PgPool,
        kind: CollectionKind,
        id: Uuid,
        slug: Option<&str>,
        req: &UpdateCollectionRequest,
    ) -> Result<Collection, FolioError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET title = COALESCE($1, title),
                slug = COALESCE($2, slug),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                is_public = COALESCE($5, is_public),
                sort_order = COALESCE($6, sort_order),
                cover_photo_id = CASE WHEN $7 THEN $8 ELSE cover_photo_id END,
                updated_at = NOW()
            WHERE id = $9
            RETURNING *
            "#,
            kind.table()
        );

        sqlx::query_as::<_, Collection>(&sql)
            .bind(&req.title)
            .bind(slug)
            .bind(req.description.is_some())
            .bind(req.description.clone().flatten())
            .bind(req.is_public)
            .bind(req.sort_order)
            .bind(req.cover_photo_id.is_some())
            .bind(req.cover_photo_id.flatten())
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error(&format!("Update {}", kind.label()), e))?
            .ok_or_else(|| FolioError::NotFound(format!("{} {}", kind.label(), id)))
    }

    /// Delete a collection; member photos are detached by the foreign key
    pub async fn delete(pool: &PgPool, kind: CollectionKind, id: Uuid) -> Result<(), FolioError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let rows = sqlx::query(&sql)
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| map_db_error(&format!("Delete {}", kind.label()), e))?
            .rows_affected();

        if rows == 0 {
            return Err(FolioError::NotFound(format!("{} {}", kind.label(), id)));
        }
        log::info!("Deleted {}: {}", kind.label(), id);
        Ok(())
    }

    /// Member photos in display order
    pub async fn photos(
        pool: &PgPool,
        kind: CollectionKind,
        id: Uuid,
        public_only: bool,
    ) -> Result<Vec<Photo>, FolioError> {
        let sql = format!(
            "SELECT ph.* FROM photos ph WHERE ph.{} = $1{} ORDER BY {}",
            kind.photo_column(),
            if public_only { " AND ph.is_public = true" } else { "" },
            kind.photo_order()
        );

        sqlx::query_as::<_, Photo>(&sql)
            .bind(id)
            .fetch_all(pool)
            .await
            .map_err(|e| map_db_error(&format!("List {} photos", kind.label()), e))
    }

    /// Append photos; series positions continue after the current last one
    pub async fn add_photos(
        pool: &PgPool,
        kind: CollectionKind,
        id: Uuid,
        photo_ids: &[Uuid],
    ) -> Result<u64, FolioError> {
        let sql = if kind.is_ordered() {
            APPEND_SERIES_SQL.to_string()
        } else {
            format!(
                "UPDATE photos SET {} = $1, updated_at = NOW() WHERE id = ANY($2)",
                kind.photo_column()
            )
        };

        sqlx::query(&sql)
            .bind(id)
            .bind(photo_ids)
            .execute(pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| map_db_error(&format!("Add {} photos", kind.label()), e))
    }

    /// Make `photo_ids` the exact membership, in order
    pub async fn set_photos(
        pool: &PgPool,
        kind: CollectionKind,
        id: Uuid,
        photo_ids: &[Uuid],
    ) -> Result<u64, FolioError> {
        let column = kind.photo_column();
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| map_db_error("Begin transaction", e))?;

        let detach = if kind.is_ordered() {
            "UPDATE photos SET series_id = NULL, series_position = NULL, updated_at = NOW() \
             WHERE series_id = $1 AND NOT (id = ANY($2))"
                .to_string()
        } else {
            format!(
                "UPDATE photos SET {col} = NULL, updated_at = NOW() WHERE {col} = $1 AND NOT (id = ANY($2))",
                col = column
            )
        };
        sqlx::query(&detach)
            .bind(id)
            .bind(photo_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error(&format!("Detach {} photos", kind.label()), e))?;

        let attach = if kind.is_ordered() {
            SET_SERIES_SQL.to_string()
        } else {
            format!(
                "UPDATE photos SET {} = $1, updated_at = NOW() WHERE id = ANY($2)",
                column
            )
        };
        let attached = sqlx::query(&attach)
            .bind(id)
            .bind(photo_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_error(&format!("Attach {} photos", kind.label()), e))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| map_db_error(&format!("Commit {} photos", kind.label()), e))?;
        Ok(attached)
    }
}
