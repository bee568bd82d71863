// src/db/site_repository.rs
// DOCUMENTATION: Key/value site copy, including the stored theme

use sqlx::PgPool;

use crate::errors::{map_db_error, FolioError};
use crate::models::SiteCopyEntry;

pub struct SiteRepository;

impl SiteRepository {
    pub async fn all(pool: &PgPool) -> Result<Vec<SiteCopyEntry>, FolioError> {
        sqlx::query_as::<_, SiteCopyEntry>("SELECT key, value, updated_at FROM site_copy ORDER BY key")
            .fetch_all(pool)
            .await
            .map_err(|e| map_db_error("List site copy", e))
    }

    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<SiteCopyEntry>, FolioError> {
        sqlx::query_as::<_, SiteCopyEntry>("SELECT key, value, updated_at FROM site_copy WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error("Fetch site copy", e))
    }

    pub async fn upsert(pool: &PgPool, key: &str, value: &str) -> Result<SiteCopyEntry, FolioError> {
        sqlx::query_as::<_, SiteCopyEntry>(
            r#"
            INSERT INTO site_copy (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(pool)
        .await
        .map_err(|e| map_db_error("Save site copy", e))
    }
}
