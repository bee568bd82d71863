// src/db/metrics_repository.rs
// DOCUMENTATION: Daily view counters

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{map_db_error, FolioError};
use crate::models::{DailyViews, PathViews, PhotoViews};

pub struct MetricsRepository;

impl MetricsRepository {
    /// Count one view of `path` on `day`
    pub async fn record_view(
        pool: &PgPool,
        day: NaiveDate,
        path: &str,
        photo_id: Option<Uuid>,
    ) -> Result<(), FolioError> {
        sqlx::query(
            r#"
            INSERT INTO metrics_daily (day, path, photo_id, views)
            VALUES ($1, $2, (SELECT id FROM photos WHERE id = $3), 1)
            ON CONFLICT (day, path) DO UPDATE
            SET views = metrics_daily.views + 1,
                photo_id = COALESCE(EXCLUDED.photo_id, metrics_daily.photo_id)
            "#,
        )
        .bind(day)
        .bind(path)
        .bind(photo_id)
        .execute(pool)
        .await
        .map_err(|e| map_db_error("Record view", e))?;
        Ok(())
    }

    pub async fn daily_totals(pool: &PgPool, since: NaiveDate) -> Result<Vec<DailyViews>, FolioError> {
        sqlx::query_as::<_, DailyViews>(
            r#"
            SELECT day, SUM(views)::bigint AS views
            FROM metrics_daily
            WHERE day >= $1
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(since)
        .fetch_all(pool)
        .await
        .map_err(|e| map_db_error("Daily totals", e))
    }

    pub async fn top_paths(pool: &PgPool, since: NaiveDate, limit: i64) -> Result<Vec<PathViews>, FolioError> {
        sqlx::query_as::<_, PathViews>(
            r#"
            SELECT path, SUM(views)::bigint AS views
            FROM metrics_daily
            WHERE day >= $1
            GROUP BY path
            ORDER BY views DESC, path ASC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| map_db_error("Top paths", e))
    }

    pub async fn top_photos(pool: &PgPool, since: NaiveDate, limit: i64) -> Result<Vec<PhotoViews>, FolioError> {
        sqlx::query_as::<_, PhotoViews>(
            r#"
            SELECT m.photo_id AS photo_id, ph.title, SUM(m.views)::bigint AS views
            FROM metrics_daily m
            JOIN photos ph ON ph.id = m.photo_id
            WHERE m.day >= $1
            GROUP BY m.photo_id, ph.title
            ORDER BY views DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| map_db_error("Top photos", e))
    }
}
