// src/services/metrics_service.rs
// DOCUMENTATION: View tracking and the admin analytics summary

use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;

use crate::db::{MetricsRepository, PhotoRepository};
use crate::errors::FolioError;
use crate::models::{clamp_days, normalize_path, zero_fill, MetricsSummary, TrackRequest};

pub const TOP_ENTRIES: i64 = 10;

/// First day of a window of `days` days ending today
fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days - 1)
}

pub struct MetricsService;

impl MetricsService {
    pub async fn track(pool: &PgPool, req: &TrackRequest) -> Result<(), FolioError> {
        let path = normalize_path(&req.path)
            .ok_or_else(|| FolioError::InvalidInput("Invalid path".to_string()))?;
        let today = Utc::now().date_naive();

        MetricsRepository::record_view(pool, today, &path, req.photo_id).await?;
        if let Some(photo_id) = req.photo_id {
            PhotoRepository::increment_views(pool, photo_id).await?;
        }

        log::debug!("Tracked view of {}", path);
        Ok(())
    }

    pub async fn summary(pool: &PgPool, days: Option<i64>) -> Result<MetricsSummary, FolioError> {
        let days = clamp_days(days);
        let today = Utc::now().date_naive();
        let since = window_start(today, days);

        let recorded = MetricsRepository::daily_totals(pool, since).await?;
        let daily = zero_fill(&recorded, since, today);
        let total_views = daily.iter().map(|d| d.views).sum();

        let top_paths = MetricsRepository::top_paths(pool, since, TOP_ENTRIES).await?;
        let top_photos = MetricsRepository::top_photos(pool, since, TOP_ENTRIES).await?;

        Ok(MetricsSummary {
            days,
            total_views,
            daily,
            top_paths,
            top_photos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_includes_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(window_start(today, 1), today);
        assert_eq!(
            window_start(today, 30),
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
        );
    }
}
