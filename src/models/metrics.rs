// src/models/metrics.rs
// DOCUMENTATION: Daily page-view counters

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MAX_TRACKED_PATH_LEN: usize = 512;
pub const DEFAULT_METRICS_DAYS: i64 = 30;
pub const MAX_METRICS_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub path: String,
    pub photo_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MetricsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct DailyViews {
    pub day: NaiveDate,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PathViews {
    pub path: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PhotoViews {
    pub photo_id: Uuid,
    pub title: String,
    pub views: i64,
}

#[derive(Debug, Serialize)]
pub struct MetricsSummary {
    pub days: i64,
    pub total_views: i64,
    pub daily: Vec<DailyViews>,
    pub top_paths: Vec<PathViews>,
    pub top_photos: Vec<PhotoViews>,
}

/// Clamp the requested window to 1..=MAX_METRICS_DAYS
pub fn clamp_days(days: Option<i64>) -> i64 {
    days.unwrap_or(DEFAULT_METRICS_DAYS).clamp(1, MAX_METRICS_DAYS)
}

/// Strip query string and fragment, require a leading slash, drop a trailing one.
pub fn normalize_path(raw: &str) -> Option<String> {
    let path = raw.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();

    if !path.starts_with('/') || path.len() > MAX_TRACKED_PATH_LEN {
        return None;
    }
    if path.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return None;
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        Some("/".to_string())
    } else {
        Some(trimmed.to_string())
    }
}

/// One entry per day from `start` to `end` inclusive, zero where nothing was recorded
pub fn zero_fill(rows: &[DailyViews], start: NaiveDate, end: NaiveDate) -> Vec<DailyViews> {
    let mut filled = Vec::new();
    let mut day = start;
    while day <= end {
        let views = rows
            .iter()
            .find(|row| row.day == day)
            .map(|row| row.views)
            .unwrap_or(0);
        filled.push(DailyViews { day, views });
        day += Duration::days(1);
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/albums/iceland?ref=x"), Some("/albums/iceland".into()));
        assert_eq!(normalize_path("/photos/#top"), Some("/photos".into()));
        assert_eq!(normalize_path("/"), Some("/".into()));
        assert_eq!(normalize_path("  /tags/sea  "), Some("/tags/sea".into()));
        assert_eq!(normalize_path("albums"), None);
        assert_eq!(normalize_path("/with space"), None);
        assert_eq!(normalize_path(&format!("/{}", "a".repeat(600))), None);
    }

    #[test]
    fn test_clamp_days() {
        assert_eq!(clamp_days(None), 30);
        assert_eq!(clamp_days(Some(0)), 1);
        assert_eq!(clamp_days(Some(10_000)), 365);
    }

    #[test]
    fn test_zero_fill() {
        let rows = vec![
            DailyViews { day: date(2024, 2, 28), views: 4 },
            DailyViews { day: date(2024, 3, 1), views: 9 },
        ];
        let filled = zero_fill(&rows, date(2024, 2, 27), date(2024, 3, 1));
        let views: Vec<i64> = filled.iter().map(|d| d.views).collect();
        assert_eq!(views, vec![0, 4, 0, 9]);
        assert_eq!(filled[2].day, date(2024, 2, 29));
    }
}
