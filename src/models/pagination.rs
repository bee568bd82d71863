// src/models/pagination.rs
// DOCUMENTATION: Keyset pagination over (created_at, id)
// PURPOSE: Opaque cursors shared by every photo listing

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::FolioError;

pub const DEFAULT_PAGE_SIZE: i64 = 24;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Position of the last row a client has seen
/// Rows are ordered by `created_at DESC, id DESC`; the next page holds rows
/// strictly after this position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.created_at.timestamp_micros(), self.id);
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    pub fn decode(value: &str) -> Result<Self, FolioError> {
        let invalid = || FolioError::InvalidInput("Malformed cursor".to_string());

        let bytes = URL_SAFE_NO_PAD.decode(value.trim()).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (micros, id) = raw.split_once(':').ok_or_else(invalid)?;

        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let created_at = Utc
            .timestamp_micros(micros)
            .single()
            .ok_or_else(invalid)?;
        let id = Uuid::parse_str(id).map_err(|_| invalid())?;

        Ok(Self { created_at, id })
    }
}

/// Clamp a requested page size into 1..=MAX_PAGE_SIZE
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Decode an optional cursor query parameter; empty strings mean "first page"
pub fn parse_cursor(value: Option<&str>) -> Result<Option<Cursor>, FolioError> {
    match value {
        Some(raw) if !raw.trim().is_empty() => Cursor::decode(raw).map(Some),
        _ => Ok(None),
    }
}

/// One page of results
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Split a `limit + 1` fetch into a page and the cursor for the next one
pub fn into_page<R, T>(
    mut rows: Vec<R>,
    limit: i64,
    position: impl Fn(&R) -> Cursor,
    convert: impl FnMut(R) -> T,
) -> Page<T> {
    let limit = limit.max(0) as usize;
    let has_more = rows.len() > limit;
    rows.truncate(limit);

    let next_cursor = if has_more {
        rows.last().map(|row| position(row).encode())
    } else {
        None
    };

    Page {
        data: rows.into_iter().map(convert).collect(),
        next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cursor_round_trip_keeps_microseconds() {
        let created_at = Utc.timestamp_micros(1_700_000_000_123_456).unwrap();
        let cursor = Cursor::new(created_at, Uuid::new_v4());

        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn test_cursor_is_url_safe() {
        let cursor = Cursor::new(Utc::now(), Uuid::new_v4());
        let encoded = cursor.encode();
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_malformed_cursors_are_rejected() {
        let bad_uuid = URL_SAFE_NO_PAD.encode("12:not-a-uuid");
        for raw in ["!!!", "bm90LWEtY3Vyc29y", bad_uuid.as_str()] {
            let err = Cursor::decode(raw).unwrap_err();
            assert!(matches!(err, FolioError::InvalidInput(_)), "{raw}");
        }
    }

    #[test]
    fn test_parse_cursor_treats_blank_as_first_page() {
        assert!(parse_cursor(None).unwrap().is_none());
        assert!(parse_cursor(Some("  ")).unwrap().is_none());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(30)), 30);
    }

    #[test]
    fn test_into_page_sets_cursor_only_when_more_rows_exist() {
        let base = Utc::now();
        let rows: Vec<(DateTime<Utc>, Uuid)> = (0..4)
            .map(|i| (base - Duration::seconds(i), Uuid::new_v4()))
            .collect();

        let page = into_page(rows.clone(), 3, |r| Cursor::new(r.0, r.1), |r| r.1);
        assert_eq!(page.data.len(), 3);
        let next = Cursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(next.id, rows[2].1);

        let last = into_page(rows[..3].to_vec(), 3, |r| Cursor::new(r.0, r.1), |r| r.1);
        assert_eq!(last.data.len(), 3);
        assert!(last.next_cursor.is_none());
    }
}
