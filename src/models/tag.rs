// src/models/tag.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

pub const MAX_TAG_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Compact tag embedded in photo responses
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct TagRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Tag row joined with the photo it belongs to
#[derive(Debug, Clone, FromRow)]
pub struct PhotoTagRow {
    pub photo_id: Uuid,
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TagWithCount {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub photo_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TagNameRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// Request DTO for POST /api/admin/tags/merge
#[derive(Debug, Deserialize, Validate)]
pub struct MergeTagsRequest {
    #[validate(length(min = 1, max = 100))]
    pub source_ids: Vec<Uuid>,
    pub target_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MergeTagsResponse {
    pub target: TagWithCount,
    pub merged: u64,
    pub removed_tags: u64,
}

#[derive(Debug, Serialize)]
pub struct TagDetailResponse {
    pub tag: TagWithCount,
    pub photos: crate::models::Page<crate::models::PhotoResponse>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TagPhotosQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// Trim a tag name and collapse inner whitespace.
/// Returns None for names that are blank or too long.
pub fn normalize_tag_name(raw: &str) -> Option<String> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() || name.chars().count() > MAX_TAG_LEN {
        return None;
    }
    Some(name)
}

/// Normalize a list of tag names, dropping blanks and case-insensitive duplicates
pub fn normalize_tag_list<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.iter()
        .filter_map(|name| normalize_tag_name(name.as_ref()))
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}

/// Split a comma separated form value ("sea, night,  sea") into tag names
pub fn parse_tag_field(value: &str) -> Vec<String> {
    let parts: Vec<&str> = value.split(',').collect();
    normalize_tag_list(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag_name() {
        assert_eq!(normalize_tag_name("  Street   Photography "), Some("Street Photography".into()));
        assert_eq!(normalize_tag_name("   "), None);
        assert_eq!(normalize_tag_name(&"x".repeat(65)), None);
        assert_eq!(normalize_tag_name(&"x".repeat(64)), Some("x".repeat(64)));
    }

    #[test]
    fn test_normalize_tag_list_dedupes_case_insensitively() {
        let tags = normalize_tag_list(&["Sea", "sea ", "", "Night", "NIGHT"]);
        assert_eq!(tags, vec!["Sea".to_string(), "Night".to_string()]);
    }

    #[test]
    fn test_parse_tag_field() {
        assert_eq!(
            parse_tag_field("sea, night,,  sea , black and white"),
            vec!["sea".to_string(), "night".to_string(), "black and white".to_string()]
        );
        assert!(parse_tag_field("").is_empty());
    }
}
