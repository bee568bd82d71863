// src/models/photo.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::TagRef;

/// Stored photograph
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Photo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Name of the original on disk (`<uuid>.<ext>`)
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    /// Hex SHA-256 of the original bytes, unique across the library
    pub checksum: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    pub is_public: bool,
    pub is_featured: bool,
    pub album_id: Option<Uuid>,
    pub series_id: Option<Uuid>,
    pub series_position: Option<i32>,
    pub taken_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a freshly uploaded photo
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub id: Uuid,
    pub title: String,
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub checksum: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    pub is_public: bool,
    pub album_id: Option<Uuid>,
}

/// Name of the thumbnail stored next to an original
pub fn thumbnail_name_for(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    format!("{}_thumb.jpg", stem)
}

/// Photo DTO for public API responses
#[derive(Debug, Clone, Serialize)]
pub struct PhotoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub thumbnail_url: String,
    pub width: i32,
    pub height: i32,
    pub aspect_ratio: f64,
    pub is_public: bool,
    pub is_featured: bool,
    pub album_id: Option<Uuid>,
    pub series_id: Option<Uuid>,
    pub series_position: Option<i32>,
    pub taken_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub tags: Vec<TagRef>,
    pub created_at: DateTime<Utc>,
}

/// Photo DTO for the admin library, with storage details
#[derive(Debug, Clone, Serialize)]
pub struct AdminPhotoResponse {
    #[serde(flatten)]
    pub photo: PhotoResponse,
    pub original_name: String,
    pub mime_type: String,
    pub checksum: String,
    pub size_bytes: i64,
    pub updated_at: DateTime<Utc>,
}

impl Photo {
    pub fn thumbnail_file_name(&self) -> String {
        thumbnail_name_for(&self.file_name)
    }

    /// Public photos are served from the media mount; private ones only
    /// through the admin file endpoint.
    pub fn urls(&self) -> (String, String) {
        if self.is_public {
            (
                format!("/media/{}", self.file_name),
                format!("/media/{}", self.thumbnail_file_name()),
            )
        } else {
            (
                format!("/api/admin/photos/{}/file", self.id),
                format!("/api/admin/photos/{}/file?variant=thumbnail", self.id),
            )
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height <= 0 {
            return 1.0;
        }
        let ratio = self.width as f64 / self.height as f64;
        (ratio * 10_000.0).round() / 10_000.0
    }

    /// Convert database photo into API response DTO
    pub fn to_response(&self, tags: Vec<TagRef>) -> PhotoResponse {
        let (url, thumbnail_url) = self.urls();
        PhotoResponse {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            url,
            thumbnail_url,
            width: self.width,
            height: self.height,
            aspect_ratio: self.aspect_ratio(),
            is_public: self.is_public,
            is_featured: self.is_featured,
            album_id: self.album_id,
            series_id: self.series_id,
            series_position: self.series_position,
            taken_at: self.taken_at,
            view_count: self.view_count,
            tags,
            created_at: self.created_at,
        }
    }

    pub fn to_admin_response(&self, tags: Vec<TagRef>) -> AdminPhotoResponse {
        AdminPhotoResponse {
            photo: self.to_response(tags),
            original_name: self.original_name.clone(),
            mime_type: self.mime_type.clone(),
            checksum: self.checksum.clone(),
            size_bytes: self.size_bytes,
            updated_at: self.updated_at,
        }
    }
}

/// Distinguishes an absent field from an explicit `null`
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query for GET /api/photos
#[derive(Debug, Deserialize, Default)]
pub struct PhotoListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    /// Tag slug
    pub tag: Option<String>,
    /// Album slug
    pub album: Option<String>,
    /// Series slug
    pub series: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    All,
    Public,
    Private,
}

/// Query for GET /api/admin/photos
#[derive(Debug, Deserialize, Default)]
pub struct AdminPhotoListQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Substring of the title or original file name
    pub q: Option<String>,
}

/// Request DTO for PATCH /api/admin/photos/{id}
/// Only provided fields are updated; `null` clears nullable fields
#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdatePhotoRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 5000))]
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub is_featured: Option<bool>,

    #[serde(default, deserialize_with = "double_option")]
    pub album_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "double_option")]
    pub series_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "double_option")]
    pub taken_at: Option<Option<DateTime<Utc>>>,

    /// Replaces the photo's tag set; unknown tags are created
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BulkAction {
    Publish,
    Unpublish,
    Feature,
    Unfeature,
    Delete,
    AddTags { tags: Vec<String> },
    SetAlbum { album_id: Option<Uuid> },
}

/// Request DTO for POST /api/admin/photos/bulk
#[derive(Debug, Deserialize, Validate)]
pub struct BulkPhotoRequest {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<Uuid>,

    #[serde(flatten)]
    pub action: BulkAction,
}

#[derive(Debug, Serialize)]
pub struct BulkPhotoResponse {
    pub affected: u64,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileQuery {
    pub variant: Option<String>,
}

/// Result for one uploaded file
#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub photo: AdminPhotoResponse,
    pub duplicate: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub results: Vec<UploadOutcome>,
}

#[cfg(test)]
pub(crate) fn sample_photo() -> Photo {
    let now = Utc::now();
    Photo {
        id: Uuid::new_v4(),
        title: "Harbour at dusk".to_string(),
        description: None,
        file_name: "0b6f.jpg".to_string(),
        original_name: "DSC_0042.JPG".to_string(),
        mime_type: "image/jpeg".to_string(),
        checksum: "ab".repeat(32),
        size_bytes: 1024,
        width: 3000,
        height: 2000,
        is_public: true,
        is_featured: false,
        album_id: None,
        series_id: None,
        series_position: None,
        taken_at: None,
        view_count: 0,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_name() {
        assert_eq!(thumbnail_name_for("abc.png"), "abc_thumb.jpg");
        assert_eq!(thumbnail_name_for("noext"), "noext_thumb.jpg");
    }

    #[test]
    fn test_urls_depend_on_visibility() {
        let mut photo = sample_photo();
        let (url, thumb) = photo.urls();
        assert_eq!(url, "/media/0b6f.jpg");
        assert_eq!(thumb, "/media/0b6f_thumb.jpg");

        photo.is_public = false;
        let (url, thumb) = photo.urls();
        assert_eq!(url, format!("/api/admin/photos/{}/file", photo.id));
        assert!(thumb.ends_with("?variant=thumbnail"));
    }

    #[test]
    fn test_aspect_ratio() {
        let mut photo = sample_photo();
        assert_eq!(photo.aspect_ratio(), 1.5);
        photo.height = 0;
        assert_eq!(photo.aspect_ratio(), 1.0);
    }

    #[test]
    fn test_update_request_distinguishes_null_from_missing() {
        let req: UpdatePhotoRequest = serde_json::from_str(r#"{"album_id": null}"#).unwrap();
        assert_eq!(req.album_id, Some(None));
        assert_eq!(req.series_id, None);

        let id = Uuid::new_v4();
        let req: UpdatePhotoRequest =
            serde_json::from_str(&format!(r#"{{"series_id": "{}"}}"#, id)).unwrap();
        assert_eq!(req.series_id, Some(Some(id)));
    }

    #[test]
    fn test_update_request_can_clear_description() {
        let req: UpdatePhotoRequest = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(req.description, Some(None));

        let req: UpdatePhotoRequest = serde_json::from_str(r#"{"title": "Dusk"}"#).unwrap();
        assert_eq!(req.description, None);

        let req: UpdatePhotoRequest =
            serde_json::from_str(r#"{"description": "Harbour at dusk"}"#).unwrap();
        assert_eq!(req.description, Some(Some("Harbour at dusk".to_string())));
    }

    #[test]
    fn test_bulk_request_parses_tagged_actions() {
        let id = Uuid::new_v4();
        let req: BulkPhotoRequest = serde_json::from_str(&format!(
            r#"{{"ids": ["{}"], "action": "add_tags", "tags": ["sea", "night"]}}"#,
            id
        ))
        .unwrap();
        assert_eq!(req.ids, vec![id]);
        assert_eq!(
            req.action,
            BulkAction::AddTags {
                tags: vec!["sea".to_string(), "night".to_string()]
            }
        );

        let req: BulkPhotoRequest =
            serde_json::from_str(r#"{"ids": [], "action": "publish"}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
