// src/models/site.rs
// DOCUMENTATION: Editable site copy and theme settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use crate::models::{CollectionResponse, PhotoResponse};

/// site_copy key reserved for the serialized theme
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SiteCopyEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCopyRequest {
    #[validate(length(max = 20000))]
    pub value: String,
}

/// Copy keys are lowercase identifiers of at most 64 characters
pub fn is_valid_copy_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 64
        && key != THEME_KEY
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GalleryLayout {
    #[default]
    Masonry,
    Grid,
    Justified,
}

fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color"))
    }
}

/// Public theme settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Theme {
    #[validate(custom = "validate_hex_color")]
    pub accent_color: String,

    #[validate(custom = "validate_hex_color")]
    pub background_color: String,

    #[validate(custom = "validate_hex_color")]
    pub text_color: String,

    #[validate(length(min = 1, max = 120))]
    pub font_family: String,

    #[serde(default)]
    pub layout: GalleryLayout,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent_color: "#c8a165".to_string(),
            background_color: "#0f0f10".to_string(),
            text_color: "#f2f2f2".to_string(),
            font_family: "Inter, sans-serif".to_string(),
            layout: GalleryLayout::Masonry,
        }
    }
}

impl Theme {
    /// Parse a stored theme, falling back to the default on bad data
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(serde_json::from_str::<Theme>) {
            Some(Ok(theme)) if theme.validate().is_ok() => theme,
            Some(_) => {
                log::warn!("Stored theme is invalid, using default theme");
                Theme::default()
            }
            None => Theme::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub copy: BTreeMap<String, String>,
    pub theme: Theme,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub copy: BTreeMap<String, String>,
    pub theme: Theme,
    pub featured: Vec<PhotoResponse>,
    pub recent_albums: Vec<CollectionResponse>,
    pub series: Vec<CollectionResponse>,
}
