// src/services/site_service.rs
// DOCUMENTATION: Site copy, theme and the home page aggregate

use sqlx::PgPool;
use std::collections::BTreeMap;
use validator::Validate;

use crate::db::{CollectionRepository, PhotoRepository, SiteRepository};
use crate::errors::FolioError;
use crate::models::{
    is_valid_copy_key, CollectionKind, HomeResponse, SiteCopyEntry, SiteResponse, Theme,
    THEME_KEY,
};
use crate::services::PhotoService;

pub const HOME_FEATURED_LIMIT: i64 = 12;
pub const HOME_RECENT_ALBUMS: i64 = 6;

/// Split stored entries into the copy map and the theme
fn split_entries(entries: Vec<SiteCopyEntry>) -> SiteResponse {
    let mut copy = BTreeMap::new();
    let mut stored_theme = None;

    for entry in entries {
        if entry.key == THEME_KEY {
            stored_theme = Some(entry.value);
        } else {
            copy.insert(entry.key, entry.value);
        }
    }

    SiteResponse {
        copy,
        theme: Theme::from_stored(stored_theme.as_deref()),
    }
}

pub struct SiteService;

impl SiteService {
    pub async fn site(pool: &PgPool) -> Result<SiteResponse, FolioError> {
        let entries = SiteRepository::all(pool).await?;
        Ok(split_entries(entries))
    }

    pub async fn update_copy(
        pool: &PgPool,
        key: &str,
        value: &str,
    ) -> Result<SiteCopyEntry, FolioError> {
        if !is_valid_copy_key(key) {
            return Err(FolioError::InvalidInput(format!(
                "Invalid copy key '{}': use [a-z0-9_], at most 64 characters",
                key
            )));
        }
        let entry = SiteRepository::upsert(pool, key, value).await?;
        log::info!("Updated site copy '{}'", key);
        Ok(entry)
    }

    pub async fn theme(pool: &PgPool) -> Result<Theme, FolioError> {
        let stored = SiteRepository::get(pool, THEME_KEY).await?;
        Ok(Theme::from_stored(stored.as_ref().map(|e| e.value.as_str())))
    }

    pub async fn update_theme(pool: &PgPool, theme: Theme) -> Result<Theme, FolioError> {
        theme
            .validate()
            .map_err(|e| FolioError::ValidationError(e.to_string()))?;

        let serialized = serde_json::to_string(&theme).map_err(|e| {
            log::error!("Failed to serialize theme: {}", e);
            FolioError::InternalError
        })?;
        SiteRepository::upsert(pool, THEME_KEY, &serialized).await?;
        log::info!("Theme updated");
        Ok(theme)
    }

    pub async fn home(pool: &PgPool) -> Result<HomeResponse, FolioError> {
        let site = Self::site(pool).await?;

        let featured = PhotoRepository::list_featured(pool, HOME_FEATURED_LIMIT).await?;
        let featured = PhotoService::public_responses(pool, featured).await?;

        let recent_albums =
            CollectionRepository::recent_public(pool, CollectionKind::Album, HOME_RECENT_ALBUMS)
                .await?;
        let series = CollectionRepository::list(pool, CollectionKind::Series, true, None).await?;

        Ok(HomeResponse {
            copy: site.copy,
            theme: site.theme,
            featured,
            recent_albums: recent_albums.iter().map(|r| r.to_response()).collect(),
            series: series.iter().map(|r| r.to_response()).collect(),
        })
    }
}
