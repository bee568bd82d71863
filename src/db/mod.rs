// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod collection_repository;
pub mod metrics_repository;
pub mod photo_repository;
pub mod site_repository;
pub mod tag_repository;
pub mod user_repository;

pub use collection_repository::*;
pub use metrics_repository::*;
pub use photo_repository::*;
pub use site_repository::*;
pub use tag_repository::*;
pub use user_repository::*;

/// Database fixtures for repository and service tests.
/// Tests that need Postgres call `pool()` and return early when
/// DATABASE_URL is unset.
#[cfg(test)]
pub(crate) mod test_db {
    use sqlx::postgres::{PgPool, PgPoolOptions};
    use uuid::Uuid;

    use crate::db::PhotoRepository;
    use crate::models::{NewPhoto, Photo};

    pub async fn pool() -> Option<PgPool> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping database test");
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .expect("DATABASE_URL is set but the database is unreachable");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations failed");
        Some(pool)
    }

    /// Short random suffix for names that must be unique across runs
    pub fn unique(prefix: &str) -> String {
        format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..10])
    }

    /// A photo row without files on disk
    pub async fn insert_photo(pool: &PgPool) -> Photo {
        let id = Uuid::new_v4();
        let photo = NewPhoto {
            id,
            title: unique("photo"),
            file_name: format!("{}.jpg", id),
            original_name: "fixture.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            checksum: unique("checksum"),
            size_bytes: 1024,
            width: 300,
            height: 200,
            is_public: true,
            album_id: None,
        };
        PhotoRepository::insert(pool, &photo)
            .await
            .unwrap()
            .expect("fixture checksum collided")
    }

    pub async fn delete_photos(pool: &PgPool, ids: &[Uuid]) {
        sqlx::query("DELETE FROM photos WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await
            .unwrap();
    }
}
