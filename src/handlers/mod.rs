// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod auth;
pub mod collections;
pub mod health;
pub mod metrics;
pub mod photos;
pub mod site;
pub mod tags;
pub mod upload;

pub use auth::config as auth_config;
pub use collections::config as collections_config;
pub use health::config as health_config;
pub use metrics::config as metrics_config;
pub use photos::config as photos_config;
pub use site::config as site_config;
pub use tags::config as tags_config;
pub use upload::config as upload_config;

/// Application state for handler tests. The pool is lazy, so requests that
/// are rejected before reaching the database never need a server.
#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::web;
    use sqlx::postgres::PgPoolOptions;

    use crate::config::{test_config, Config};
    use crate::services::{MediaStore, RateLimiters, SessionManager};

    pub fn with_state(config: Config) -> impl FnOnce(&mut web::ServiceConfig) {
        move |cfg: &mut web::ServiceConfig| {
            let pool = PgPoolOptions::new()
                .acquire_timeout(std::time::Duration::from_secs(1))
                .connect_lazy(&config.database_url)
                .unwrap();
            cfg.app_data(web::Data::new(pool))
                .app_data(web::Data::new(SessionManager::from_config(&config)))
                .app_data(web::Data::new(RateLimiters::from_config(&config)))
                .app_data(web::Data::new(MediaStore::new(config.upload_dir.clone())))
                .app_data(web::Data::new(config));
        }
    }

    pub fn state() -> impl FnOnce(&mut web::ServiceConfig) {
        with_state(test_config())
    }

    /// Session cookie for a made-up admin
    pub fn admin_cookie() -> actix_web::cookie::Cookie<'static> {
        let sessions = SessionManager::from_config(&test_config());
        let user = crate::models::User {
            id: uuid::Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            password_hash: String::new(),
            name: None,
            created_at: chrono::Utc::now(),
            last_login_at: None,
        };
        sessions.session_cookie(sessions.issue(&user).unwrap())
    }
}
