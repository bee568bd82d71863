// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, storage and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{start_prune_task, AuthService, MediaStore, RateLimiters, SessionManager};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting photo-folio...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = AuthService::ensure_admin(&pool, &config).await {
        log::error!("Failed to seed admin account: {}", e);
        std::process::exit(1);
    }

    // 5. Media storage
    let store = MediaStore::new(config.upload_dir.clone());
    if let Err(e) = store.ensure_dirs().await {
        log::error!("Media storage unavailable: {}", e);
        std::process::exit(1);
    }
    log::info!("Serving media from {}", store.public_dir().display());

    // 6. Sessions and rate limiting
    let sessions = SessionManager::from_config(&config);
    let limiters = RateLimiters::from_config(&config);
    start_prune_task(limiters.clone(), 300);
    log::info!(
        "Rate limits: login {}/min, tracking {}/min",
        config.login_rate_per_minute,
        config.track_rate_per_minute
    );

    // 7. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let pool = web::Data::new(pool);
    let config = web::Data::new(config);
    let sessions = web::Data::new(sessions);
    let limiters = web::Data::new(limiters);
    let store = web::Data::new(store);

    HttpServer::new(move || {
        App::new()
            // Application state
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(sessions.clone())
            .app_data(limiters.clone())
            .app_data(store.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::auth_config)
            .configure(handlers::site_config)
            .configure(handlers::photos_config)
            .configure(handlers::upload_config)
            .configure(handlers::collections_config)
            .configure(handlers::tags_config)
            .configure(handlers::metrics_config)
            .service(Files::new("/media", store.public_dir()))
    })
    .bind(&server_addr)?
    .run()
    .await
}
