// src/handlers/site.rs
// DOCUMENTATION: Home page, site copy and theme handlers

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::FolioError;
use crate::models::{Theme, UpdateCopyRequest};
use crate::services::{require_admin, SessionManager, SiteService};

/// GET /api/home
pub async fn home(pool: web::Data<PgPool>) -> Result<impl Responder, FolioError> {
    let home = SiteService::home(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(home))
}

/// GET /api/site
pub async fn site(pool: web::Data<PgPool>) -> Result<impl Responder, FolioError> {
    let site = SiteService::site(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(site))
}

/// PUT /api/admin/site/{key}
pub async fn update_copy(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateCopyRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let entry = SiteService::update_copy(pool.get_ref(), &path.into_inner(), &body.value).await?;
    Ok(HttpResponse::Ok().json(entry))
}

/// GET /api/admin/theme
pub async fn get_theme(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    let theme = SiteService::theme(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(theme))
}

/// PUT /api/admin/theme
pub async fn update_theme(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    body: web::Json<Theme>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    let theme = SiteService::update_theme(pool.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(theme))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/home", web::get().to(home))
        .route("/api/site", web::get().to(site))
        .route("/api/admin/site/{key}", web::put().to(update_copy))
        .service(
            web::resource("/api/admin/theme")
                .route(web::get().to(get_theme))
                .route(web::put().to(update_theme)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_theme_routes_require_session() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/admin/theme").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::put()
            .uri("/api/admin/site/hero_title")
            .set_json(json!({"value": "Hello"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_invalid_theme_is_rejected_before_saving() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/admin/theme")
            .cookie(test_support::admin_cookie())
            .set_json(json!({
                "accent_color": "red",
                "background_color": "#000000",
                "text_color": "#ffffff",
                "font_family": "Inter",
                "layout": "grid"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_bad_copy_key_is_rejected() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/admin/site/Hero-Title")
            .cookie(test_support::admin_cookie())
            .set_json(json!({"value": "Hello"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
