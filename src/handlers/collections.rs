// src/handlers/collections.rs
// DOCUMENTATION: Album and series handlers
// PURPOSE: One set of handlers serves both kinds; each route carries its kind as app data

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::errors::FolioError;
use crate::models::{
    CollectionKind, CollectionPhotosRequest, CreateCollectionRequest, UpdateCollectionRequest,
};
use crate::services::{require_admin, CollectionService, SessionManager};

/// GET /api/albums, GET /api/series
pub async fn list_public(
    pool: web::Data<PgPool>,
    kind: web::Data<CollectionKind>,
) -> Result<impl Responder, FolioError> {
    let items = CollectionService::list(pool.get_ref(), **kind, true).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/albums/{slug}, GET /api/series/{slug}
pub async fn get_public(
    pool: web::Data<PgPool>,
    kind: web::Data<CollectionKind>,
    path: web::Path<String>,
) -> Result<impl Responder, FolioError> {
    let detail = CollectionService::public_detail(pool.get_ref(), **kind, &path).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn admin_list(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    kind: web::Data<CollectionKind>,
    req: HttpRequest,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    let items = CollectionService::list(pool.get_ref(), **kind, false).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn admin_get(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    kind: web::Data<CollectionKind>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    let detail = CollectionService::admin_detail(pool.get_ref(), **kind, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn create(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    kind: web::Data<CollectionKind>,
    req: HttpRequest,
    body: web::Json<CreateCollectionRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let created = CollectionService::create(pool.get_ref(), **kind, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn update(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    kind: web::Data<CollectionKind>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCollectionRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let updated =
        CollectionService::update(pool.get_ref(), **kind, path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Photos keep existing; they are only detached
pub async fn delete(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    kind: web::Data<CollectionKind>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    CollectionService::delete(pool.get_ref(), **kind, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST .../{id}/photos appends photos
pub async fn add_photos(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    kind: web::Data<CollectionKind>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CollectionPhotosRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let detail =
        CollectionService::add_photos(pool.get_ref(), **kind, path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// PUT .../{id}/photos replaces the membership; for series the order is kept
pub async fn set_photos(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    kind: web::Data<CollectionKind>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CollectionPhotosRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let detail =
        CollectionService::set_photos(pool.get_ref(), **kind, path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(detail))
}

fn routes(cfg: &mut web::ServiceConfig, kind: CollectionKind, segment: &str) {
    let data = web::Data::new(kind);

    cfg.service(
        web::scope(&format!("/api/{}", segment))
            .app_data(data.clone())
            .route("", web::get().to(list_public))
            .route("/{slug}", web::get().to(get_public)),
    )
    .service(
        web::resource(format!("/api/admin/{}", segment))
            .app_data(data.clone())
            .route(web::get().to(admin_list))
            .route(web::post().to(create)),
    )
    .service(
        web::resource(format!("/api/admin/{}/{{id}}", segment))
            .app_data(data.clone())
            .route(web::get().to(admin_get))
            .route(web::patch().to(update))
            .route(web::delete().to(delete)),
    )
    .service(
        web::resource(format!("/api/admin/{}/{{id}}/photos", segment))
            .app_data(data)
            .route(web::post().to(add_photos))
            .route(web::put().to(set_photos)),
    );
}

/// Configuration for album and series routes
pub fn config(cfg: &mut web::ServiceConfig) {
    routes(cfg, CollectionKind::Album, "albums");
    routes(cfg, CollectionKind::Series, "series");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_admin_collection_routes_require_session() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let id = Uuid::new_v4();
        for segment in ["albums", "series"] {
            let req = test::TestRequest::post()
                .uri(&format!("/api/admin/{}", segment))
                .set_json(json!({"title": "Night"}))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

            let req = test::TestRequest::put()
                .uri(&format!("/api/admin/{}/{}/photos", segment, id))
                .set_json(json!({"photo_ids": []}))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_web::test]
    async fn test_create_validates_title() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/admin/albums")
            .cookie(test_support::admin_cookie())
            .set_json(json!({"title": ""}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
