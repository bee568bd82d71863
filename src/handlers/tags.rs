// src/handlers/tags.rs
// DOCUMENTATION: HTTP handlers for tags

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::errors::FolioError;
use crate::models::{MergeTagsRequest, TagNameRequest, TagPhotosQuery};
use crate::services::{require_admin, SessionManager, TagService};

/// GET /api/tags
/// Tags with at least one public photo
pub async fn list_tags(pool: web::Data<PgPool>) -> Result<impl Responder, FolioError> {
    let tags = TagService::list_public(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(tags))
}

/// GET /api/tags/{slug}
pub async fn get_tag(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
    query: web::Query<TagPhotosQuery>,
) -> Result<impl Responder, FolioError> {
    let detail = TagService::public_detail(pool.get_ref(), &path, &query).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// GET /api/admin/tags
pub async fn admin_list_tags(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    let tags = TagService::list_all(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(tags))
}

/// POST /api/admin/tags
pub async fn create_tag(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    body: web::Json<TagNameRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let tag = TagService::create(pool.get_ref(), &body.name).await?;
    Ok(HttpResponse::Created().json(tag))
}

/// PATCH /api/admin/tags/{id}
/// Renames the tag; the slug follows the new name
pub async fn rename_tag(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<TagNameRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let tag = TagService::rename(pool.get_ref(), path.into_inner(), &body.name).await?;
    Ok(HttpResponse::Ok().json(tag))
}

/// DELETE /api/admin/tags/{id}
pub async fn delete_tag(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    TagService::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/admin/tags/merge
pub async fn merge_tags(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    body: web::Json<MergeTagsRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let merged = TagService::merge(pool.get_ref(), &body).await?;
    Ok(HttpResponse::Ok().json(merged))
}

/// Configuration for tag routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/tags")
            .route("", web::get().to(list_tags))
            .route("/{slug}", web::get().to(get_tag)),
    )
    .service(
        web::resource("/api/admin/tags")
            .route(web::get().to(admin_list_tags))
            .route(web::post().to(create_tag)),
    )
    .route("/api/admin/tags/merge", web::post().to(merge_tags))
    .service(
        web::resource("/api/admin/tags/{id}")
            .route(web::patch().to(rename_tag))
            .route(web::delete().to(delete_tag)),
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
    async fn test_merge_into_own_source_is_bad_request() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let target = Uuid::new_v4();
        let req = test::TestRequest::post()
            .uri("/api/admin/tags/merge")
            .cookie(test_support::admin_cookie())
            .set_json(json!({"source_ids": [target], "target_id": target}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_merge_requires_session() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/admin/tags/merge")
            .set_json(json!({"source_ids": [Uuid::new_v4()], "target_id": Uuid::new_v4()}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_blank_tag_name_is_rejected() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/admin/tags")
            .cookie(test_support::admin_cookie())
            .set_json(json!({"name": "   "}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
