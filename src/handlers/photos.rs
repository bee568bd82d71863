// src/handlers/photos.rs
// DOCUMENTATION: HTTP handlers for photo operations
// PURPOSE: Public gallery listing plus admin library management

use actix_files::NamedFile;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::errors::FolioError;
use crate::models::{
    AdminPhotoListQuery, BulkPhotoRequest, BulkPhotoResponse, FileQuery, PhotoListQuery,
    UpdatePhotoRequest, VisibilityRequest,
};
use crate::services::{require_admin, MediaStore, PhotoService, SessionManager};

/// GET /api/photos
/// Public photos, newest first, with optional tag/album/series/featured filters
pub async fn list_photos(
    pool: web::Data<PgPool>,
    query: web::Query<PhotoListQuery>,
) -> Result<impl Responder, FolioError> {
    let page = PhotoService::list_public(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/photos/{id}
pub async fn get_photo(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FolioError> {
    let photo = PhotoService::get_public(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(photo))
}

/// GET /api/admin/photos
pub async fn admin_list_photos(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    query: web::Query<AdminPhotoListQuery>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    let page = PhotoService::list_admin(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/admin/photos/{id}
pub async fn admin_get_photo(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    let photo = PhotoService::get_admin(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(photo))
}

/// PATCH /api/admin/photos/{id}
pub async fn update_photo(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePhotoRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let photo = PhotoService::update(pool.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(photo))
}

/// DELETE /api/admin/photos/{id}
pub async fn delete_photo(
    pool: web::Data<PgPool>,
    store: web::Data<MediaStore>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    PhotoService::delete(pool.get_ref(), &store, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// PUT /api/admin/photos/{id}/visibility
pub async fn set_visibility(
    pool: web::Data<PgPool>,
    store: web::Data<MediaStore>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<VisibilityRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    let photo =
        PhotoService::set_visibility(pool.get_ref(), &store, path.into_inner(), body.is_public)
            .await?;
    Ok(HttpResponse::Ok().json(photo))
}

/// POST /api/admin/photos/bulk
pub async fn bulk_photos(
    pool: web::Data<PgPool>,
    store: web::Data<MediaStore>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    body: web::Json<BulkPhotoRequest>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let affected = PhotoService::bulk(pool.get_ref(), &store, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(BulkPhotoResponse { affected }))
}

/// GET /api/admin/photos/{id}/file?variant=original|thumbnail
/// Streams stored files regardless of visibility
pub async fn photo_file(
    pool: web::Data<PgPool>,
    store: web::Data<MediaStore>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    query: web::Query<FileQuery>,
) -> Result<HttpResponse, FolioError> {
    require_admin(&req, &sessions)?;

    let thumbnail = match query.variant.as_deref() {
        None | Some("original") => false,
        Some("thumbnail") => true,
        Some(other) => {
            return Err(FolioError::InvalidInput(format!(
                "Unknown variant '{}'",
                other
            )))
        }
    };

    let id = path.into_inner();
    let file_path = PhotoService::file_path(pool.get_ref(), &store, id, thumbnail).await?;

    let file = NamedFile::open_async(&file_path).await.map_err(|e| {
        log::error!("Stored file for photo {} is unreadable: {}", id, e);
        FolioError::NotFound(format!("file of photo {}", id))
    })?;

    let mut response = file.into_response(&req);
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("private, no-store"),
    );
    Ok(response)
}

/// Configuration for photo routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/photos")
            .route("", web::get().to(list_photos))
            .route("/{id}", web::get().to(get_photo)),
    )
    .route("/api/admin/photos", web::get().to(admin_list_photos))
    .route("/api/admin/photos/bulk", web::post().to(bulk_photos))
    .service(
        web::resource("/api/admin/photos/{id}")
            .route(web::get().to(admin_get_photo))
            .route(web::patch().to(update_photo))
            .route(web::delete().to(delete_photo)),
    )
    .route(
        "/api/admin/photos/{id}/visibility",
        web::put().to(set_visibility),
    )
    .route("/api/admin/photos/{id}/file", web::get().to(photo_file));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_admin_photo_routes_require_session() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let id = Uuid::new_v4();
        let requests = vec![
            test::TestRequest::get().uri("/api/admin/photos").to_request(),
            test::TestRequest::patch()
                .uri(&format!("/api/admin/photos/{}", id))
                .set_json(json!({"title": "x"}))
                .to_request(),
            test::TestRequest::delete()
                .uri(&format!("/api/admin/photos/{}", id))
                .to_request(),
            test::TestRequest::put()
                .uri(&format!("/api/admin/photos/{}/visibility", id))
                .set_json(json!({"is_public": true}))
                .to_request(),
            test::TestRequest::post()
                .uri("/api/admin/photos/bulk")
                .set_json(json!({"ids": [id], "action": "feature"}))
                .to_request(),
            test::TestRequest::get()
                .uri(&format!("/api/admin/photos/{}/file", id))
                .to_request(),
        ];

        for req in requests {
            let path = req.uri().path().to_string();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", path);
        }
    }

    #[actix_web::test]
    async fn test_malformed_cursor_is_bad_request() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/photos?cursor=%21%21%21")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_bulk_rejects_empty_ids() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/admin/photos/bulk")
            .cookie(test_support::admin_cookie())
            .set_json(json!({"ids": [], "action": "delete"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
