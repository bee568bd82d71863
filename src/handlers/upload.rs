// src/handlers/upload.rs
// DOCUMENTATION: Multipart photo upload
// PURPOSE: Read files and form fields, enforce size limits, hand files to the photo service

use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures_util::StreamExt;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::FolioError;
use crate::models::{parse_tag_field, UploadResponse};
use crate::services::{
    require_admin, IncomingFile, MediaStore, PhotoService, SessionManager, UploadOptions,
};

const MAX_TEXT_FIELD_BYTES: usize = 4096;

fn parse_flag(value: &str) -> Result<bool, FolioError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "off" | "no" => Ok(false),
        "true" | "1" | "on" | "yes" => Ok(true),
        other => Err(FolioError::InvalidInput(format!(
            "is_public must be a boolean, got '{}'",
            other
        ))),
    }
}

fn parse_album_id(value: &str) -> Result<Option<Uuid>, FolioError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(value)
        .map(Some)
        .map_err(|_| FolioError::InvalidInput(format!("album_id '{}' is not a UUID", value)))
}

/// Read a field into memory, failing once it grows past `limit` bytes
async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, FolioError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| {
            log::warn!("Broken multipart stream: {}", e);
            FolioError::InvalidInput("Malformed multipart body".to_string())
        })?;
        if bytes.len() + chunk.len() > limit {
            return Err(FolioError::PayloadTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn read_text(field: &mut Field) -> Result<String, FolioError> {
    let bytes = read_field(field, MAX_TEXT_FIELD_BYTES).await?;
    String::from_utf8(bytes)
        .map_err(|_| FolioError::InvalidInput("Form fields must be UTF-8".to_string()))
}

/// POST /api/admin/upload
/// Fields: `file` (repeatable up to MAX_UPLOAD_FILES), `album_id`, `is_public`, `tags` (comma separated)
pub async fn upload_photos(
    pool: web::Data<PgPool>,
    store: web::Data<MediaStore>,
    config: web::Data<Config>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    mut payload: Multipart,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;

    let mut files = Vec::new();
    let mut options = UploadOptions {
        thumbnail_size: config.thumbnail_size,
        ..UploadOptions::default()
    };

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            log::warn!("Rejected multipart upload: {}", e);
            FolioError::InvalidInput("Malformed multipart body".to_string())
        })?;

        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let file_name = disposition.get_filename().map(|f| f.to_string());

        match name.as_str() {
            "file" | "files" => {
                if files.len() >= config.max_upload_files {
                    return Err(FolioError::InvalidInput(format!(
                        "At most {} files per upload",
                        config.max_upload_files
                    )));
                }
                let bytes = read_field(&mut field, config.max_upload_bytes).await?;
                let original_name = file_name.unwrap_or_else(|| "upload".to_string());
                if bytes.is_empty() {
                    return Err(FolioError::InvalidInput(format!("{} is empty", original_name)));
                }
                files.push(IncomingFile {
                    original_name,
                    bytes,
                });
            }
            "album_id" => options.album_id = parse_album_id(&read_text(&mut field).await?)?,
            "is_public" => options.is_public = parse_flag(&read_text(&mut field).await?)?,
            "tags" => options.tags = parse_tag_field(&read_text(&mut field).await?),
            other => {
                log::debug!("Ignoring unknown upload field '{}'", other);
                read_field(&mut field, config.max_upload_bytes).await?;
            }
        }
    }

    log::info!("Upload of {} file(s) received", files.len());
    let results = PhotoService::ingest_all(pool.get_ref(), &store, &options, files).await?;

    let response = UploadResponse { results };
    if response.results.iter().any(|r| !r.duplicate) {
        Ok(HttpResponse::Created().json(response))
    } else {
        Ok(HttpResponse::Ok().json(response))
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/admin/upload", web::post().to(upload_photos));
}

#[cfg(test)]
mod field_tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true").unwrap());
        assert!(parse_flag(" ON ").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_parse_album_id() {
        assert_eq!(parse_album_id("  ").unwrap(), None);
        let id = Uuid::new_v4();
        assert_eq!(parse_album_id(&id.to_string()).unwrap(), Some(id));
        assert!(parse_album_id("album-7").is_err());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::handlers::test_support;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    const BOUNDARY: &str = "folio-test-boundary";

    fn multipart_body(parts: Vec<(&str, Option<&str>, Vec<u8>)>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, content) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, f
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                ),
            }
            body.extend_from_slice(&content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>, with_session: bool) -> test::TestRequest {
        let mut req = test::TestRequest::post().uri("/api/admin/upload").insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ));
        if with_session {
            req = req.cookie(test_support::admin_cookie());
        }
        req.set_payload(body)
    }

    #[actix_web::test]
    async fn test_upload_requires_session() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let body = multipart_body(vec![("file", Some("a.png"), b"irrelevant".to_vec())]);
        let resp = test::call_service(&app, upload_request(body, false).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_oversized_file_is_rejected() {
        let mut small = test_config();
        small.max_upload_bytes = 16;
        let app = test::init_service(
            App::new()
                .configure(test_support::with_state(small))
                .configure(config),
        )
        .await;

        let body = multipart_body(vec![("file", Some("big.jpg"), vec![0u8; 64])]);
        let resp = test::call_service(&app, upload_request(body, true).to_request()).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn test_non_image_is_unsupported_media_type() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let body = multipart_body(vec![
            ("is_public", None, b"true".to_vec()),
            ("file", Some("notes.txt"), b"just some text, not an image".to_vec()),
        ]);
        let resp = test::call_service(&app, upload_request(body, true).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[actix_web::test]
    async fn test_upload_without_files_is_bad_request() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let body = multipart_body(vec![("tags", None, b"street, night".to_vec())]);
        let resp = test::call_service(&app, upload_request(body, true).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_too_many_files_is_rejected() {
        let mut config_two = test_config();
        config_two.max_upload_files = 2;
        let app = test::init_service(
            App::new()
                .configure(test_support::with_state(config_two))
                .configure(config),
        )
        .await;

        let body = multipart_body(vec![
            ("file", Some("a.txt"), b"a".to_vec()),
            ("file", Some("b.txt"), b"b".to_vec()),
            ("file", Some("c.txt"), b"c".to_vec()),
        ]);
        let resp = test::call_service(&app, upload_request(body, true).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
