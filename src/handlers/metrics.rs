// src/handlers/metrics.rs
// DOCUMENTATION: View tracking beacon and analytics summary

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;

use crate::errors::FolioError;
use crate::models::{MetricsQuery, TrackRequest};
use crate::services::{require_admin, MetricsService, RateLimiters, SessionManager};

/// POST /api/metrics/track
pub async fn track(
    pool: web::Data<PgPool>,
    limiters: web::Data<RateLimiters>,
    req: HttpRequest,
    body: web::Json<TrackRequest>,
) -> Result<impl Responder, FolioError> {
    limiters.tracking.check_request(&req)?;
    MetricsService::track(pool.get_ref(), &body).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/admin/metrics?days=N
pub async fn summary(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    query: web::Query<MetricsQuery>,
) -> Result<impl Responder, FolioError> {
    require_admin(&req, &sessions)?;
    let summary = MetricsService::summary(pool.get_ref(), query.days).await?;
    Ok(HttpResponse::Ok().json(summary))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/metrics/track", web::post().to(track))
        .route("/api/admin/metrics", web::get().to(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_track_rejects_bad_path_then_rate_limits() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        // Quota in the test config is 10 per minute
        for _ in 0..10 {
            let req = test::TestRequest::post()
                .uri("/api/metrics/track")
                .set_json(json!({"path": "no-leading-slash"}))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        }

        let req = test::TestRequest::post()
            .uri("/api/metrics/track")
            .set_json(json!({"path": "/albums"}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[actix_web::test]
    async fn test_summary_requires_session() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/admin/metrics?days=7").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
