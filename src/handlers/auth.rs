// src/handlers/auth.rs
// DOCUMENTATION: Admin session handlers
// PURPOSE: Login, logout, current user and password change

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::FolioError;
use crate::models::{ChangePasswordRequest, LoginRequest};
use crate::services::{require_admin, AuthService, RateLimiters, SessionManager};

/// POST /api/auth/login
/// Sets the session cookie and also returns the token for non-browser clients
pub async fn login(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    limiters: web::Data<RateLimiters>,
    req: HttpRequest,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, FolioError> {
    limiters.login.check_request(&req)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    let user = AuthService::login(pool.get_ref(), &body).await?;
    let token = sessions.issue(&user)?;

    Ok(HttpResponse::Ok()
        .cookie(sessions.session_cookie(token.clone()))
        .json(serde_json::json!({
            "user": user.to_response(),
            "token": token,
        })))
}

/// POST /api/auth/logout
pub async fn logout(sessions: web::Data<SessionManager>) -> impl Responder {
    HttpResponse::NoContent()
        .cookie(sessions.removal_cookie())
        .finish()
}

/// GET /api/auth/me
pub async fn me(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
) -> Result<impl Responder, FolioError> {
    let claims = require_admin(&req, &sessions)?;
    let user = AuthService::current_user(pool.get_ref(), &claims).await?;
    Ok(HttpResponse::Ok().json(user.to_response()))
}

/// POST /api/auth/password
pub async fn change_password(
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionManager>,
    req: HttpRequest,
    body: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, FolioError> {
    let claims = require_admin(&req, &sessions)?;

    if let Err(e) = body.validate() {
        return Err(FolioError::ValidationError(e.to_string()));
    }

    AuthService::change_password(pool.get_ref(), claims.sub, &body).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(me))
            .route("/password", web::post().to(change_password)),
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
    async fn test_login_is_rate_limited_per_client() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        // Malformed emails fail validation without touching the database
        let attempt = || {
            test::TestRequest::post()
                .uri("/api/auth/login")
                .peer_addr("10.0.0.7:5000".parse().unwrap())
                .set_json(json!({"email": "not-an-email", "password": "x"}))
                .to_request()
        };

        for _ in 0..3 {
            let resp = test::call_service(&app, attempt()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        let resp = test::call_service(&app, attempt()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let other_client = test::TestRequest::post()
            .uri("/api/auth/login")
            .peer_addr("10.0.0.8:5000".parse().unwrap())
            .set_json(json!({"email": "not-an-email", "password": "x"}))
            .to_request();
        let resp = test::call_service(&app, other_client).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_login_limit_ignores_spoofed_forwarded_for() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let mut statuses = Vec::new();
        for i in 0..10 {
            let req = test::TestRequest::post()
                .uri("/api/auth/login")
                .peer_addr("10.0.0.7:5000".parse().unwrap())
                .insert_header(("X-Forwarded-For", format!("198.51.100.{}", i)))
                .set_json(json!({"email": "not-an-email", "password": "x"}))
                .to_request();
            statuses.push(test::call_service(&app, req).await.status());
        }

        assert!(statuses[..3].iter().all(|s| *s == StatusCode::BAD_REQUEST));
        assert!(statuses[3..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
    }

    #[actix_web::test]
    async fn test_logout_clears_cookie() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/auth/logout").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == "folio_session")
            .unwrap();
        assert_eq!(cookie.value(), "");
    }

    #[actix_web::test]
    async fn test_me_requires_session() {
        let app = test::init_service(
            App::new()
                .configure(test_support::state())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", "Bearer forged.token.value"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
