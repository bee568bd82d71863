// src/services/auth_service.rs
// DOCUMENTATION: Password hashing and session tokens
// PURPOSE: Admin login, session cookies and credential checks

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::HttpRequest;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::config::Config;
use crate::db::UserRepository;
use crate::errors::FolioError;
use crate::models::{ChangePasswordRequest, LoginRequest, User};

/// Hash a password into an argon2 PHC string
pub fn hash_password(password: &str) -> Result<String, FolioError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            FolioError::InternalError
        })
}

/// Check a password against a stored PHC string; malformed hashes never match
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Hash checked when the email is unknown, so both paths cost one argon2 verify
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("not-a-real-password").unwrap_or_default())
}

/// The user whose stored hash matches `password`, if any
fn authenticate(user: Option<User>, password: &str) -> Option<User> {
    let stored = user
        .as_ref()
        .map(|u| u.password_hash.as_str())
        .unwrap_or_else(|| dummy_hash());
    let valid = verify_password(password, stored);
    user.filter(|_| valid)
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 session tokens and builds the session cookie
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    cookie_name: String,
    secure_cookie: bool,
}

impl SessionManager {
    pub fn new(secret: &str, ttl_hours: i64, cookie_name: &str, secure_cookie: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
            cookie_name: cookie_name.to_string(),
            secure_cookie,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            config.session_ttl_hours,
            &config.session_cookie_name,
            config.is_production(),
        )
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn issue(&self, user: &User) -> Result<String, FolioError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            log::error!("Failed to sign session token: {}", e);
            FolioError::InternalError
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, FolioError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("Rejected session token: {}", e);
                FolioError::Unauthorized
            })
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone(), token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(CookieDuration::seconds(self.ttl.num_seconds()))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.cookie_name.clone(), "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .finish();
        cookie.make_removal();
        cookie
    }

    /// Token from the session cookie, or an `Authorization: Bearer` header
    pub fn token_from_request(&self, req: &HttpRequest) -> Option<String> {
        if let Some(cookie) = req.cookie(&self.cookie_name) {
            if !cookie.value().is_empty() {
                return Some(cookie.value().to_string());
            }
        }

        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

/// Verify the request carries a valid admin session
/// DOCUMENTATION: Called at the top of every admin handler
pub fn require_admin(req: &HttpRequest, sessions: &SessionManager) -> Result<Claims, FolioError> {
    let token = sessions.token_from_request(req).ok_or_else(|| {
        log::warn!("Admin request without session: {}", req.path());
        FolioError::Unauthorized
    })?;

    sessions.verify(&token)
}

pub struct AuthService;

impl AuthService {
    /// Check credentials and record the login
    pub async fn login(pool: &PgPool, req: &LoginRequest) -> Result<User, FolioError> {
        let user = UserRepository::find_by_email(pool, &req.email).await?;

        match authenticate(user, &req.password) {
            Some(user) => {
                UserRepository::touch_last_login(pool, user.id).await?;
                log::info!("Admin {} logged in", user.email);
                Ok(user)
            }
            None => {
                log::warn!("Failed login attempt for {}", req.email);
                Err(FolioError::Unauthorized)
            }
        }
    }

    pub async fn current_user(pool: &PgPool, claims: &Claims) -> Result<User, FolioError> {
        UserRepository::get_by_id(pool, claims.sub).await
    }

    pub async fn change_password(
        pool: &PgPool,
        user_id: Uuid,
        req: &ChangePasswordRequest,
    ) -> Result<(), FolioError> {
        let user = UserRepository::get_by_id(pool, user_id).await?;

        if !verify_password(&req.current_password, &user.password_hash) {
            return Err(FolioError::Forbidden);
        }

        let hash = hash_password(&req.new_password)?;
        UserRepository::update_password(pool, user_id, &hash).await?;
        log::info!("Password changed for {}", user.email);
        Ok(())
    }

    /// Create the configured admin account if it does not exist yet
    pub async fn ensure_admin(pool: &PgPool, config: &Config) -> Result<(), FolioError> {
        let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
            return Ok(());
        };

        if UserRepository::find_by_email(pool, email).await?.is_some() {
            log::debug!("Admin account {} already present", email);
            return Ok(());
        }

        let hash = hash_password(password)?;
        UserRepository::create(pool, email, &hash, None).await?;
        log::info!("Seeded admin account {}", email);
        Ok(())
    }
}
