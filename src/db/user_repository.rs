// src/db/user_repository.rs
// DOCUMENTATION: Admin account storage

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{map_db_error, FolioError};
use crate::models::User;

pub struct UserRepository;

impl UserRepository {
    /// Case-insensitive lookup by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, FolioError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email.trim())
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error("Fetch user by email", e))
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<User, FolioError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_db_error("Fetch user", e))?
            .ok_or(FolioError::Unauthorized)
    }

    pub async fn create(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User, FolioError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, name) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(email.trim().to_lowercase())
        .bind(password_hash)
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(|e| map_db_error(&format!("user '{}'", email), e))
    }

    pub async fn touch_last_login(pool: &PgPool, id: Uuid) -> Result<(), FolioError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| map_db_error("Record login", e))?;
        Ok(())
    }

    pub async fn update_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<(), FolioError> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| map_db_error("Update password", e))?;
        Ok(())
    }
}
