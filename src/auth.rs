use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use rand::rngs::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;
use crate::AppState;

const TOKEN_SCHEME: &str = "Token ";
const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(plain: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Reasons a new password is unacceptable; empty when it is fine.
pub fn password_problems(password: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    problems
}

/// Return the user's token, creating one if they have none yet.
pub async fn issue_token(db: &SqlitePool, user_id: i64) -> Result<String, sqlx::Error> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT key FROM auth_tokens WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    if let Some((key,)) = existing {
        return Ok(key);
    }

    let key = Uuid::new_v4().simple().to_string();
    sqlx::query("INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&key)
        .bind(user_id)
        .bind(Utc::now().to_rfc3339())
        .execute(db)
        .await?;
    tracing::info!(user_id, "auth token issued");
    Ok(key)
}

pub async fn revoke_token(db: &SqlitePool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(db)
        .await?;
    tracing::info!(user_id, "auth token revoked");
    Ok(())
}

/// `None` when the request carries no Authorization header at all.
fn token_from_parts(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix(TOKEN_SCHEME))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(AppError::Unauthorized("Invalid token header."))?;
    Ok(Some(key.to_string()))
}

async fn user_for_token(db: &SqlitePool, key: &str) -> Result<User, AppError> {
    let user: Option<User> = sqlx::query_as(
        "SELECT u.* FROM users u JOIN auth_tokens t ON t.user_id = u.id WHERE t.key = ?",
    )
    .bind(key)
    .fetch_optional(db)
    .await?;

    user.ok_or(AppError::Unauthorized("Invalid token."))
}

/// The authenticated caller. Rejects with 401 when the token is missing or
/// unknown.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = token_from_parts(parts)?
            .ok_or(AppError::Unauthorized("Authentication credentials were not provided."))?;
        user_for_token(&state.db, &key).await.map(AuthUser)
    }
}

/// The caller if a token was sent, for endpoints that anonymous users may
/// also read. A token that is sent but unknown is still rejected.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match token_from_parts(parts)? {
            Some(key) => user_for_token(&state.db, &key)
                .await
                .map(|user| MaybeUser(Some(user))),
            None => Ok(MaybeUser(None)),
        }
    }
}
