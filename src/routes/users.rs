use std::collections::HashSet;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::{hash_password, password_problems, verify_password, AuthUser, MaybeUser};
use crate::error::{is_unique_violation, AppError, FieldErrors};
use crate::models::{NewUser, User};
use crate::routes::IdPath;
use crate::AppState;

/// Public representation of a user, relative to whoever is asking.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(Serialize)]
struct CreatedUser {
    email: String,
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
}

#[derive(Deserialize)]
pub struct SetPasswordForm {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register))
        .route("/users/me", get(me))
        .route("/users/set_password", post(set_password))
        .route("/users/{id}", get(get_user))
}

pub async fn fetch_user(db: &SqlitePool, id: i64) -> Result<User, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    user.ok_or(AppError::NotFound)
}

pub async fn is_subscribed(
    db: &SqlitePool,
    viewer: Option<i64>,
    author_id: i64,
) -> Result<bool, sqlx::Error> {
    let Some(viewer) = viewer else {
        return Ok(false);
    };
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM subscriptions WHERE user_id = ? AND author_id = ?")
            .bind(viewer)
            .bind(author_id)
            .fetch_optional(db)
            .await?;
    Ok(row.is_some())
}

pub async fn user_view(
    db: &SqlitePool,
    user: User,
    viewer: Option<i64>,
) -> Result<UserView, sqlx::Error> {
    let subscribed = is_subscribed(db, viewer, user.id).await?;
    Ok(UserView::new(user, subscribed))
}

async fn list_users(
    State(state): State<AppState>,
    viewer: MaybeUser,
) -> Result<impl IntoResponse, AppError> {
    let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY id DESC")
        .fetch_all(&state.db)
        .await?;

    let followed: HashSet<i64> = match viewer.id() {
        Some(viewer_id) => {
            let rows: Vec<(i64,)> =
                sqlx::query_as("SELECT author_id FROM subscriptions WHERE user_id = ?")
                    .bind(viewer_id)
                    .fetch_all(&state.db)
                    .await?;
            rows.into_iter().map(|(id,)| id).collect()
        }
        None => HashSet::new(),
    };

    let views: Vec<UserView> = users
        .into_iter()
        .map(|user| {
            let subscribed = followed.contains(&user.id);
            UserView::new(user, subscribed)
        })
        .collect();
    Ok(Json(views))
}

async fn register(
    State(state): State<AppState>,
    Json(form): Json<NewUser>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = form.validate();

    let taken: Vec<(String, String)> =
        sqlx::query_as("SELECT username, email FROM users WHERE username = ? OR email = ?")
            .bind(&form.username)
            .bind(&form.email)
            .fetch_all(&state.db)
            .await?;
    if taken.iter().any(|(username, _)| *username == form.username) {
        errors.add("username", "A user with that username already exists.");
    }
    if taken.iter().any(|(_, email)| *email == form.email) {
        errors.add("email", "A user with that email already exists.");
    }
    errors.into_result()?;

    let password_hash = hash_password(&form.password)?;
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, first_name, last_name, password_hash, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&form.username)
    .bind(&form.email)
    .bind(form.first_name.trim())
    .bind(form.last_name.trim())
    .bind(&password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await;

    let id = match result {
        Ok(done) => done.last_insert_rowid(),
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Validation(FieldErrors::single(
                "username",
                "A user with that username or email already exists.",
            )));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = id, username = %form.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(CreatedUser {
            email: form.email,
            id,
            username: form.username,
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
        }),
    ))
}

async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    IdPath(id): IdPath,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&state.db, id).await?;
    Ok(Json(user_view(&state.db, user, viewer.id()).await?))
}

async fn me(AuthUser(user): AuthUser) -> Result<impl IntoResponse, AppError> {
    Ok(Json(UserView::new(user, false)))
}

async fn set_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(form): Json<SetPasswordForm>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = FieldErrors::new();

    if !verify_password(&form.current_password, &user.password_hash)? {
        errors.add("current_password", "Incorrect password.");
    }
    for problem in password_problems(&form.new_password) {
        errors.add("new_password", problem);
    }
    if form.new_password == form.current_password {
        errors.add(
            "new_password",
            "The new password must differ from the current one.",
        );
    }
    errors.into_result()?;

    let password_hash = hash_password(&form.new_password)?;
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
