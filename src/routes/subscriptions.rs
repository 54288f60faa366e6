use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::AuthUser;
use crate::error::{is_unique_violation, AppError};
use crate::models::User;
use crate::routes::recipes::ShortRecipe;
use crate::routes::users::{fetch_user, is_subscribed, UserView};
use crate::routes::IdPath;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<ShortRecipe>,
    pub recipes_count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimit {
    recipes_limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/subscriptions", get(list_subscriptions))
        .route("/users/{id}/subscribe", post(subscribe).delete(unsubscribe))
}

async fn subscription_view(
    db: &SqlitePool,
    author: User,
    subscribed: bool,
    recipes_limit: Option<u32>,
) -> Result<SubscriptionView, sqlx::Error> {
    // SQLite treats a negative LIMIT as "no limit"
    let limit = recipes_limit.map(i64::from).unwrap_or(-1);
    let recipes: Vec<ShortRecipe> = sqlx::query_as(
        r#"
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = ?
        ORDER BY pub_date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(author.id)
    .bind(limit)
    .fetch_all(db)
    .await?;

    let (recipes_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
        .bind(author.id)
        .fetch_one(db)
        .await?;

    Ok(SubscriptionView {
        author: UserView::new(author, subscribed),
        recipes,
        recipes_count,
    })
}

async fn list_subscriptions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<RecipesLimit>,
) -> Result<impl IntoResponse, AppError> {
    let authors: Vec<User> = sqlx::query_as(
        r#"
        SELECT u.* FROM users u
        JOIN subscriptions s ON s.author_id = u.id
        WHERE s.user_id = ?
        ORDER BY u.id
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    let mut views = Vec::with_capacity(authors.len());
    for author in authors {
        views.push(subscription_view(&state.db, author, true, params.recipes_limit).await?);
    }
    Ok(Json(views))
}

async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(author_id): IdPath,
    Query(params): Query<RecipesLimit>,
) -> Result<impl IntoResponse, AppError> {
    let author = fetch_user(&state.db, author_id).await?;

    if author.id == user.id {
        return Err(AppError::BadRequest(
            "You cannot subscribe to yourself.".to_string(),
        ));
    }
    if is_subscribed(&state.db, Some(user.id), author.id).await? {
        return Err(AppError::Conflict(
            "You are already subscribed to this author.".to_string(),
        ));
    }

    let inserted = sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES (?, ?)")
        .bind(user.id)
        .bind(author.id)
        .execute(&state.db)
        .await;
    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict(
                "You are already subscribed to this author.".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = user.id, author_id = author.id, "subscribed");

    let view = subscription_view(&state.db, author, true, params.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(author_id): IdPath,
) -> Result<impl IntoResponse, AppError> {
    let author = fetch_user(&state.db, author_id).await?;

    let done = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND author_id = ?")
        .bind(user.id)
        .bind(author.id)
        .execute(&state.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(AppError::BadRequest(
            "You are not subscribed to this author.".to_string(),
        ));
    }

    tracing::info!(user_id = user.id, author_id = author.id, "unsubscribed");
    Ok(StatusCode::NO_CONTENT)
}
