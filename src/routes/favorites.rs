use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Bookmark, BookmarkChange};
use crate::routes::recipes::{fetch_recipe, ShortRecipe};
use crate::routes::IdPath;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/recipes/{id}/favorite",
        post(add_favorite).delete(remove_favorite),
    )
}

/// Shared by favorites and the shopping cart: 201 with the short recipe,
/// 409 when it is already there.
pub async fn add_bookmark(
    state: &AppState,
    bookmark: Bookmark,
    user_id: i64,
    recipe_id: i64,
) -> Result<Response, AppError> {
    let recipe = fetch_recipe(&state.db, recipe_id).await?;
    match bookmark.add(&state.db, user_id, recipe.id).await? {
        BookmarkChange::AlreadyPresent => Err(AppError::Conflict(
            bookmark.already_present_message().to_string(),
        )),
        _ => {
            tracing::debug!(user_id, recipe_id, list = bookmark.table(), "recipe bookmarked");
            Ok((StatusCode::CREATED, Json(ShortRecipe::from(recipe))).into_response())
        }
    }
}

/// 204 on removal, 400 when the recipe was not there to begin with.
pub async fn remove_bookmark(
    state: &AppState,
    bookmark: Bookmark,
    user_id: i64,
    recipe_id: i64,
) -> Result<Response, AppError> {
    let recipe = fetch_recipe(&state.db, recipe_id).await?;
    match bookmark.remove(&state.db, user_id, recipe.id).await? {
        BookmarkChange::NotPresent => Err(AppError::BadRequest(
            bookmark.not_present_message().to_string(),
        )),
        _ => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    add_bookmark(&state, Bookmark::Favorite, user.id, id).await
}

async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    remove_bookmark(&state, Bookmark::Favorite, user.id, id).await
}
