use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::ingredient::{prefix_pattern, search_key};
use crate::models::Ingredient;
use crate::routes::IdPath;
use crate::AppState;

#[derive(Deserialize)]
pub struct IngredientSearch {
    name: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients))
        .route("/ingredients/{id}", get(get_ingredient))
}

async fn list_ingredients(
    State(state): State<AppState>,
    Query(search): Query<IngredientSearch>,
) -> Result<impl IntoResponse, AppError> {
    let prefix = search
        .name
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let ingredients: Vec<Ingredient> = match prefix {
        Some(prefix) => {
            sqlx::query_as(
                r#"
                SELECT id, name, measurement_unit FROM ingredients
                WHERE name_lower LIKE ? ESCAPE '\'
                ORDER BY name, id
                "#,
            )
            .bind(prefix_pattern(&search_key(prefix)))
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients ORDER BY name, id")
                .fetch_all(&state.db)
                .await?
        }
    };
    Ok(Json(ingredients))
}

async fn get_ingredient(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<impl IntoResponse, AppError> {
    let ingredient: Option<Ingredient> =
        sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    ingredient.map(Json).ok_or(AppError::NotFound)
}
