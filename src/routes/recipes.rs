use std::collections::HashSet;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::auth::{AuthUser, MaybeUser};
use crate::error::{AppError, FieldErrors};
use crate::models::recipe::pub_date_now;
use crate::models::{Bookmark, IngredientAmount, IngredientCount, Recipe, RecipeInput, Tag};
use crate::routes::users::{fetch_user, user_view, UserView};
use crate::routes::IdPath;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<IngredientCount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

/// Compact form used by favorites, the shopping cart and subscriptions.
#[derive(Debug, Serialize, FromRow)]
pub struct ShortRecipe {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl From<Recipe> for ShortRecipe {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Query-string filters for the recipe list. `tags` may repeat, which is why
/// this is parsed from the raw query instead of through `Query`.
#[derive(Debug, Default, PartialEq)]
pub struct RecipeFilter {
    pub tags: Vec<String>,
    pub author: Option<i64>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

fn truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

impl RecipeFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let mut filter = Self::default();
        let Some(raw) = raw else {
            return Ok(filter);
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "tags" if !value.is_empty() => filter.tags.push(value.into_owned()),
                "author" if !value.is_empty() => {
                    let id = value.parse::<i64>().map_err(|_| {
                        AppError::Validation(FieldErrors::single("author", "Author must be a user id."))
                    })?;
                    filter.author = Some(id);
                }
                "is_favorited" => filter.is_favorited = truthy(&value),
                "is_in_shopping_cart" => filter.is_in_shopping_cart = truthy(&value),
                _ => {}
            }
        }
        Ok(filter)
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/{id}",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
}

pub async fn fetch_recipe(db: &SqlitePool, id: i64) -> Result<Recipe, AppError> {
    let recipe: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    recipe.ok_or(AppError::NotFound)
}

pub async fn recipe_view(
    db: &SqlitePool,
    recipe: Recipe,
    viewer: Option<i64>,
) -> Result<RecipeView, AppError> {
    let tags: Vec<Tag> = sqlx::query_as(
        "SELECT t.* FROM tags t JOIN recipe_tags rt ON rt.tag_id = t.id WHERE rt.recipe_id = ? ORDER BY t.id",
    )
    .bind(recipe.id)
    .fetch_all(db)
    .await?;

    let ingredients: Vec<IngredientCount> = sqlx::query_as(
        r#"
        SELECT i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ?
        ORDER BY ri.id
        "#,
    )
    .bind(recipe.id)
    .fetch_all(db)
    .await?;

    let author = fetch_user(db, recipe.author_id).await?;
    let author = user_view(db, author, viewer).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(user_id) => (
            Bookmark::Favorite.contains(db, user_id, recipe.id).await?,
            Bookmark::ShoppingCart.contains(db, user_id, recipe.id).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// Which of `ids` exist in `table`.
async fn existing_ids(
    db: &SqlitePool,
    table: &'static str,
    ids: &[i64],
) -> Result<HashSet<i64>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT id FROM {table} WHERE id IN ("));
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<(i64,)> = query.build_query_as().fetch_all(db).await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Add an error for every tag or ingredient id that does not exist.
async fn check_references(
    db: &SqlitePool,
    input: &RecipeInput,
    errors: &mut FieldErrors,
) -> Result<(), sqlx::Error> {
    let tag_ids = input.tag_ids();
    let found = existing_ids(db, "tags", tag_ids).await?;
    for id in tag_ids.iter().filter(|id| !found.contains(id)) {
        errors.add("tags", format!("Tag {id} does not exist."));
    }

    let ingredient_ids = input.ingredient_ids();
    let found = existing_ids(db, "ingredients", &ingredient_ids).await?;
    for id in ingredient_ids.iter().filter(|id| !found.contains(id)) {
        errors.add("ingredients", format!("Ingredient {id} does not exist."));
    }
    Ok(())
}

async fn replace_tags(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    tags: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    for tag_id in tags {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?, ?)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn replace_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    ingredients: &[IngredientAmount],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    for item in ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?, ?, ?)",
        )
        .bind(recipe_id)
        .bind(item.id)
        .bind(item.amount)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn list_recipes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let filter = RecipeFilter::parse(raw.as_deref())?;
    let viewer_id = viewer.id();

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT r.* FROM recipes r WHERE 1 = 1");
    if !filter.tags.is_empty() {
        query.push(
            " AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id WHERE t.slug IN (",
        );
        let mut separated = query.separated(", ");
        for slug in &filter.tags {
            separated.push_bind(slug.clone());
        }
        separated.push_unseparated("))");
    }
    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }
    // anonymous callers have no favorites or cart, so those filters are ignored
    if let Some(user_id) = viewer_id {
        if filter.is_favorited {
            query
                .push(" AND r.id IN (SELECT recipe_id FROM favorites WHERE user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        if filter.is_in_shopping_cart {
            query
                .push(" AND r.id IN (SELECT recipe_id FROM shopping_cart WHERE user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
    query.push(" ORDER BY r.pub_date DESC, r.id DESC");

    let recipes: Vec<Recipe> = query.build_query_as().fetch_all(&state.db).await?;

    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        views.push(recipe_view(&state.db, recipe, viewer_id).await?);
    }
    Ok(Json(views))
}

async fn get_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    IdPath(id): IdPath,
) -> Result<impl IntoResponse, AppError> {
    let recipe = fetch_recipe(&state.db, id).await?;
    Ok(Json(recipe_view(&state.db, recipe, viewer.id()).await?))
}

async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<RecipeInput>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = input.validate(false);
    check_references(&state.db, &input, &mut errors).await?;
    errors.into_result()?;

    let new = input
        .into_new()
        .ok_or_else(|| AppError::BadRequest("Incomplete recipe.".to_string()))?;

    let mut tx = state.db.begin().await?;
    let id = sqlx::query(
        r#"
        INSERT INTO recipes (author_id, name, image, text, cooking_time, pub_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(&new.name)
    .bind(&new.image)
    .bind(&new.text)
    .bind(new.cooking_time)
    .bind(pub_date_now())
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    replace_tags(&mut tx, id, &new.tags).await?;
    replace_ingredients(&mut tx, id, &new.ingredients).await?;
    tx.commit().await?;

    tracing::info!(recipe_id = id, author_id = user.id, "recipe created");

    let recipe = fetch_recipe(&state.db, id).await?;
    let view = recipe_view(&state.db, recipe, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Load a recipe and make sure `user_id` wrote it.
async fn fetch_owned_recipe(db: &SqlitePool, id: i64, user_id: i64) -> Result<Recipe, AppError> {
    let recipe = fetch_recipe(db, id).await?;
    if recipe.author_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(recipe)
}

async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(id): IdPath,
    Json(input): Json<RecipeInput>,
) -> Result<impl IntoResponse, AppError> {
    fetch_owned_recipe(&state.db, id, user.id).await?;

    let mut errors = input.validate(true);
    check_references(&state.db, &input, &mut errors).await?;
    errors.into_result()?;

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        UPDATE recipes
        SET name = COALESCE(?, name),
            image = COALESCE(?, image),
            text = COALESCE(?, text),
            cooking_time = COALESCE(?, cooking_time)
        WHERE id = ?
        "#,
    )
    .bind(input.name.as_deref().map(str::trim))
    .bind(&input.image)
    .bind(&input.text)
    .bind(input.cooking_time)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if let Some(tags) = &input.tags {
        replace_tags(&mut tx, id, tags).await?;
    }
    if let Some(ingredients) = &input.ingredients {
        replace_ingredients(&mut tx, id, ingredients).await?;
    }
    tx.commit().await?;

    tracing::info!(recipe_id = id, author_id = user.id, "recipe updated");

    let recipe = fetch_recipe(&state.db, id).await?;
    Ok(Json(recipe_view(&state.db, recipe, Some(user.id)).await?))
}

async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(id): IdPath,
) -> Result<impl IntoResponse, AppError> {
    fetch_owned_recipe(&state.db, id, user.id).await?;

    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!(recipe_id = id, author_id = user.id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}
