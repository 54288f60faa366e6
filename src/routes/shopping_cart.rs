use askama::Template;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use sqlx::FromRow;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::Bookmark;
use crate::routes::favorites::{add_bookmark, remove_bookmark};
use crate::routes::IdPath;
use crate::AppState;

/// One ingredient summed over every recipe in the cart.
#[derive(Debug, FromRow)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Template)]
#[template(path = "shopping_list.txt")]
struct ShoppingListTemplate {
    items: Vec<ShoppingItem>,
}

pub fn render_shopping_list(items: Vec<ShoppingItem>) -> Result<String, askama::Error> {
    ShoppingListTemplate { items }.render()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/recipes/{id}/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
        .route("/recipes/download_shopping_cart", get(download_shopping_cart))
}

async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    add_bookmark(&state, Bookmark::ShoppingCart, user.id, id).await
}

async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    remove_bookmark(&state, Bookmark::ShoppingCart, user.id, id).await
}

pub async fn shopping_items(
    db: &sqlx::SqlitePool,
    user_id: i64,
) -> Result<Vec<ShoppingItem>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT i.name, i.measurement_unit, SUM(ri.amount) AS amount
        FROM shopping_cart sc
        JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = ?
        GROUP BY i.id, i.name, i.measurement_unit
        ORDER BY i.name, i.measurement_unit
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let items = shopping_items(&state.db, user.id).await?;
    let count = items.len();
    let body = render_shopping_list(items)?;

    let content_disposition = format!(
        "attachment; filename=\"{}\"",
        state.config.shopping_list_filename
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition).unwrap_or_else(|_| {
            HeaderValue::from_static("attachment; filename=\"shopping_list.txt\"")
        }),
    );

    tracing::debug!(user_id = user.id, items = count, "shopping list exported");
    Ok((headers, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_line_per_ingredient() {
        let items = vec![
            ShoppingItem {
                name: "Eggs".into(),
                measurement_unit: "pcs".into(),
                amount: 5,
            },
            ShoppingItem {
                name: "Flour".into(),
                measurement_unit: "g".into(),
                amount: 300,
            },
        ];
        let text = render_shopping_list(items).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "Eggs - 5 pcs.");
        assert_eq!(lines[2], "Flour - 300 g.");
    }

    #[test]
    fn empty_cart_renders_only_header() {
        let text = render_shopping_list(Vec::new()).unwrap();
        assert_eq!(text.lines().filter(|l| !l.trim().is_empty()).count(), 1);
    }

    #[test]
    fn text_is_not_html_escaped() {
        let items = vec![ShoppingItem {
            name: "Salt & pepper".into(),
            measurement_unit: "g".into(),
            amount: 1,
        }];
        let text = render_shopping_list(items).unwrap();
        assert!(text.contains("Salt & pepper - 1 g."));
    }
}
