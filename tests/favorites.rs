mod common;

use axum::http::StatusCode;
use common::{body_json, ids, TestApp};

async fn setup() -> (TestApp, String, i64) {
    let app = TestApp::new().await;
    let (_author, author_token) = app.create_user("chef").await;
    let tag = app.create_tag("Breakfast", "breakfast").await;
    let eggs = app.create_ingredient("Eggs", "pcs").await;
    let recipe = app
        .create_recipe(&author_token, "Omelette", &[tag], &[(eggs, 3)])
        .await;
    let (_fan, fan_token) = app.create_user("fan").await;
    (app, fan_token, recipe)
}

#[tokio::test]
async fn add_favorite_returns_short_recipe() {
    let (app, token, recipe) = setup().await;

    let resp = app
        .post(&format!("/api/recipes/{recipe}/favorite/"), Some(&token))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["id"], recipe);
    assert_eq!(body["name"], "Omelette");
    assert_eq!(body["cooking_time"], 10);
    assert!(body["image"].is_string());
    assert!(body.get("ingredients").is_none());

    let resp = app.get(&format!("/api/recipes/{recipe}/"), Some(&token)).await;
    let view = body_json(resp).await;
    assert_eq!(view["is_favorited"], true);
    assert_eq!(view["is_in_shopping_cart"], false);
}

#[tokio::test]
async fn add_favorite_twice_conflicts() {
    let (app, token, recipe) = setup().await;
    let uri = format!("/api/recipes/{recipe}/favorite/");

    app.post(&uri, Some(&token)).await;
    let resp = app.post(&uri, Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(body_json(resp).await["detail"].is_string());
}

#[tokio::test]
async fn remove_favorite() {
    let (app, token, recipe) = setup().await;
    let uri = format!("/api/recipes/{recipe}/favorite/");

    app.post(&uri, Some(&token)).await;
    let resp = app.delete(&uri, Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.delete(&uri, Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.get("/api/recipes/?is_favorited=1", Some(&token)).await;
    assert!(ids(&body_json(resp).await).is_empty());
}

#[tokio::test]
async fn favorite_missing_recipe_is_not_found() {
    let (app, token, _recipe) = setup().await;

    let resp = app.post("/api/recipes/9000/favorite/", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.delete("/api/recipes/9000/favorite/", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorites_require_authentication() {
    let (app, _token, recipe) = setup().await;
    let resp = app
        .post(&format!("/api/recipes/{recipe}/favorite/"), None)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn favorites_are_per_user() {
    let (app, token, recipe) = setup().await;
    let (_other, other_token) = app.create_user("other").await;

    app.post(&format!("/api/recipes/{recipe}/favorite/"), Some(&token))
        .await;

    let resp = app.get(&format!("/api/recipes/{recipe}/"), Some(&other_token)).await;
    assert_eq!(body_json(resp).await["is_favorited"], false);

    // the other user may favorite the same recipe independently
    let resp = app
        .post(&format!("/api/recipes/{recipe}/favorite/"), Some(&other_token))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn cart_add_and_remove() {
    let (app, token, recipe) = setup().await;
    let uri = format!("/api/recipes/{recipe}/shopping_cart/");

    let resp = app.post(&uri, Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["name"], "Omelette");

    let resp = app.post(&uri, Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = app.get(&format!("/api/recipes/{recipe}/"), Some(&token)).await;
    let view = body_json(resp).await;
    assert_eq!(view["is_in_shopping_cart"], true);
    assert_eq!(view["is_favorited"], false);

    let resp = app.delete(&uri, Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.delete(&uri, Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cart_missing_recipe_is_not_found() {
    let (app, token, _recipe) = setup().await;
    let resp = app.post("/api/recipes/9000/shopping_cart/", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
