#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tower_http::normalize_path::NormalizePath;

use foodgram::config::AppConfig;

pub struct TestApp {
    pub router: NormalizePath<Router>,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let router = foodgram::with_trailing_slash_tolerance(foodgram::build_app(
            pool.clone(),
            AppConfig::default(),
        ));

        Self { router, db: pool }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create a user directly in the database and return (user_id, token).
    /// The stored password hash is unusable; use `register` to test logins.
    pub async fn create_user(&self, username: &str) -> (i64, String) {
        let id = sqlx::query(
            "INSERT INTO users (username, email, first_name, last_name, password_hash, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(username)
        .bind(format!("{username}@example.com"))
        .bind("Test")
        .bind("User")
        .bind("!")
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.db)
        .await
        .expect("Failed to create test user")
        .last_insert_rowid();

        let token = foodgram::auth::issue_token(&self.db, id)
            .await
            .expect("Failed to issue token");
        (id, token)
    }

    /// Register through the API with a real password.
    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.post_json(
            "/api/users/",
            serde_json::json!({
                "email": format!("{username}@example.com"),
                "username": username,
                "first_name": "Test",
                "last_name": "User",
                "password": password,
            }),
            None,
        )
        .await
    }

    pub async fn create_tag(&self, name: &str, slug: &str) -> i64 {
        sqlx::query("INSERT INTO tags (name, color, slug) VALUES (?, ?, ?)")
            .bind(name)
            .bind("#E26C2D")
            .bind(slug)
            .execute(&self.db)
            .await
            .expect("Failed to create test tag")
            .last_insert_rowid()
    }

    pub async fn create_ingredient(&self, name: &str, unit: &str) -> i64 {
        sqlx::query("INSERT INTO ingredients (name, name_lower, measurement_unit) VALUES (?, ?, ?)")
            .bind(name)
            .bind(foodgram::models::ingredient::search_key(name))
            .bind(unit)
            .execute(&self.db)
            .await
            .expect("Failed to create test ingredient")
            .last_insert_rowid()
    }

    /// Create a recipe through the API and return its id.
    pub async fn create_recipe(
        &self,
        token: &str,
        name: &str,
        tags: &[i64],
        ingredients: &[(i64, i64)],
    ) -> i64 {
        let resp = self
            .post_json("/api/recipes/", recipe_body(name, tags, ingredients), Some(token))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED, "recipe creation failed");
        body_json(resp).await["id"].as_i64().unwrap()
    }

    fn builder(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Token {token}"));
        }
        builder
    }

    /// Send a GET request with an optional auth token.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let req = Self::builder("GET", uri, token).body(Body::empty()).unwrap();
        self.request(req).await
    }

    async fn send_json(&self, method: &str, uri: &str, body: Value, token: Option<&str>) -> Response {
        let req = Self::builder(method, uri, token)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }

    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        self.send_json("POST", uri, body, token).await
    }

    pub async fn patch_json(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        self.send_json("PATCH", uri, body, token).await
    }

    /// POST without a body, as the bookmark and subscribe actions expect.
    pub async fn post(&self, uri: &str, token: Option<&str>) -> Response {
        let req = Self::builder("POST", uri, token).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a DELETE request with an optional auth token.
    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        let req = Self::builder("DELETE", uri, token).body(Body::empty()).unwrap();
        self.request(req).await
    }
}

pub fn recipe_body(name: &str, tags: &[i64], ingredients: &[(i64, i64)]) -> Value {
    let ingredients: Vec<Value> = ingredients
        .iter()
        .map(|(id, amount)| serde_json::json!({ "id": id, "amount": amount }))
        .collect();
    serde_json::json!({
        "ingredients": ingredients,
        "tags": tags,
        "image": "data:image/png;base64,iVBORw0KGgo=",
        "name": name,
        "text": "Mix everything together.",
        "cooking_time": 10,
    })
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read the full response body as JSON.
pub async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Ids of the objects in a JSON array response, in order.
pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}
