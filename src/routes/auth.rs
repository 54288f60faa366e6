use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::{issue_token, revoke_token, verify_password, AuthUser};
use crate::error::{AppError, FieldErrors};
use crate::models::User;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    auth_token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/token/login", post(login))
        .route("/auth/token/logout", post(logout))
}

async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(form.email.trim())
        .fetch_optional(&state.db)
        .await?;

    let user = match user {
        Some(user) if verify_password(&form.password, &user.password_hash)? => user,
        _ => {
            return Err(AppError::Validation(FieldErrors::single(
                "non_field_errors",
                "Unable to log in with provided credentials.",
            )));
        }
    };

    let auth_token = issue_token(&state.db, user.id).await?;
    Ok(Json(TokenResponse { auth_token }))
}

async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    revoke_token(&state.db, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
