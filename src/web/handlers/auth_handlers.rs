//! Registration and token issuance. The rest of the API consumes this
//! surface only through the per-request token resolution in the extractor.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::User;
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
  pub username: String,
  pub email: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  pub username: String,
  pub password: String,
}

#[instrument(name = "handler::register", skip(app_state, payload), fields(username = %payload.username))]
pub async fn register(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse, AppError> {
  let password_hash = auth_service::hash_password(&payload.password)?;

  let user: User = sqlx::query_as(
    "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
     RETURNING id, username, email, password_hash, created_at",
  )
  .bind(&payload.username)
  .bind(&payload.email)
  .bind(&password_hash)
  .fetch_one(&app_state.db_pool)
  .await
  .map_err(|e| match &e {
    sqlx::Error::Database(db) if db.is_unique_violation() => {
      AppError::Conflict("A user with that username already exists.".to_string())
    }
    _ => AppError::Sqlx(e),
  })?;

  info!(user_id = user.id, "User registered.");
  Ok(HttpResponse::Created().json(user))
}

#[instrument(name = "handler::current_user", skip(auth), fields(user_id = auth.user.id))]
pub async fn current_user(auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(auth.user))
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(username = %payload.username))]
pub async fn login(app_state: web::Data<AppState>, payload: web::Json<LoginPayload>) -> Result<HttpResponse, AppError> {
  let user: User =
    sqlx::query_as("SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1")
      .bind(&payload.username)
      .fetch_optional(&app_state.db_pool)
      .await?
      .ok_or_else(|| AppError::Auth("Unable to log in with provided credentials.".to_string()))?;

  if !auth_service::verify_password(&user.password_hash, &payload.password)? {
    return Err(AppError::Auth("Unable to log in with provided credentials.".to_string()));
  }

  let token = auth_service::issue_token(&app_state.db_pool, user.id).await?;

  Ok(HttpResponse::Ok().json(json!({"auth_token": token})))
}
