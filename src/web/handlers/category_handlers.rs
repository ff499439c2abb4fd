use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::authz::{self, Action, Resource};
use crate::errors::AppError;
use crate::models::Category;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
  pub search: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CategoryPayload {
  pub slug: String,
  pub title: String,
}

#[derive(Deserialize, Debug)]
pub struct CategoryPatchPayload {
  pub slug: Option<String>,
  pub title: Option<String>,
}

#[instrument(name = "handler::list_categories", skip(app_state, query))]
pub async fn list_categories(
  app_state: web::Data<AppState>,
  query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
  let categories: Vec<Category> = match &query.search {
    Some(term) => {
      sqlx::query_as("SELECT id, slug, title FROM categories WHERE title ILIKE $1 ORDER BY id")
        .bind(format!("%{}%", term))
        .fetch_all(&app_state.db_pool)
        .await?
    }
    None => {
      sqlx::query_as("SELECT id, slug, title FROM categories ORDER BY id")
        .fetch_all(&app_state.db_pool)
        .await?
    }
  };

  Ok(HttpResponse::Ok().json(categories))
}

#[instrument(name = "handler::create_category", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn create_category(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<CategoryPayload>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Menu)?;

  let category: Category =
    sqlx::query_as("INSERT INTO categories (slug, title) VALUES ($1, $2) RETURNING id, slug, title")
      .bind(&payload.slug)
      .bind(&payload.title)
      .fetch_one(&app_state.db_pool)
      .await
      .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
          AppError::Validation("category with this slug already exists".to_string())
        }
        _ => AppError::Sqlx(e),
      })?;

  info!(category_id = category.id, "Category created.");
  Ok(HttpResponse::Created().json(category))
}

#[instrument(name = "handler::get_category", skip(app_state))]
pub async fn get_category(app_state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
  let category_id = path.into_inner();

  let category: Category = sqlx::query_as("SELECT id, slug, title FROM categories WHERE id = $1")
    .bind(category_id)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

  Ok(HttpResponse::Ok().json(category))
}

#[instrument(name = "handler::update_category", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn update_category(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<CategoryPayload>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Menu)?;
  let category_id = path.into_inner();

  let category: Category =
    sqlx::query_as("UPDATE categories SET slug = $1, title = $2 WHERE id = $3 RETURNING id, slug, title")
      .bind(&payload.slug)
      .bind(&payload.title)
      .bind(category_id)
      .fetch_optional(&app_state.db_pool)
      .await?
      .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

  Ok(HttpResponse::Ok().json(category))
}

#[instrument(name = "handler::patch_category", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn patch_category(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<CategoryPatchPayload>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Menu)?;
  let category_id = path.into_inner();

  let category: Category = sqlx::query_as(
    "UPDATE categories SET slug = COALESCE($1, slug), title = COALESCE($2, title) \
     WHERE id = $3 RETURNING id, slug, title",
  )
  .bind(&payload.slug)
  .bind(&payload.title)
  .bind(category_id)
  .fetch_optional(&app_state.db_pool)
  .await?
  .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

  Ok(HttpResponse::Ok().json(category))
}

#[instrument(name = "handler::delete_category", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn delete_category(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Menu)?;
  let category_id = path.into_inner();

  let result = sqlx::query("DELETE FROM categories WHERE id = $1")
    .bind(category_id)
    .execute(&app_state.db_pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("Category not found".to_string()));
  }
  Ok(HttpResponse::NoContent().finish())
}
