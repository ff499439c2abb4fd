use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::authz::{self, Action, Resource};
use crate::errors::AppError;
use crate::models::{MenuItem, MenuItemRow};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

const SELECT_ITEM_ROW: &str = "SELECT m.id, m.title, m.price, m.featured, c.title AS category_name \
                               FROM menu_items m JOIN categories c ON c.id = m.category_id";

#[derive(Deserialize, Debug)]
pub struct MenuListQuery {
  pub search: Option<String>,
  pub ordering: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct MenuItemPayload {
  pub title: String,
  pub price: Decimal,
  #[serde(default)]
  pub featured: bool,
  pub category_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct MenuItemPatchPayload {
  pub title: Option<String>,
  pub price: Option<Decimal>,
  pub featured: Option<bool>,
  pub category_id: Option<i64>,
}

/// Maps a client ordering parameter to an ORDER BY clause. Only whitelisted
/// columns are accepted; a leading `-` flips the direction. Anything else
/// falls back to the id ordering.
fn ordering_clause(ordering: Option<&str>) -> &'static str {
  match ordering {
    Some("title") => "ORDER BY m.title ASC",
    Some("-title") => "ORDER BY m.title DESC",
    Some("price") => "ORDER BY m.price ASC",
    Some("-price") => "ORDER BY m.price DESC",
    Some("featured") => "ORDER BY m.featured ASC, m.id ASC",
    Some("-featured") => "ORDER BY m.featured DESC, m.id ASC",
    _ => "ORDER BY m.id ASC",
  }
}

async fn category_exists(app_state: &AppState, category_id: i64) -> Result<bool, AppError> {
  let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
    .bind(category_id)
    .fetch_optional(&app_state.db_pool)
    .await?;
  Ok(row.is_some())
}

fn validate_price(price: Decimal) -> Result<(), AppError> {
  if price <= Decimal::ZERO {
    return Err(AppError::Validation("Price must be a positive number".to_string()));
  }
  Ok(())
}

#[instrument(name = "handler::list_menu_items", skip(app_state, query))]
pub async fn list_menu_items(
  app_state: web::Data<AppState>,
  query: web::Query<MenuListQuery>,
) -> Result<HttpResponse, AppError> {
  let order_by = ordering_clause(query.ordering.as_deref());

  let items: Vec<MenuItemRow> = match &query.search {
    Some(term) => {
      sqlx::query_as(&format!("{} WHERE m.title ILIKE $1 {}", SELECT_ITEM_ROW, order_by))
        .bind(format!("%{}%", term))
        .fetch_all(&app_state.db_pool)
        .await?
    }
    None => {
      sqlx::query_as(&format!("{} {}", SELECT_ITEM_ROW, order_by))
        .fetch_all(&app_state.db_pool)
        .await?
    }
  };

  Ok(HttpResponse::Ok().json(items))
}

#[instrument(name = "handler::create_menu_item", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn create_menu_item(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<MenuItemPayload>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Menu)?;
  validate_price(payload.price)?;

  if !category_exists(&app_state, payload.category_id).await? {
    return Err(AppError::Validation("Category does not exist".to_string()));
  }

  let item: MenuItem = sqlx::query_as(
    "INSERT INTO menu_items (title, price, featured, category_id) VALUES ($1, $2, $3, $4) \
     RETURNING id, title, price, featured, category_id",
  )
  .bind(&payload.title)
  .bind(payload.price)
  .bind(payload.featured)
  .bind(payload.category_id)
  .fetch_one(&app_state.db_pool)
  .await?;

  info!(menu_item_id = item.id, "Menu item created.");
  Ok(HttpResponse::Created().json(item))
}

#[instrument(name = "handler::get_menu_item", skip(app_state))]
pub async fn get_menu_item(app_state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
  let item_id = path.into_inner();

  let item: MenuItemRow = sqlx::query_as(&format!("{} WHERE m.id = $1", SELECT_ITEM_ROW))
    .bind(item_id)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Menu item not found".to_string()))?;

  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::update_menu_item", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn update_menu_item(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<MenuItemPayload>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Menu)?;
  validate_price(payload.price)?;
  let item_id = path.into_inner();

  if !category_exists(&app_state, payload.category_id).await? {
    return Err(AppError::Validation("Category does not exist".to_string()));
  }

  let item: MenuItem = sqlx::query_as(
    "UPDATE menu_items SET title = $1, price = $2, featured = $3, category_id = $4 \
     WHERE id = $5 RETURNING id, title, price, featured, category_id",
  )
  .bind(&payload.title)
  .bind(payload.price)
  .bind(payload.featured)
  .bind(payload.category_id)
  .bind(item_id)
  .fetch_optional(&app_state.db_pool)
  .await?
  .ok_or_else(|| AppError::NotFound("Menu item not found".to_string()))?;

  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::patch_menu_item", skip(app_state, auth, payload), fields(user_id = auth.user.id))]
pub async fn patch_menu_item(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<MenuItemPatchPayload>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Menu)?;
  let item_id = path.into_inner();

  if let Some(price) = payload.price {
    validate_price(price)?;
  }
  if let Some(category_id) = payload.category_id {
    if !category_exists(&app_state, category_id).await? {
      return Err(AppError::Validation("Category does not exist".to_string()));
    }
  }

  let item: MenuItem = sqlx::query_as(
    "UPDATE menu_items SET \
       title = COALESCE($1, title), \
       price = COALESCE($2, price), \
       featured = COALESCE($3, featured), \
       category_id = COALESCE($4, category_id) \
     WHERE id = $5 RETURNING id, title, price, featured, category_id",
  )
  .bind(&payload.title)
  .bind(payload.price)
  .bind(payload.featured)
  .bind(payload.category_id)
  .bind(item_id)
  .fetch_optional(&app_state.db_pool)
  .await?
  .ok_or_else(|| AppError::NotFound("Menu item not found".to_string()))?;

  Ok(HttpResponse::Ok().json(item))
}

/// Menu item deletion answers with an explicit success body rather than an
/// empty 204.
#[instrument(name = "handler::delete_menu_item", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn delete_menu_item(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Menu)?;
  let item_id = path.into_inner();

  let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
    .bind(item_id)
    .execute(&app_state.db_pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("Menu item not found".to_string()));
  }

  Ok(HttpResponse::Ok().json(json!({"message": "Item deleted successfully"})))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn ordering_only_accepts_whitelisted_columns() {
    assert_eq!(ordering_clause(Some("price")), "ORDER BY m.price ASC");
    assert_eq!(ordering_clause(Some("-price")), "ORDER BY m.price DESC");
    assert_eq!(ordering_clause(Some("title")), "ORDER BY m.title ASC");
    // Arbitrary input cannot reach the SQL string.
    assert_eq!(ordering_clause(Some("id; DROP TABLE menu_items")), "ORDER BY m.id ASC");
    assert_eq!(ordering_clause(None), "ORDER BY m.id ASC");
  }

  #[test]
  fn price_must_be_positive() {
    assert!(validate_price(dec!(0.01)).is_ok());
    assert!(validate_price(Decimal::ZERO).is_err());
    assert!(validate_price(dec!(-4.20)).is_err());
  }
}
