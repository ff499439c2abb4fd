use actix_web::{web, HttpResponse};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::authz::{self, Action, Resource};
use crate::errors::AppError;
use crate::services::cart_service::{self, CartAddOutcome};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::get_cart", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn get_cart(app_state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Read, Resource::Cart)?;

  let lines = cart_service::view_cart(&app_state.db_pool, auth.user.id).await?;

  if lines.is_empty() {
    return Ok(HttpResponse::Ok().json(json!({"message": "Cart empty"})));
  }
  Ok(HttpResponse::Ok().json(lines))
}

/// Body is taken as raw JSON so that missing fields can be reported by name
/// and quantity can be coerced from either a number or a numeric string.
#[instrument(name = "handler::add_to_cart", skip(app_state, auth, body), fields(user_id = auth.user.id))]
pub async fn add_to_cart(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Cart)?;
  let body = body.into_inner();

  let mut missing = Vec::new();
  for field in ["quantity", "menuitem"] {
    if body.get(field).is_none() {
      missing.push(field.to_string());
    }
  }
  if !missing.is_empty() {
    return Err(AppError::MissingFields(missing));
  }

  let quantity = cart_service::coerce_quantity(&body["quantity"])?;
  let menuitem_id = match &body["menuitem"] {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse::<i64>().ok(),
    _ => None,
  }
  .ok_or_else(|| AppError::Validation("Menu item does not exists".to_string()))?;

  let outcome = cart_service::add_item(&app_state.db_pool, auth.user.id, menuitem_id, quantity).await?;

  info!(menuitem_id, quantity, ?outcome, "Cart updated.");
  let message = match outcome {
    CartAddOutcome::Inserted => "Item added successfully to cart",
    CartAddOutcome::Replaced => "Item quantity change updated successfully in cart",
  };
  Ok(HttpResponse::Ok().json(json!({"success": message})))
}

#[instrument(name = "handler::clear_cart", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn clear_cart(app_state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::Cart)?;

  let deleted = cart_service::clear_cart(&app_state.db_pool, auth.user.id).await?;

  if deleted == 0 {
    return Ok(HttpResponse::Ok().json(json!({"message": "User's cart is already empty"})));
  }
  Ok(HttpResponse::Ok().json(json!({"success": "Emptied the cart for the user"})))
}
