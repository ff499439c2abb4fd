use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::authz::{self, Action, Resource};
use crate::errors::AppError;
use crate::services::order_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct OrderUpdatePayload {
  pub status: Option<i16>,
  pub delivery_crew: Option<i64>,
}

#[instrument(name = "handler::list_orders", skip(app_state, auth), fields(user_id = auth.user.id, role = ?auth.role))]
pub async fn list_orders(app_state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let orders = order_service::list_orders(&app_state.db_pool, auth.user.id, auth.role).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::place_order", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn place_order(app_state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::OrderCreate)?;

  let order = order_service::create_order(&app_state.db_pool, &auth.user).await?;

  info!(order_id = order.id, "Order placed.");
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::get_order", skip(app_state, auth), fields(user_id = auth.user.id, role = ?auth.role))]
pub async fn get_order(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let order = order_service::retrieve_order(&app_state.db_pool, auth.user.id, auth.role, order_id).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::update_order", skip(app_state, auth, payload), fields(user_id = auth.user.id, role = ?auth.role))]
pub async fn update_order(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<OrderUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::OrderMutate)?;
  let order_id = path.into_inner();

  order_service::update_order(
    &app_state.db_pool,
    auth.role,
    order_id,
    payload.status,
    payload.delivery_crew,
  )
  .await?;

  Ok(HttpResponse::Ok().json(json!({"message": "Order updated"})))
}

#[instrument(name = "handler::delete_order", skip(app_state, auth), fields(user_id = auth.user.id))]
pub async fn delete_order(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  authz::authorize(auth.role, Action::Write, Resource::OrderDelete)?;
  let order_id = path.into_inner();

  order_service::delete_order(&app_state.db_pool, order_id).await?;

  Ok(HttpResponse::Ok().json(json!({"message": "Order deleted"})))
}
